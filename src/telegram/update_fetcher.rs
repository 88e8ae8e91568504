use crate::telegram::client::Api;
use frankenstein::AllowedUpdate;
use frankenstein::GetUpdatesParams;
use frankenstein::Update;
use std::collections::VecDeque;

const LONG_POLL_SECONDS: u32 = 10;

/// Buffered long-poll update stream over one gateway connection.
#[derive(Clone, Debug)]
pub struct UpdateFetcher {
    pub api: Api,
    pub update_params: GetUpdatesParams,
    pub buffer: VecDeque<Update>,
}

impl UpdateFetcher {
    pub fn new(api: Api) -> UpdateFetcher {
        let mut update_params = GetUpdatesParams::builder()
            .allowed_updates(vec![
                AllowedUpdate::Message,
                AllowedUpdate::EditedMessage,
                AllowedUpdate::ChannelPost,
                AllowedUpdate::EditedChannelPost,
                AllowedUpdate::CallbackQuery,
            ])
            .build();

        update_params.timeout = Some(LONG_POLL_SECONDS);

        UpdateFetcher {
            api,
            update_params,
            buffer: VecDeque::new(),
        }
    }

    pub async fn next_update(&mut self) -> Option<Update> {
        if let Some(update) = self.buffer.pop_front() {
            return Some(update);
        }

        match self.api.get_updates(&self.update_params).await {
            Ok(updates) => {
                for update in updates.result {
                    self.buffer.push_back(update);
                }

                if let Some(last_update) = self.buffer.back() {
                    self.update_params.offset = Some((last_update.update_id + 1).into());
                }

                self.buffer.pop_front()
            }

            Err(err) => {
                log::error!("Failed to fetch updates {:?}", err);
                None
            }
        }
    }
}
