use crate::db::mappings;
use crate::models::Target;
use crate::settings::CompiledSettings;
use crate::telegram::gateway::{EditSpec, MessagingGateway};
use crate::telegram::IncomingMessage;
use crate::transform;
use diesel::PgConnection;

/// Propagates a source edit to every mapped target. The edited body is
/// re-derived through the same modification rules used at send time
/// (replacement and cleaning only), and the edit kind follows which field
/// changed. Targets without a mapping are skipped silently: an edit racing
/// ahead of its original forward is expected.
pub async fn sync_edit(
    conn: &mut PgConnection,
    gateway: &dyn MessagingGateway,
    settings: &CompiledSettings,
    message: &IncomingMessage,
    targets: &[Target],
) -> usize {
    let mut synced = 0;

    for target in targets {
        let Some(forwarded_id) = mappings::find_forwarded_message_id(
            conn,
            settings.task_id,
            message.chat_id(),
            message.message_id(),
            target.chat_id,
        ) else {
            continue;
        };

        let keyboard = if settings.text_cleaner.remove_inline_buttons {
            None
        } else {
            message.reply_markup()
        };

        let result = if let Some(text) = message.text() {
            let spec = EditSpec::builder()
                .chat_id(target.chat_id)
                .message_id(forwarded_id)
                .text(transform::rederive_for_edit(text, settings))
                .reply_markup(keyboard)
                .link_preview(settings.link_preview)
                .build();

            gateway.edit_text(&spec).await
        } else if let Some(caption) = message.caption() {
            let spec = EditSpec::builder()
                .chat_id(target.chat_id)
                .message_id(forwarded_id)
                .caption(transform::rederive_for_edit(caption, settings))
                .reply_markup(keyboard)
                .build();

            gateway.edit_caption(&spec).await
        } else if message.reply_markup().is_some() {
            let spec = EditSpec::builder()
                .chat_id(target.chat_id)
                .message_id(forwarded_id)
                .reply_markup(keyboard)
                .build();

            gateway.edit_reply_markup(&spec).await
        } else {
            continue;
        };

        match result {
            Ok(()) => synced += 1,
            Err(error) => {
                log::error!(
                    "Failed to sync an edit to chat {} message {forwarded_id}: {}",
                    target.chat_id,
                    error.description()
                );
            }
        }
    }

    synced
}
