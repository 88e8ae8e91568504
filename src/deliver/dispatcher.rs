use crate::models::Task;
use crate::settings::{CompiledSettings, ForwardMode};
use crate::telegram::gateway::{
    CopySpec, ForwardSpec, GatewayError, MessagingGateway, SendMediaSpec, SendTextSpec,
};
use crate::telegram::IncomingMessage;
use crate::transform::TransformOutcome;
use std::sync::Arc;

const UNKNOWN_SOURCE: &str = "مصدر غير معروف";

/// One target delivery: everything the dispatcher needs to choose an
/// operation and a backend. Reply resolution and mapping writes stay with
/// the caller.
pub struct Delivery<'a> {
    pub task: &'a Task,
    pub settings: &'a CompiledSettings,
    pub message: &'a IncomingMessage,
    pub transformed: &'a TransformOutcome,
    pub target_chat_id: i64,
    pub reply_to_message_id: Option<i32>,
}

/// Resolves the backend per send (userbot first for userbot tasks, falling
/// back to the bot backend on any failure) and picks forward, copy or send
/// semantics per the task's mode and the message shape.
pub struct Dispatcher {
    bot: Arc<dyn MessagingGateway>,
    userbot: Option<Arc<dyn MessagingGateway>>,
}

impl Dispatcher {
    pub fn new(bot: Arc<dyn MessagingGateway>, userbot: Option<Arc<dyn MessagingGateway>>) -> Self {
        Self { bot, userbot }
    }

    /// Sends to one target, returning the forwarded message id. The fallback
    /// is per-send: the task's configured backend kind is not touched here.
    pub async fn deliver(&self, delivery: &Delivery<'_>) -> Result<i32, GatewayError> {
        if delivery.task.uses_userbot() {
            if let Some(userbot) = &self.userbot {
                match self.send_via(userbot.as_ref(), delivery).await {
                    Ok(message_id) => return Ok(message_id),
                    Err(error) => {
                        log::warn!(
                            "Userbot delivery failed for task {} target {}, falling back to the bot backend: {}",
                            delivery.task.id,
                            delivery.target_chat_id,
                            error.description()
                        );
                    }
                }
            }
        }

        self.send_via(self.bot.as_ref(), delivery).await
    }

    /// Edits go through the same backend-selection policy as sends.
    pub async fn preferred_gateway(&self, task: &Task) -> &dyn MessagingGateway {
        if task.uses_userbot() {
            if let Some(userbot) = &self.userbot {
                if userbot.is_connected().await {
                    return userbot.as_ref();
                }
            }
        }

        self.bot.as_ref()
    }

    pub fn bot_gateway(&self) -> &dyn MessagingGateway {
        self.bot.as_ref()
    }

    async fn send_via(
        &self,
        gateway: &dyn MessagingGateway,
        delivery: &Delivery<'_>,
    ) -> Result<i32, GatewayError> {
        let settings = delivery.settings;
        let message = delivery.message;
        let strip_buttons = settings.text_cleaner.remove_inline_buttons;
        let keyboard = if strip_buttons {
            None
        } else {
            message.reply_markup()
        };

        // preserve-original relay is only possible when nothing about the
        // message changes
        if settings.forward_mode == ForwardMode::Forward
            && !delivery.transformed.modified
            && !strip_buttons
        {
            if let IncomingMessage::Live(_) = message {
                let spec = ForwardSpec::builder()
                    .chat_id(delivery.target_chat_id)
                    .from_chat_id(message.chat_id())
                    .message_id(message.message_id())
                    .silent(settings.silent_mode)
                    .build();

                let forwarded_id = gateway.forward_message(&spec).await?;
                self.maybe_pin(gateway, delivery, forwarded_id).await;

                return Ok(forwarded_id);
            }
        }

        let kind = message.media_kind();

        let forwarded_id = if kind.is_media() {
            match message {
                IncomingMessage::Live(_) => {
                    let caption = if settings.remove_caption {
                        // empty caption drops the original on copy
                        Some(String::new())
                    } else {
                        self.text_override(delivery)
                    };

                    let spec = CopySpec::builder()
                        .chat_id(delivery.target_chat_id)
                        .from_chat_id(message.chat_id())
                        .message_id(message.message_id())
                        .caption(caption)
                        .reply_markup(keyboard)
                        .reply_to_message_id(delivery.reply_to_message_id)
                        .silent(settings.silent_mode)
                        .build();

                    gateway.copy_message(&spec).await?
                }

                IncomingMessage::Snapshot(_) => {
                    let file_id =
                        message
                            .media_ref()
                            .ok_or_else(|| GatewayError::Unsupported {
                                what: "stored media without a file reference".to_string(),
                            })?;

                    let caption = if settings.remove_caption {
                        None
                    } else {
                        self.text_override(delivery)
                            .or_else(|| message.caption().map(str::to_string))
                    };

                    let spec = SendMediaSpec::builder()
                        .chat_id(delivery.target_chat_id)
                        .kind(kind)
                        .file_id(file_id)
                        .caption(caption)
                        .reply_markup(keyboard)
                        .reply_to_message_id(delivery.reply_to_message_id)
                        .silent(settings.silent_mode)
                        .build();

                    gateway.send_media(&spec).await?
                }
            }
        } else if let Some(text) = self
            .text_override(delivery)
            .or_else(|| message.text().map(str::to_string))
        {
            if !delivery.transformed.modified
                && settings.forward_mode != ForwardMode::Quote
                && matches!(message, IncomingMessage::Live(_))
            {
                // unmodified text keeps its entities through a copy
                let spec = CopySpec::builder()
                    .chat_id(delivery.target_chat_id)
                    .from_chat_id(message.chat_id())
                    .message_id(message.message_id())
                    .reply_markup(keyboard)
                    .reply_to_message_id(delivery.reply_to_message_id)
                    .silent(settings.silent_mode)
                    .build();

                gateway.copy_message(&spec).await?
            } else {
                let spec = SendTextSpec::builder()
                    .chat_id(delivery.target_chat_id)
                    .text(text)
                    .reply_markup(keyboard)
                    .reply_to_message_id(delivery.reply_to_message_id)
                    .silent(settings.silent_mode)
                    .link_preview(settings.link_preview)
                    .build();

                gateway.send_text(&spec).await?
            }
        } else {
            match message {
                IncomingMessage::Live(_) => {
                    // contact/location/venue/poll/dice relay as a plain copy
                    let spec = CopySpec::builder()
                        .chat_id(delivery.target_chat_id)
                        .from_chat_id(message.chat_id())
                        .message_id(message.message_id())
                        .reply_markup(keyboard)
                        .reply_to_message_id(delivery.reply_to_message_id)
                        .silent(settings.silent_mode)
                        .build();

                    gateway.copy_message(&spec).await?
                }

                IncomingMessage::Snapshot(_) => {
                    return Err(GatewayError::Unsupported {
                        what: format!("replaying a stored {kind:?} message"),
                    });
                }
            }
        };

        self.maybe_pin(gateway, delivery, forwarded_id).await;

        Ok(forwarded_id)
    }

    /// The transformed text, with the quote-mode attribution line appended
    /// when configured.
    fn text_override(&self, delivery: &Delivery<'_>) -> Option<String> {
        let transformed = if delivery.transformed.modified {
            delivery.transformed.text.clone()
        } else {
            None
        };

        match delivery.settings.forward_mode {
            ForwardMode::Quote => {
                let current = transformed
                    .or_else(|| delivery.message.content_text().map(str::to_string))?;
                let source = delivery
                    .message
                    .source_title()
                    .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

                Some(format!("{current}\n\nمن: {source}"))
            }
            _ => transformed,
        }
    }

    async fn maybe_pin(
        &self,
        gateway: &dyn MessagingGateway,
        delivery: &Delivery<'_>,
        forwarded_id: i32,
    ) {
        if !delivery.settings.pin_messages {
            return;
        }

        if let Err(error) = gateway
            .pin_message(delivery.target_chat_id, forwarded_id)
            .await
        {
            log::warn!(
                "Failed to pin message {forwarded_id} in chat {}: {}",
                delivery.target_chat_id,
                error.description()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TASK_TYPE_USERBOT;
    use crate::telegram::gateway::EditSpec;
    use crate::telegram::incoming::{MediaKind, MessageSnapshot};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        pub Gateway {}

        #[async_trait]
        impl MessagingGateway for Gateway {
            fn backend_name(&self) -> &'static str;
            async fn is_connected(&self) -> bool;
            async fn chat_title(&self, chat_id: i64) -> Result<Option<String>, GatewayError>;
            async fn send_text(&self, spec: &SendTextSpec) -> Result<i32, GatewayError>;
            async fn send_media(&self, spec: &SendMediaSpec) -> Result<i32, GatewayError>;
            async fn copy_message(&self, spec: &CopySpec) -> Result<i32, GatewayError>;
            async fn forward_message(&self, spec: &ForwardSpec) -> Result<i32, GatewayError>;
            async fn edit_text(&self, spec: &EditSpec) -> Result<(), GatewayError>;
            async fn edit_caption(&self, spec: &EditSpec) -> Result<(), GatewayError>;
            async fn edit_reply_markup(&self, spec: &EditSpec) -> Result<(), GatewayError>;
            async fn pin_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError>;
        }
    }

    fn task(task_type: &str) -> Task {
        Task {
            id: 1,
            user_id: 10,
            name: "news relay".to_string(),
            task_type: task_type.to_string(),
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn text_snapshot(text: &str) -> IncomingMessage {
        IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id: 5,
            text: Some(text.to_string()),
            caption: None,
            media_kind: MediaKind::Text,
            file_id: None,
            inline_keyboard: None,
            source_title: Some("News".to_string()),
        })
    }

    fn delivery_parts() -> (Task, CompiledSettings, IncomingMessage, TransformOutcome) {
        (
            task("bot"),
            CompiledSettings::defaults(1),
            text_snapshot("hello"),
            TransformOutcome::default(),
        )
    }

    #[tokio::test]
    async fn bot_task_sends_text_through_the_bot_backend() {
        let (task, settings, message, transformed) = delivery_parts();

        let mut bot = MockGateway::new();
        bot.expect_send_text()
            .withf(|spec| spec.chat_id == -2002 && spec.text == "hello")
            .times(1)
            .returning(|_| Ok(77));

        let dispatcher = Dispatcher::new(Arc::new(bot), None);

        let delivery = Delivery {
            task: &task,
            settings: &settings,
            message: &message,
            transformed: &transformed,
            target_chat_id: -2002,
            reply_to_message_id: None,
        };

        assert_eq!(dispatcher.deliver(&delivery).await.unwrap(), 77);
    }

    #[tokio::test]
    async fn userbot_failure_falls_back_to_the_bot_backend() {
        let (mut task, settings, message, transformed) = delivery_parts();
        task.task_type = TASK_TYPE_USERBOT.to_string();

        let mut userbot = MockGateway::new();
        userbot.expect_send_text().times(1).returning(|_| {
            Err(GatewayError::Http {
                message: "connection reset".to_string(),
            })
        });

        let mut bot = MockGateway::new();
        bot.expect_send_text().times(1).returning(|_| Ok(88));

        let dispatcher = Dispatcher::new(Arc::new(bot), Some(Arc::new(userbot)));

        let delivery = Delivery {
            task: &task,
            settings: &settings,
            message: &message,
            transformed: &transformed,
            target_chat_id: -2002,
            reply_to_message_id: None,
        };

        assert_eq!(dispatcher.deliver(&delivery).await.unwrap(), 88);
    }

    #[tokio::test]
    async fn quote_mode_appends_the_attribution_line() {
        let (task, mut settings, message, transformed) = delivery_parts();
        settings.forward_mode = ForwardMode::Quote;

        let mut bot = MockGateway::new();
        bot.expect_send_text()
            .withf(|spec| spec.text == "hello\n\nمن: News")
            .times(1)
            .returning(|_| Ok(5));

        let dispatcher = Dispatcher::new(Arc::new(bot), None);

        let delivery = Delivery {
            task: &task,
            settings: &settings,
            message: &message,
            transformed: &transformed,
            target_chat_id: -2002,
            reply_to_message_id: None,
        };

        dispatcher.deliver(&delivery).await.unwrap();
    }

    #[tokio::test]
    async fn stored_media_snapshot_is_resent_by_file_reference() {
        let (task, settings, _, transformed) = delivery_parts();

        let message = IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id: 6,
            text: None,
            caption: Some("look".to_string()),
            media_kind: MediaKind::Photo,
            file_id: Some("photo-file-1".to_string()),
            inline_keyboard: None,
            source_title: None,
        });

        let mut bot = MockGateway::new();
        bot.expect_send_media()
            .withf(|spec| {
                spec.kind == MediaKind::Photo
                    && spec.file_id == "photo-file-1"
                    && spec.caption.as_deref() == Some("look")
            })
            .times(1)
            .returning(|_| Ok(9));

        let dispatcher = Dispatcher::new(Arc::new(bot), None);

        let delivery = Delivery {
            task: &task,
            settings: &settings,
            message: &message,
            transformed: &transformed,
            target_chat_id: -2002,
            reply_to_message_id: None,
        };

        assert_eq!(dispatcher.deliver(&delivery).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn pin_failure_does_not_fail_the_delivery() {
        let (task, mut settings, message, transformed) = delivery_parts();
        settings.pin_messages = true;

        let mut bot = MockGateway::new();
        bot.expect_send_text().times(1).returning(|_| Ok(3));
        bot.expect_pin_message()
            .with(eq(-2002i64), eq(3))
            .times(1)
            .returning(|_, _| {
                Err(GatewayError::Api {
                    code: Some(400),
                    description: "Bad Request: not enough rights".to_string(),
                })
            });

        let dispatcher = Dispatcher::new(Arc::new(bot), None);

        let delivery = Delivery {
            task: &task,
            settings: &settings,
            message: &message,
            transformed: &transformed,
            target_chat_id: -2002,
            reply_to_message_id: None,
        };

        assert_eq!(dispatcher.deliver(&delivery).await.unwrap(), 3);
    }
}
