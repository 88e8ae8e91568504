use crate::dedup::Deduplicator;
use crate::models::forwarding_log::LogStatus;
use crate::settings::CompiledSettings;
use crate::telegram::{IncomingMessage, MediaKind};
use diesel::PgConnection;

pub mod keyword;
pub mod language;
pub mod length;
pub mod links;

/// Outcome of one filter stage. A block always names the log status and a
/// human-readable reason so the management layer can explain the decision.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Verdict {
    Pass,
    Block { status: LogStatus, reason: String },
}

impl Verdict {
    fn filtered(reason: impl Into<String>) -> Self {
        Verdict::Block {
            status: LogStatus::Filtered,
            reason: reason.into(),
        }
    }
}

/// Runs the blocking stages in their fixed order; the first block wins.
/// Stage failures (malformed payloads, storage errors) degrade to a pass of
/// that stage rather than failing the message.
pub fn evaluate(
    conn: &mut PgConnection,
    dedup: &Deduplicator,
    message: &IncomingMessage,
    settings: &CompiledSettings,
) -> Verdict {
    if let Verdict::Block { status, reason } = check_media_kind(message, settings) {
        return Verdict::Block { status, reason };
    }

    if settings.filter_forwarded && message.has_forward_provenance() {
        return Verdict::filtered("forwarded message blocked");
    }

    if settings.filter_links {
        if let Some(text) = message.content_text() {
            if links::contains_link_or_mention(text) {
                return Verdict::filtered("contains links or mentions");
            }
        }
    }

    if let Verdict::Block { status, reason } = check_inline_buttons(message, settings) {
        return Verdict::Block { status, reason };
    }

    if settings.filter_duplicates {
        match dedup.evaluate(conn, settings.task_id, message, settings.duplicate_signature) {
            Ok(outcome) if outcome.is_duplicate => {
                return Verdict::Block {
                    status: LogStatus::Duplicate,
                    reason: format!("duplicate content seen {} times", outcome.times_seen),
                };
            }
            Ok(_) => (),
            Err(error) => {
                log::error!("Duplicate check failed, letting the message pass: {error}");
            }
        }
    }

    if settings.filter_language {
        if let Verdict::Block { status, reason } = language::check(message, settings) {
            return Verdict::Block { status, reason };
        }
    }

    if let Verdict::Block { status, reason } = length::check(message, settings) {
        return Verdict::Block { status, reason };
    }

    if let Verdict::Block { status, reason } = keyword::check(message, settings) {
        return Verdict::Block { status, reason };
    }

    Verdict::Pass
}

fn check_media_kind(message: &IncomingMessage, settings: &CompiledSettings) -> Verdict {
    let kind = message.media_kind();

    let allowed = match kind {
        MediaKind::Text => settings.allow_text,
        MediaKind::Photo => settings.allow_photos,
        MediaKind::Video => settings.allow_videos,
        MediaKind::Document => settings.allow_documents,
        MediaKind::Audio => settings.allow_audio,
        MediaKind::Voice => settings.allow_voice,
        MediaKind::VideoNote => settings.allow_video_notes,
        MediaKind::Sticker => settings.allow_stickers,
        MediaKind::Animation => settings.allow_animations,
        MediaKind::Contact => settings.allow_contacts,
        MediaKind::Location => settings.allow_locations,
        MediaKind::Venue => settings.allow_venues,
        MediaKind::Poll => settings.allow_polls,
        MediaKind::Dice => settings.allow_dice,
    };

    if allowed {
        Verdict::Pass
    } else {
        Verdict::filtered(format!("{kind:?} messages are disabled"))
    }
}

/// Blocking is one policy for keyboards; the cleaner's strip toggle is the
/// non-blocking alternative handled at dispatch time.
fn check_inline_buttons(message: &IncomingMessage, settings: &CompiledSettings) -> Verdict {
    if settings.filter_inline_buttons && message.reply_markup().is_some() {
        Verdict::filtered("carries an inline keyboard")
    } else {
        Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CompiledSettings;
    use crate::telegram::incoming::{MessageSnapshot, SnapshotButton};

    pub(crate) fn text_message(text: &str) -> IncomingMessage {
        IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id: 1,
            text: Some(text.to_string()),
            caption: None,
            media_kind: MediaKind::Text,
            file_id: None,
            inline_keyboard: None,
            source_title: None,
        })
    }

    fn defaults() -> CompiledSettings {
        CompiledSettings::defaults(1)
    }

    #[test]
    fn pure_text_is_blocked_when_text_is_disallowed() {
        let mut settings = defaults();
        settings.allow_text = false;

        let verdict = check_media_kind(&text_message("hello"), &settings);

        match verdict {
            Verdict::Block { status, .. } => assert_eq!(status, LogStatus::Filtered),
            Verdict::Pass => panic!("expected a block"),
        }
    }

    #[test]
    fn media_kind_allow_list_passes_enabled_kinds() {
        let settings = defaults();

        assert_eq!(check_media_kind(&text_message("hello"), &settings), Verdict::Pass);
    }

    #[test]
    fn inline_keyboard_blocks_only_when_filter_enabled() {
        let message = IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id: 2,
            text: Some("press".to_string()),
            caption: None,
            media_kind: MediaKind::Text,
            file_id: None,
            inline_keyboard: Some(vec![vec![SnapshotButton {
                text: "go".to_string(),
                url: Some("https://example.com".to_string()),
                callback_data: None,
            }]]),
            source_title: None,
        });

        let mut settings = defaults();
        assert_eq!(check_inline_buttons(&message, &settings), Verdict::Pass);

        settings.filter_inline_buttons = true;
        assert!(matches!(
            check_inline_buttons(&message, &settings),
            Verdict::Block { .. }
        ));
    }
}
