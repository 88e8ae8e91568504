use crate::filter::Verdict;
use crate::models::forwarding_log::LogStatus;
use crate::settings::{CompiledSettings, LengthAction};
use crate::telegram::IncomingMessage;

/// Blocks on under-length always, and on over-length only in `block` mode;
/// `truncate`/`summarize` over-length messages pass through for the content
/// transformer to shorten.
pub fn check(message: &IncomingMessage, settings: &CompiledSettings) -> Verdict {
    let filter = &settings.length_filter;

    if !filter.enabled {
        return Verdict::Pass;
    }

    let Some(text) = message.text() else {
        return Verdict::Pass;
    };

    let length = text.chars().count();

    if filter.min_length > 0 && length < filter.min_length {
        return Verdict::Block {
            status: LogStatus::Filtered,
            reason: format!("length {length} below minimum {}", filter.min_length),
        };
    }

    if length > filter.max_length && filter.action_mode == LengthAction::Block {
        return Verdict::Block {
            status: LogStatus::Filtered,
            reason: format!("length {length} above maximum {}", filter.max_length),
        };
    }

    Verdict::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CompiledSettings, LengthFilter};
    use crate::telegram::incoming::{MediaKind, MessageSnapshot};

    fn message(text: &str) -> IncomingMessage {
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

    fn settings_with(filter: LengthFilter) -> CompiledSettings {
        let mut settings = CompiledSettings::defaults(1);
        settings.length_filter = filter;
        settings
    }

    #[test]
    fn blocks_below_minimum() {
        let settings = settings_with(LengthFilter {
            enabled: true,
            min_length: 10,
            max_length: 4096,
            action_mode: LengthAction::Block,
        });

        assert!(matches!(
            check(&message("short"), &settings),
            Verdict::Block { .. }
        ));
    }

    #[test]
    fn truncate_mode_does_not_block_over_length() {
        let settings = settings_with(LengthFilter {
            enabled: true,
            min_length: 0,
            max_length: 10,
            action_mode: LengthAction::Truncate,
        });

        assert_eq!(
            check(&message("a message longer than ten"), &settings),
            Verdict::Pass
        );
    }

    #[test]
    fn block_mode_blocks_over_length() {
        let settings = settings_with(LengthFilter {
            enabled: true,
            min_length: 0,
            max_length: 10,
            action_mode: LengthAction::Block,
        });

        assert!(matches!(
            check(&message("a message longer than ten"), &settings),
            Verdict::Block { .. }
        ));
    }
}
