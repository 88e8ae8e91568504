use crate::filter::Verdict;
use crate::models::forwarding_log::LogStatus;
use crate::settings::{CompiledSettings, KeywordMode};
use crate::telegram::IncomingMessage;
use aho_corasick::AhoCorasick;

pub fn check(message: &IncomingMessage, settings: &CompiledSettings) -> Verdict {
    let Some(filters) = &settings.keyword_filters else {
        return Verdict::Pass;
    };

    if filters.is_empty() {
        return Verdict::Pass;
    }

    let Some(text) = message.text() else {
        return Verdict::Pass;
    };

    let text = text.to_lowercase();

    match filters.mode {
        KeywordMode::Whitelist => {
            if filters.whitelist.is_empty() {
                return Verdict::Pass;
            }

            if matches_any(&text, &filters.whitelist) {
                Verdict::Pass
            } else {
                Verdict::Block {
                    status: LogStatus::Filtered,
                    reason: "no whitelisted keyword present".to_string(),
                }
            }
        }

        KeywordMode::Blacklist => {
            if matches_any(&text, &filters.blacklist) {
                Verdict::Block {
                    status: LogStatus::Filtered,
                    reason: "blacklisted keyword present".to_string(),
                }
            } else {
                Verdict::Pass
            }
        }
    }
}

fn matches_any(text: &str, keywords: &[String]) -> bool {
    let lowered: Vec<String> = keywords.iter().map(|word| word.to_lowercase()).collect();

    match AhoCorasick::new(&lowered) {
        Ok(searcher) => searcher.find(text).is_some(),
        Err(error) => {
            log::error!("Failed to build keyword automaton: {error}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CompiledSettings, KeywordFilters};
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

    fn settings_with(filters: KeywordFilters) -> CompiledSettings {
        let mut settings = CompiledSettings::defaults(1);
        settings.keyword_filters = Some(filters);
        settings
    }

    #[test]
    fn whitelist_allows_case_insensitive_substring_match() {
        let settings = settings_with(KeywordFilters {
            mode: KeywordMode::Whitelist,
            whitelist: vec!["sale".to_string()],
            blacklist: vec![],
        });

        assert_eq!(check(&message("Big Sale Today"), &settings), Verdict::Pass);
    }

    #[test]
    fn whitelist_blocks_when_nothing_matches() {
        let settings = settings_with(KeywordFilters {
            mode: KeywordMode::Whitelist,
            whitelist: vec!["sale".to_string()],
            blacklist: vec![],
        });

        match check(&message("Big News Today"), &settings) {
            Verdict::Block { status, .. } => assert_eq!(status, LogStatus::Filtered),
            Verdict::Pass => panic!("expected a block"),
        }
    }

    #[test]
    fn blacklist_blocks_on_any_match() {
        let settings = settings_with(KeywordFilters {
            mode: KeywordMode::Blacklist,
            whitelist: vec![],
            blacklist: vec!["spam".to_string()],
        });

        assert!(matches!(
            check(&message("pure SPAM offer"), &settings),
            Verdict::Block { .. }
        ));
        assert_eq!(check(&message("honest offer"), &settings), Verdict::Pass);
    }

    #[test]
    fn empty_whitelist_lets_everything_through() {
        let settings = settings_with(KeywordFilters {
            mode: KeywordMode::Whitelist,
            whitelist: vec![],
            blacklist: vec![],
        });

        assert_eq!(check(&message("anything"), &settings), Verdict::Pass);
    }
}
