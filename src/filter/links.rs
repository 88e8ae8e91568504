use once_cell::sync::Lazy;
use regex::Regex;

static LINK_OR_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://|t\.me/|@\w+|#\w+").unwrap());

static BARE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"www\.|\.com|\.org|\.net|\.edu|\.gov").unwrap());

/// Matches URLs, telegram links, @mentions, #hashtags and bare domains.
pub fn contains_link_or_mention(text: &str) -> bool {
    LINK_OR_MENTION.is_match(text) || BARE_DOMAIN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_urls_mentions_and_hashtags() {
        assert!(contains_link_or_mention("see https://example.com"));
        assert!(contains_link_or_mention("join t.me/channel"));
        assert!(contains_link_or_mention("ping @someone"));
        assert!(contains_link_or_mention("trending #topic"));
        assert!(contains_link_or_mention("visit www.example.org"));
    }

    #[test]
    fn plain_text_passes() {
        assert!(!contains_link_or_mention("just a plain sentence"));
    }
}
