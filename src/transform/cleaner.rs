use crate::settings::TextCleaner;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?|ftp)://\S+|www\.\S+|t\.me/\S+|telegram\.(?:me|dog)/\S+").unwrap()
});

static BARE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z0-9][a-zA-Z0-9.-]*[a-zA-Z0-9]\.[a-zA-Z]{2,}(?:/\S*)?").unwrap());

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[a-zA-Z0-9_]{1,32}").unwrap());

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}",
        "\u{1F300}-\u{1F5FF}",
        "\u{1F680}-\u{1F6FF}",
        "\u{1F900}-\u{1F9FF}",
        "\u{1F1E6}-\u{1F1FF}",
        "\u{2600}-\u{27BF}",
        "\u{2B00}-\u{2BFF}",
        "\u{FE0F}",
        "\u{200D}",
        "]+",
    ))
    .unwrap()
});

static MULTI_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

static MULTI_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

/// Text-cleaning stage; each strip is independently toggled.
pub fn clean(text: &str, cleaner: &TextCleaner) -> String {
    let mut cleaned = text.to_string();

    if cleaner.remove_emojis {
        cleaned = EMOJI.replace_all(&cleaned, "").to_string();
    }

    if cleaner.remove_links {
        cleaned = URL.replace_all(&cleaned, "").to_string();
        cleaned = EMAIL.replace_all(&cleaned, "").to_string();
        cleaned = BARE_DOMAIN.replace_all(&cleaned, "").to_string();
    }

    if cleaner.remove_mentions {
        cleaned = MENTION.replace_all(&cleaned, "").to_string();
    }

    if cleaner.remove_emails {
        cleaned = EMAIL.replace_all(&cleaned, "").to_string();
    }

    if cleaner.remove_hashtags {
        cleaned = HASHTAG.replace_all(&cleaned, "").to_string();
    }

    if cleaner.remove_lines_with_words && !cleaner.target_words.is_empty() {
        cleaned = remove_lines_with_words(&cleaned, &cleaner.target_words);
    }

    if cleaner.remove_empty_lines {
        cleaned = cleaned
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
    }

    if cleaner.remove_extra_lines {
        cleaned = MULTI_BLANK_LINES.replace_all(&cleaned, "\n\n").to_string();
        cleaned = cleaned.trim().to_string();
    }

    if cleaner.normalize_whitespace {
        cleaned = cleaned.replace('\t', " ");
        cleaned = MULTI_SPACES.replace_all(&cleaned, " ").to_string();
        cleaned = cleaned
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
    }

    if cleaner.remove_duplicate_lines {
        cleaned = remove_duplicate_lines(&cleaned);
    }

    cleaned
}

fn remove_lines_with_words(text: &str, target_words: &[String]) -> String {
    let lowered: Vec<String> = target_words.iter().map(|word| word.to_lowercase()).collect();

    text.lines()
        .filter(|line| {
            let line = line.to_lowercase();
            !lowered.iter().any(|word| line.contains(word))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn remove_duplicate_lines(text: &str) -> String {
    let mut seen = HashSet::new();

    text.lines()
        .filter(|line| seen.insert(line.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner_with(setup: impl FnOnce(&mut TextCleaner)) -> TextCleaner {
        let mut cleaner = TextCleaner::default();
        setup(&mut cleaner);
        cleaner
    }

    #[test]
    fn strips_links_and_domains() {
        let cleaner = cleaner_with(|c| c.remove_links = true);

        let cleaned = clean("read https://example.com/a and t.me/chan or example.org", &cleaner);

        assert!(!cleaned.contains("example.com"));
        assert!(!cleaned.contains("t.me"));
        assert!(!cleaned.contains("example.org"));
        assert!(cleaned.contains("read"));
    }

    #[test]
    fn strips_mentions_and_hashtags_independently() {
        let mentions = cleaner_with(|c| c.remove_mentions = true);
        assert_eq!(clean("hi @user!", &mentions), "hi !");

        let hashtags = cleaner_with(|c| c.remove_hashtags = true);
        assert_eq!(clean("hot #news now", &hashtags), "hot  now");
    }

    #[test]
    fn removes_lines_containing_target_words() {
        let cleaner = cleaner_with(|c| {
            c.remove_lines_with_words = true;
            c.target_words = vec!["AD:".to_string()];
        });

        let cleaned = clean("headline\nad: buy now\nbody", &cleaner);

        assert_eq!(cleaned, "headline\nbody");
    }

    #[test]
    fn removes_empty_and_duplicate_lines() {
        let cleaner = cleaner_with(|c| {
            c.remove_empty_lines = true;
            c.remove_duplicate_lines = true;
        });

        let cleaned = clean("a\n\na\nb", &cleaner);

        assert_eq!(cleaned, "a\nb");
    }

    #[test]
    fn normalizes_whitespace() {
        let cleaner = cleaner_with(|c| c.normalize_whitespace = true);

        assert_eq!(clean("a  \t b  \nnext ", &cleaner), "a b\nnext");
    }

    #[test]
    fn strips_emojis() {
        let cleaner = cleaner_with(|c| c.remove_emojis = true);

        assert_eq!(clean("deal \u{1F525}\u{1F525} now", &cleaner), "deal  now");
    }
}
