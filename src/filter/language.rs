use crate::filter::Verdict;
use crate::models::forwarding_log::LogStatus;
use crate::settings::{CompiledSettings, LanguageFilterMode};
use crate::telegram::IncomingMessage;

const LATIN_THRESHOLD: f64 = 0.3;

const EN_WORDS: [&str; 8] = ["the", "and", "is", "in", "to", "of", "a", "that"];
const ES_WORDS: [&str; 8] = ["el", "la", "de", "que", "y", "en", "un", "es"];
const FR_WORDS: [&str; 7] = ["le", "de", "et", "à", "un", "il", "être"];
const DE_WORDS: [&str; 8] = ["der", "die", "und", "in", "den", "von", "zu", "das"];
const IT_WORDS: [&str; 8] = ["il", "di", "che", "e", "la", "un", "a", "per"];
const PT_WORDS: [&str; 8] = ["o", "de", "que", "e", "do", "da", "em", "um"];

pub fn check(message: &IncomingMessage, settings: &CompiledSettings) -> Verdict {
    let Some(text) = message.content_text() else {
        return Verdict::Pass;
    };

    let detected = detect_language(text);

    let listed = settings
        .allowed_languages
        .iter()
        .any(|language| language.as_str() == detected);

    let allowed = match settings.language_filter_mode {
        LanguageFilterMode::Whitelist => listed,
        LanguageFilterMode::Blacklist => !listed,
    };

    if allowed {
        Verdict::Pass
    } else {
        Verdict::Block {
            status: LogStatus::Filtered,
            reason: format!("language {detected} not allowed"),
        }
    }
}

/// Script-based heuristic: the Unicode block covering more than 30% of the
/// letters wins; Latin text is disambiguated by common stop-words.
pub fn detect_language(text: &str) -> &'static str {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();

    if letters.is_empty() {
        return "unknown";
    }

    let mut arabic = 0usize;
    let mut cyrillic = 0usize;
    let mut chinese = 0usize;
    let mut japanese = 0usize;
    let mut korean = 0usize;
    let mut latin = 0usize;

    for c in &letters {
        match c {
            '\u{0600}'..='\u{06FF}' => arabic += 1,
            '\u{0400}'..='\u{04FF}' => cyrillic += 1,
            '\u{4E00}'..='\u{9FFF}' => chinese += 1,
            '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => japanese += 1,
            '\u{AC00}'..='\u{D7AF}' => korean += 1,
            c if c.is_ascii_alphabetic() => latin += 1,
            _ => (),
        }
    }

    let threshold = (letters.len() as f64 * LATIN_THRESHOLD) as usize;

    if arabic > threshold {
        "ar"
    } else if cyrillic > threshold {
        "ru"
    } else if chinese > threshold {
        "zh"
    } else if japanese > threshold {
        "ja"
    } else if korean > threshold {
        "ko"
    } else if latin > threshold {
        disambiguate_latin(text)
    } else {
        "unknown"
    }
}

fn disambiguate_latin(text: &str) -> &'static str {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();

    let hits = |list: &[&str]| -> usize {
        words
            .iter()
            .filter(|word| list.contains(&word.as_str()))
            .count()
    };

    let scored = [
        ("en", hits(&EN_WORDS)),
        ("es", hits(&ES_WORDS)),
        ("fr", hits(&FR_WORDS)),
        ("de", hits(&DE_WORDS)),
        ("it", hits(&IT_WORDS)),
        ("pt", hits(&PT_WORDS)),
    ];

    scored
        .iter()
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| *count > 0)
        .map(|(language, _)| *language)
        .unwrap_or("en")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_script_blocks() {
        assert_eq!(detect_language("مرحبا بالعالم"), "ar");
        assert_eq!(detect_language("привет мир"), "ru");
        assert_eq!(detect_language("你好世界"), "zh");
        assert_eq!(detect_language("こんにちは"), "ja");
        assert_eq!(detect_language("안녕하세요"), "ko");
    }

    #[test]
    fn latin_text_falls_back_to_stop_words() {
        assert_eq!(detect_language("the quick brown fox is in the barn"), "en");
        assert_eq!(detect_language("el perro que corre en la calle es un amigo"), "es");
        assert_eq!(detect_language("der Hund und die Katze in den Garten von zu das Haus"), "de");
    }

    #[test]
    fn latin_without_stop_words_defaults_to_english() {
        assert_eq!(detect_language("zzz qqq xxx"), "en");
    }

    #[test]
    fn symbols_only_text_is_unknown() {
        assert_eq!(detect_language("123 !!! ???"), "unknown");
    }
}
