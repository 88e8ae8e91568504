use crate::settings::{LengthAction, LengthFilter};

const SUMMARY_HEAD_CHARS: usize = 200;
const SUMMARY_RESERVE_CHARS: usize = 50;
const SUMMARY_MARKER: &str = "\n\n[تم اختصار الرسالة - النص كامل في المصدر]";

/// Applies the over-length policy for `truncate` and `summarize` modes.
/// Under-length and `block` handling happened in the filter pipeline.
pub fn apply(text: &str, filter: &LengthFilter) -> String {
    if !filter.enabled {
        return text.to_string();
    }

    let length = text.chars().count();

    if length <= filter.max_length {
        return text.to_string();
    }

    match filter.action_mode {
        LengthAction::Block => text.to_string(),
        LengthAction::Truncate => {
            let cut: String = text.chars().take(filter.max_length).collect();

            format!("{cut}...")
        }
        LengthAction::Summarize => {
            let head_length = SUMMARY_HEAD_CHARS
                .min(filter.max_length.saturating_sub(SUMMARY_RESERVE_CHARS))
                .max(1);
            let head: String = text.chars().take(head_length).collect();

            format!("{head}{SUMMARY_MARKER}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(max_length: usize, action_mode: LengthAction) -> LengthFilter {
        LengthFilter {
            enabled: true,
            min_length: 0,
            max_length,
            action_mode,
        }
    }

    #[test]
    fn truncates_to_max_length_plus_ellipsis() {
        let result = apply("a twenty char string", &filter(10, LengthAction::Truncate));

        assert_eq!(result, "a twenty c...");
    }

    #[test]
    fn within_limit_is_untouched() {
        let result = apply("short", &filter(10, LengthAction::Truncate));

        assert_eq!(result, "short");
    }

    #[test]
    fn summarize_keeps_a_head_and_adds_the_marker() {
        let long_text = "x".repeat(300);
        let result = apply(&long_text, &filter(260, LengthAction::Summarize));

        assert!(result.starts_with(&"x".repeat(200)));
        assert!(result.ends_with(SUMMARY_MARKER));
    }

    #[test]
    fn block_mode_passes_through_untouched() {
        let long_text = "y".repeat(30);
        let result = apply(&long_text, &filter(10, LengthAction::Block));

        assert_eq!(result, long_text);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let result = apply("éééééééééééé", &filter(5, LengthAction::Truncate));

        assert_eq!(result, "ééééé...");
    }
}
