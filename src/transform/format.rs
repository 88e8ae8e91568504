use crate::settings::FormatSettings;
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static MD_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static MD_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static MD_UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_]+)__").unwrap());
static MD_STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~]+)~~").unwrap());
static MD_SPOILER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\|([^|]+)\|\|").unwrap());
static MD_CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```([^`]*)```").unwrap());
static MD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static MD_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> ?").unwrap());
static MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());

/// Rich-text formatting stage. `remove_all` strips existing markup; the
/// block styles (mono, code, quote) are mutually exclusive while the inline
/// styles combine; a custom link wraps outermost.
pub fn apply(text: &str, format: &FormatSettings) -> String {
    let mut result = text.to_string();

    if format.remove_all {
        result = strip_markup(&result);
    }

    if format.apply_mono {
        result = format!("<pre>{result}</pre>");
    } else if format.apply_code {
        result = format!("<code>{result}</code>");
    } else if format.apply_quote {
        result = result
            .lines()
            .map(|line| format!("<blockquote>{line}</blockquote>"))
            .collect::<Vec<_>>()
            .join("\n");
    } else {
        if format.apply_bold {
            result = format!("<b>{result}</b>");
        }

        if format.apply_italic {
            result = format!("<i>{result}</i>");
        }

        if format.apply_underline {
            result = format!("<u>{result}</u>");
        }

        if format.apply_strikethrough {
            result = format!("<s>{result}</s>");
        }

        if format.apply_spoiler {
            result = format!("<tg-spoiler>{result}</tg-spoiler>");
        }
    }

    if format.apply_link && !format.custom_link_url.trim().is_empty() {
        result = format!(r#"<a href="{}">{}</a>"#, format.custom_link_url, result);
    }

    result
}

fn strip_markup(text: &str) -> String {
    let mut result = HTML_TAG.replace_all(text, "").to_string();

    result = MD_CODE_BLOCK.replace_all(&result, "$1").to_string();
    result = MD_BOLD.replace_all(&result, "$1").to_string();
    result = MD_UNDERLINE.replace_all(&result, "$1").to_string();
    result = MD_ITALIC.replace_all(&result, "$1").to_string();
    result = MD_STRIKE.replace_all(&result, "$1").to_string();
    result = MD_SPOILER.replace_all(&result, "$1").to_string();
    result = MD_CODE.replace_all(&result, "$1").to_string();
    result = MD_LINK.replace_all(&result, "$1").to_string();
    result = MD_QUOTE.replace_all(&result, "").to_string();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_with(setup: impl FnOnce(&mut FormatSettings)) -> FormatSettings {
        let mut format = FormatSettings::default();
        setup(&mut format);
        format
    }

    #[test]
    fn remove_all_round_trips_marked_up_text_to_plain() {
        let format = format_with(|f| f.remove_all = true);

        let marked = "**bold** and *italic* and [link](https://example.com) and <b>html</b>";
        let plain = apply(marked, &format);

        assert_eq!(plain, "bold and italic and link and html");
    }

    #[test]
    fn inline_styles_combine() {
        let format = format_with(|f| {
            f.apply_bold = true;
            f.apply_italic = true;
        });

        assert_eq!(apply("x", &format), "<i><b>x</b></i>");
    }

    #[test]
    fn block_styles_are_mutually_exclusive() {
        let format = format_with(|f| {
            f.apply_mono = true;
            f.apply_code = true;
            f.apply_bold = true;
        });

        assert_eq!(apply("x", &format), "<pre>x</pre>");
    }

    #[test]
    fn quote_wraps_each_line() {
        let format = format_with(|f| f.apply_quote = true);

        assert_eq!(
            apply("a\nb", &format),
            "<blockquote>a</blockquote>\n<blockquote>b</blockquote>"
        );
    }

    #[test]
    fn custom_link_wraps_outermost() {
        let format = format_with(|f| {
            f.apply_bold = true;
            f.apply_link = true;
            f.custom_link_url = "https://example.com".to_string();
        });

        assert_eq!(
            apply("x", &format),
            r#"<a href="https://example.com"><b>x</b></a>"#
        );
    }
}
