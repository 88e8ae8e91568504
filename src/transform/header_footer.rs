use chrono::{DateTime, FixedOffset};
use typed_builder::TypedBuilder;

const ORIGINAL_VAR: &str = "{original}";
const SOURCE_VAR: &str = "{source}";
const TIME_VAR: &str = "{time}";
const DATE_VAR: &str = "{date}";

/// Injects the configured header above and footer below the text, with
/// variable substitution. A header or footer is applied only when present:
/// the enable flags are resolved by the caller.
#[derive(TypedBuilder)]
pub struct HeaderFooterRenderer {
    #[builder(setter(into), default)]
    header: Option<String>,
    #[builder(setter(into), default)]
    footer: Option<String>,
    source_name: String,
    now: DateTime<FixedOffset>,
}

impl HeaderFooterRenderer {
    pub fn render(&self, text: &str) -> String {
        let mut result = text.to_string();

        if let Some(header) = &self.header {
            if !header.trim().is_empty() {
                result = format!("{}\n{}", self.substitute(header, text), result);
            }
        }

        if let Some(footer) = &self.footer {
            if !footer.trim().is_empty() {
                result = format!("{}\n{}", result, self.substitute(footer, text));
            }
        }

        result
    }

    fn substitute(&self, template: &str, original: &str) -> String {
        template
            .replace(ORIGINAL_VAR, original)
            .replace(SOURCE_VAR, &self.source_name)
            .replace(TIME_VAR, &self.now.format("%H:%M").to_string())
            .replace(DATE_VAR, &self.now.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn renderer(header: Option<&str>, footer: Option<&str>) -> HeaderFooterRenderer {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();

        HeaderFooterRenderer::builder()
            .header(header.map(str::to_string))
            .footer(footer.map(str::to_string))
            .source_name("News".to_string())
            .now(offset.with_ymd_and_hms(2024, 5, 13, 15, 54, 0).unwrap())
            .build()
    }

    #[test]
    fn substitutes_all_variables() {
        let rendered = renderer(Some("{source} | {date} {time}"), None).render("body");

        assert_eq!(rendered, "News | 2024-05-13 15:54\nbody");
    }

    #[test]
    fn footer_goes_below_and_can_quote_the_original() {
        let rendered = renderer(None, Some("was: {original}")).render("body");

        assert_eq!(rendered, "body\nwas: body");
    }

    #[test]
    fn blank_header_is_not_applied() {
        let rendered = renderer(Some("   "), None).render("body");

        assert_eq!(rendered, "body");
    }
}
