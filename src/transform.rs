use crate::settings::CompiledSettings;
use chrono::{DateTime, FixedOffset};

pub mod cleaner;
pub mod format;
pub mod header_footer;
pub mod length_policy;
pub mod replace;
pub mod translate;

/// Ambient values available to header/footer variable substitution.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub source_name: String,
    pub now: DateTime<FixedOffset>,
}

/// Result of the content transformation pipeline for one message.
#[derive(Debug, Clone, Default)]
pub struct TransformOutcome {
    /// Final text when any stage ran; `None` means the original content is
    /// forwarded untouched.
    pub text: Option<String>,
    pub modified: bool,
    /// Set when the text became empty: the message completes as a no-op with
    /// no forward attempt.
    pub dropped: bool,
}

/// Runs the stages in their strict order: replace, translate, clean,
/// header/footer, format, length policy. Every stage is optional and a stage
/// error degrades to "no effect".
pub async fn apply(
    original: Option<&str>,
    settings: &CompiledSettings,
    context: &RenderContext,
) -> TransformOutcome {
    let Some(original) = original else {
        return TransformOutcome::default();
    };

    let mut text = original.to_string();

    text = replace::apply(&text, &settings.replace_rules);

    if settings.auto_translate {
        text = translate::apply(&text, settings).await;
    }

    if settings.text_cleaner.touches_text() {
        text = cleaner::clean(&text, &settings.text_cleaner);
    }

    if text.trim().is_empty() {
        return TransformOutcome {
            text: None,
            modified: true,
            dropped: true,
        };
    }

    if (settings.header_enabled && settings.header_text.is_some())
        || (settings.footer_enabled && settings.footer_text.is_some())
    {
        let renderer = header_footer::HeaderFooterRenderer::builder()
            .header(settings.header_enabled.then(|| settings.header_text.clone()).flatten())
            .footer(settings.footer_enabled.then(|| settings.footer_text.clone()).flatten())
            .source_name(context.source_name.clone())
            .now(context.now)
            .build();

        text = renderer.render(&text);
    }

    if settings.format_settings.any_enabled() {
        text = format::apply(&text, &settings.format_settings);
    }

    text = length_policy::apply(&text, &settings.length_filter);

    let modified = text != original;

    TransformOutcome {
        text: modified.then_some(text),
        modified,
        dropped: false,
    }
}

/// Re-derivation used by the edit synchronizer: only replacement and
/// cleaning, the same modification rules an already-delivered message went
/// through for its body.
pub fn rederive_for_edit(original: &str, settings: &CompiledSettings) -> String {
    let mut text = replace::apply(original, &settings.replace_rules);

    if settings.text_cleaner.touches_text() {
        text = cleaner::clean(&text, &settings.text_cleaner);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CompiledSettings, LengthAction, LengthFilter, ReplaceRules};
    use chrono::TimeZone;

    fn context() -> RenderContext {
        let offset = FixedOffset::east_opt(0).unwrap();

        RenderContext {
            source_name: "News Channel".to_string(),
            now: offset.with_ymd_and_hms(2024, 5, 13, 15, 54, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn untouched_settings_leave_text_unmodified() {
        let settings = CompiledSettings::defaults(1);

        let outcome = apply(Some("hello"), &settings, &context()).await;

        assert!(!outcome.modified);
        assert!(outcome.text.is_none());
        assert!(!outcome.dropped);
    }

    #[tokio::test]
    async fn replacement_marks_text_modified() {
        let mut settings = CompiledSettings::defaults(1);
        settings.replace_rules = ReplaceRules {
            rules: vec![("old".to_string(), "new".to_string())],
        };

        let outcome = apply(Some("old value"), &settings, &context()).await;

        assert_eq!(outcome.text.as_deref(), Some("new value"));
        assert!(outcome.modified);
    }

    #[tokio::test]
    async fn text_emptied_by_cleaning_drops_the_message() {
        let mut settings = CompiledSettings::defaults(1);
        settings.text_cleaner.remove_links = true;

        let outcome = apply(Some("https://only-a-link.example.com"), &settings, &context()).await;

        assert!(outcome.dropped);
        assert!(outcome.text.is_none());
    }

    #[tokio::test]
    async fn length_policy_truncates_after_other_stages() {
        let mut settings = CompiledSettings::defaults(1);
        settings.length_filter = LengthFilter {
            enabled: true,
            min_length: 0,
            max_length: 10,
            action_mode: LengthAction::Truncate,
        };

        let outcome = apply(Some("a twenty char string"), &settings, &context()).await;

        assert_eq!(outcome.text.as_deref(), Some("a twenty c..."));
    }

    #[test]
    fn edit_rederivation_applies_replacement_and_cleaning_only() {
        let mut settings = CompiledSettings::defaults(1);
        settings.replace_rules = ReplaceRules {
            rules: vec![("foo".to_string(), "bar".to_string())],
        };
        settings.header_enabled = true;
        settings.header_text = Some("HEADER".to_string());

        let text = rederive_for_edit("foo stays", &settings);

        assert_eq!(text, "bar stays");
    }
}
