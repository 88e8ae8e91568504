use chrono::{FixedOffset, TimeZone};
use el_reenvio::settings::{
    CompiledSettings, FormatSettings, KeywordFilters, KeywordMode, LengthAction, LengthFilter,
};
use el_reenvio::telegram::incoming::{IncomingMessage, MediaKind, MessageSnapshot};
use el_reenvio::transform::{self, format, RenderContext};
use el_reenvio::{filter, schedule};

fn text_message(text: &str) -> IncomingMessage {
    IncomingMessage::Snapshot(MessageSnapshot {
        chat_id: -1001234,
        message_id: 1,
        text: Some(text.to_string()),
        caption: None,
        media_kind: MediaKind::Text,
        file_id: None,
        inline_keyboard: None,
        source_title: Some("Source Channel".to_string()),
    })
}

fn render_context() -> RenderContext {
    let offset = FixedOffset::east_opt(0).unwrap();

    RenderContext {
        source_name: "Source Channel".to_string(),
        now: offset.with_ymd_and_hms(2024, 5, 13, 12, 0, 0).unwrap(),
    }
}

#[test]
fn keyword_whitelist_allows_and_blocks_per_payload_mode() {
    let mut settings = CompiledSettings::defaults(1);
    settings.keyword_filters = Some(KeywordFilters {
        mode: KeywordMode::Whitelist,
        whitelist: vec!["sale".to_string()],
        blacklist: vec![],
    });

    let allowed = filter::keyword::check(&text_message("Big Sale Today"), &settings);
    assert_eq!(allowed, filter::Verdict::Pass);

    let blocked = filter::keyword::check(&text_message("Big News Today"), &settings);
    assert!(matches!(blocked, filter::Verdict::Block { .. }));
}

#[test]
fn working_hours_wrap_allows_night_hours_and_blocks_midday() {
    assert!(schedule::hour_in_window(23, 22, 6));
    assert!(schedule::hour_in_window(3, 22, 6));
    assert!(!schedule::hour_in_window(12, 22, 6));
}

#[test]
fn remove_all_formatting_round_trips_to_plain_text() {
    let mut format_settings = FormatSettings::default();
    format_settings.remove_all = true;

    let marked_up = "**bold** *italic* [link](https://example.com)";

    assert_eq!(format::apply(marked_up, &format_settings), "bold italic link");
}

#[tokio::test]
async fn over_length_message_is_truncated_not_blocked() {
    let mut settings = CompiledSettings::defaults(1);
    settings.length_filter = LengthFilter {
        enabled: true,
        min_length: 0,
        max_length: 10,
        action_mode: LengthAction::Truncate,
    };

    let message = text_message("a twenty char string");

    // the filter lets it through
    let verdict = filter::length::check(&message, &settings);
    assert_eq!(verdict, filter::Verdict::Pass);

    // the transformer shortens it before dispatch
    let outcome = transform::apply(message.text(), &settings, &render_context()).await;
    assert_eq!(outcome.text.as_deref(), Some("a twenty c..."));
}

#[tokio::test]
async fn header_and_footer_wrap_the_transformed_body() {
    let mut settings = CompiledSettings::defaults(1);
    settings.header_enabled = true;
    settings.header_text = Some("من {source} | {date}".to_string());
    settings.footer_enabled = true;
    settings.footer_text = Some("نشر في {time}".to_string());

    let outcome = transform::apply(Some("body"), &settings, &render_context()).await;

    assert_eq!(
        outcome.text.as_deref(),
        Some("من Source Channel | 2024-05-13\nbody\nنشر في 12:00")
    );
}

#[tokio::test]
async fn disabled_header_flag_suppresses_configured_header_text() {
    let mut settings = CompiledSettings::defaults(1);
    settings.header_enabled = false;
    settings.header_text = Some("should not appear".to_string());

    let outcome = transform::apply(Some("body"), &settings, &render_context()).await;

    assert!(!outcome.modified);
    assert!(outcome.text.is_none());
}
