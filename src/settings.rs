use crate::models::TaskSettings;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ForwardMode {
    Copy,
    Forward,
    Quote,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DedupSignature {
    ContentAndId,
    ContentOnly,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LanguageFilterMode {
    Whitelist,
    Blacklist,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthAction {
    #[default]
    Block,
    Truncate,
    Summarize,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    Whitelist,
    #[default]
    Blacklist,
}

/// The filter mode is carried inside the payload itself; an absent or
/// unparsable payload means no keyword filtering at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeywordFilters {
    pub mode: KeywordMode,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl KeywordFilters {
    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LengthFilter {
    pub enabled: bool,
    pub min_length: usize,
    pub max_length: usize,
    pub action_mode: LengthAction,
}

impl Default for LengthFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            min_length: 0,
            max_length: 4096,
            action_mode: LengthAction::Block,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextCleaner {
    pub remove_emojis: bool,
    pub remove_links: bool,
    pub remove_mentions: bool,
    pub remove_emails: bool,
    pub remove_hashtags: bool,
    pub remove_inline_buttons: bool,
    pub remove_lines_with_words: bool,
    pub target_words: Vec<String>,
    pub remove_empty_lines: bool,
    pub remove_extra_lines: bool,
    pub normalize_whitespace: bool,
    pub remove_duplicate_lines: bool,
}

impl TextCleaner {
    pub fn touches_text(&self) -> bool {
        self.remove_emojis
            || self.remove_links
            || self.remove_mentions
            || self.remove_emails
            || self.remove_hashtags
            || self.remove_lines_with_words
            || self.remove_empty_lines
            || self.remove_extra_lines
            || self.normalize_whitespace
            || self.remove_duplicate_lines
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormatSettings {
    pub remove_all: bool,
    pub apply_bold: bool,
    pub apply_italic: bool,
    pub apply_underline: bool,
    pub apply_strikethrough: bool,
    pub apply_spoiler: bool,
    pub apply_code: bool,
    pub apply_mono: bool,
    pub apply_quote: bool,
    pub apply_link: bool,
    pub custom_link_url: String,
}

impl FormatSettings {
    pub fn any_enabled(&self) -> bool {
        self.remove_all
            || self.apply_bold
            || self.apply_italic
            || self.apply_underline
            || self.apply_strikethrough
            || self.apply_spoiler
            || self.apply_code
            || self.apply_mono
            || self.apply_quote
            || self.apply_link
    }
}

/// Per-weekday allow map. Days absent from the payload are allowed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DayFilter {
    pub monday: Option<bool>,
    pub tuesday: Option<bool>,
    pub wednesday: Option<bool>,
    pub thursday: Option<bool>,
    pub friday: Option<bool>,
    pub saturday: Option<bool>,
    pub sunday: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SendingLimits {
    pub per_minute: i64,
    pub per_hour: i64,
    pub per_day: i64,
}

impl Default for SendingLimits {
    fn default() -> Self {
        Self {
            per_minute: 10,
            per_hour: 100,
            per_day: 1000,
        }
    }
}

/// Literal replacement rules. Accepts both historical payload shapes:
/// `{"old": "new"}` maps and `[{"old": .., "new": ..}, {"from": .., "to": ..}]`
/// lists.
#[derive(Debug, Clone, Default)]
pub struct ReplaceRules {
    pub rules: Vec<(String, String)>,
}

impl ReplaceRules {
    fn parse(value: &Value) -> Self {
        let mut rules = Vec::new();

        match value {
            Value::Object(map) => {
                for (old, new) in map {
                    if let Some(new) = new.as_str() {
                        rules.push((old.clone(), new.to_string()));
                    }
                }
            }
            Value::Array(entries) => {
                for entry in entries {
                    let old = entry.get("old").or_else(|| entry.get("from"));
                    let new = entry.get("new").or_else(|| entry.get("to"));

                    if let (Some(Value::String(old)), Some(Value::String(new))) = (old, new) {
                        rules.push((old.clone(), new.clone()));
                    }
                }
            }
            _ => (),
        }

        ReplaceRules { rules }
    }
}

/// Typed snapshot of one task's settings row, parsed once at the engine
/// boundary. Malformed JSON payloads degrade to inert defaults instead of
/// failing the message.
#[derive(Debug, Clone)]
pub struct CompiledSettings {
    pub task_id: i64,
    pub forward_mode: ForwardMode,
    pub allow_text: bool,
    pub allow_photos: bool,
    pub allow_videos: bool,
    pub allow_documents: bool,
    pub allow_audio: bool,
    pub allow_voice: bool,
    pub allow_video_notes: bool,
    pub allow_stickers: bool,
    pub allow_animations: bool,
    pub allow_contacts: bool,
    pub allow_locations: bool,
    pub allow_venues: bool,
    pub allow_polls: bool,
    pub allow_dice: bool,
    pub filter_forwarded: bool,
    pub filter_links: bool,
    pub filter_inline_buttons: bool,
    pub filter_duplicates: bool,
    pub filter_language: bool,
    pub language_filter_mode: LanguageFilterMode,
    pub allowed_languages: Vec<String>,
    pub keyword_filters: Option<KeywordFilters>,
    pub length_filter: LengthFilter,
    pub replace_rules: ReplaceRules,
    pub auto_translate: bool,
    pub target_language: Option<String>,
    pub text_cleaner: TextCleaner,
    pub header_enabled: bool,
    pub header_text: Option<String>,
    pub footer_enabled: bool,
    pub footer_text: Option<String>,
    pub format_settings: FormatSettings,
    pub day_filter_enabled: bool,
    pub day_filter: DayFilter,
    pub working_hours_enabled: bool,
    pub start_hour: i32,
    pub end_hour: i32,
    pub utc_offset_minutes: i32,
    pub sending_limit_enabled: bool,
    pub sending_limits: SendingLimits,
    pub delay_min: i32,
    pub delay_max: i32,
    pub remove_caption: bool,
    pub silent_mode: bool,
    pub pin_messages: bool,
    pub link_preview: bool,
    pub preserve_replies: bool,
    pub sync_edits: bool,
    pub manual_mode: bool,
    pub duplicate_signature: DedupSignature,
}

impl CompiledSettings {
    /// Documented defaults, used when a task has no settings row yet: copy
    /// mode, every kind allowed, no filters, no transforms, 0-5s delay.
    pub fn defaults(task_id: i64) -> Self {
        CompiledSettings {
            task_id,
            forward_mode: ForwardMode::Copy,
            allow_text: true,
            allow_photos: true,
            allow_videos: true,
            allow_documents: true,
            allow_audio: true,
            allow_voice: true,
            allow_video_notes: true,
            allow_stickers: true,
            allow_animations: true,
            allow_contacts: true,
            allow_locations: true,
            allow_venues: true,
            allow_polls: true,
            allow_dice: true,
            filter_forwarded: false,
            filter_links: false,
            filter_inline_buttons: false,
            filter_duplicates: false,
            filter_language: false,
            language_filter_mode: LanguageFilterMode::Blacklist,
            allowed_languages: Vec::new(),
            keyword_filters: None,
            length_filter: LengthFilter::default(),
            replace_rules: ReplaceRules::default(),
            auto_translate: false,
            target_language: None,
            text_cleaner: TextCleaner::default(),
            header_enabled: false,
            header_text: None,
            footer_enabled: false,
            footer_text: None,
            format_settings: FormatSettings::default(),
            day_filter_enabled: false,
            day_filter: DayFilter::default(),
            working_hours_enabled: false,
            start_hour: 0,
            end_hour: 23,
            utc_offset_minutes: 0,
            sending_limit_enabled: false,
            sending_limits: SendingLimits::default(),
            delay_min: 0,
            delay_max: 5,
            remove_caption: false,
            silent_mode: false,
            pin_messages: false,
            link_preview: false,
            preserve_replies: false,
            sync_edits: false,
            manual_mode: false,
            duplicate_signature: DedupSignature::ContentAndId,
        }
    }

    pub fn from_row(row: &TaskSettings) -> Self {
        let forward_mode = match row.forward_mode.as_str() {
            "forward" => ForwardMode::Forward,
            "quote" => ForwardMode::Quote,
            _ => ForwardMode::Copy,
        };

        let language_filter_mode = match row.language_filter_mode.as_str() {
            "whitelist" => LanguageFilterMode::Whitelist,
            _ => LanguageFilterMode::Blacklist,
        };

        let duplicate_signature = match row.duplicate_signature.as_str() {
            "content_only" => DedupSignature::ContentOnly,
            _ => DedupSignature::ContentAndId,
        };

        let allowed_languages = row
            .allowed_languages
            .as_ref()
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        CompiledSettings {
            task_id: row.task_id,
            forward_mode,
            allow_text: row.allow_text,
            allow_photos: row.allow_photos,
            allow_videos: row.allow_videos,
            allow_documents: row.allow_documents,
            allow_audio: row.allow_audio,
            allow_voice: row.allow_voice,
            allow_video_notes: row.allow_video_notes,
            allow_stickers: row.allow_stickers,
            allow_animations: row.allow_animations,
            allow_contacts: row.allow_contacts,
            allow_locations: row.allow_locations,
            allow_venues: row.allow_venues,
            allow_polls: row.allow_polls,
            allow_dice: row.allow_dice,
            filter_forwarded: row.filter_forwarded,
            filter_links: row.filter_links,
            filter_inline_buttons: row.filter_inline_buttons,
            filter_duplicates: row.filter_duplicates,
            filter_language: row.filter_language,
            language_filter_mode,
            allowed_languages,
            keyword_filters: maybe_payload(&row.keyword_filters, "keyword_filters"),
            length_filter: payload_or_default(&row.length_filter_settings, "length_filter_settings"),
            replace_rules: row
                .replace_text
                .as_ref()
                .map(ReplaceRules::parse)
                .unwrap_or_default(),
            auto_translate: row.auto_translate,
            target_language: row.target_language.clone(),
            text_cleaner: payload_or_default(&row.text_cleaner_settings, "text_cleaner_settings"),
            header_enabled: row.header_enabled,
            header_text: row.header_text.clone(),
            footer_enabled: row.footer_enabled,
            footer_text: row.footer_text.clone(),
            format_settings: payload_or_default(&row.format_settings, "format_settings"),
            day_filter_enabled: row.day_filter_enabled,
            day_filter: payload_or_default(&row.day_filter_settings, "day_filter_settings"),
            working_hours_enabled: row.working_hours_enabled,
            start_hour: row.start_hour,
            end_hour: row.end_hour,
            utc_offset_minutes: row.utc_offset_minutes,
            sending_limit_enabled: row.sending_limit_enabled,
            sending_limits: payload_or_default(&row.sending_limit_settings, "sending_limit_settings"),
            delay_min: row.delay_min,
            delay_max: row.delay_max,
            remove_caption: row.remove_caption,
            silent_mode: row.silent_mode,
            pin_messages: row.pin_messages,
            link_preview: row.link_preview,
            preserve_replies: row.preserve_replies,
            sync_edits: row.sync_edits,
            manual_mode: row.manual_mode,
            duplicate_signature,
        }
    }

    /// True when any stage of the content transformer can change the text.
    pub fn transforms_content(&self) -> bool {
        !self.replace_rules.rules.is_empty()
            || self.auto_translate
            || self.text_cleaner.touches_text()
            || (self.header_enabled && self.header_text.is_some())
            || (self.footer_enabled && self.footer_text.is_some())
            || self.format_settings.any_enabled()
            || (self.length_filter.enabled
                && self.length_filter.action_mode != LengthAction::Block)
    }
}

fn payload_or_default<T: DeserializeOwned + Default>(value: &Option<Value>, field: &str) -> T {
    let Some(value) = value else {
        return T::default();
    };

    match serde_json::from_value(value.clone()) {
        Ok(parsed) => parsed,
        Err(error) => {
            log::error!("Malformed {field} payload, ignoring it: {error}");
            T::default()
        }
    }
}

fn maybe_payload<T: DeserializeOwned>(value: &Option<Value>, field: &str) -> Option<T> {
    let value = value.as_ref()?;

    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            log::error!("Malformed {field} payload, ignoring it: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_keyword_filters_mode_from_payload() {
        let payload = json!({"mode": "whitelist", "whitelist": ["sale"]});
        let filters: KeywordFilters = serde_json::from_value(payload).unwrap();

        assert_eq!(filters.mode, KeywordMode::Whitelist);
        assert_eq!(filters.whitelist, vec!["sale".to_string()]);
    }

    #[test]
    fn malformed_length_filter_payload_degrades_to_default() {
        let value = Some(json!({"enabled": "definitely", "max_length": []}));
        let filter: LengthFilter = payload_or_default(&value, "length_filter_settings");

        assert!(!filter.enabled);
        assert_eq!(filter.max_length, 4096);
        assert_eq!(filter.action_mode, LengthAction::Block);
    }

    #[test]
    fn replace_rules_accept_both_shapes() {
        let map = ReplaceRules::parse(&json!({"foo": "bar"}));
        assert_eq!(map.rules, vec![("foo".to_string(), "bar".to_string())]);

        let list = ReplaceRules::parse(&json!([
            {"old": "a", "new": "b"},
            {"from": "c", "to": "d"},
            {"broken": true}
        ]));
        assert_eq!(
            list.rules,
            vec![
                ("a".to_string(), "b".to_string()),
                ("c".to_string(), "d".to_string())
            ]
        );
    }

    #[test]
    fn day_filter_defaults_absent_days_to_allowed() {
        let filter: DayFilter = serde_json::from_value(json!({"sunday": false})).unwrap();

        assert_eq!(filter.sunday, Some(false));
        assert_eq!(filter.monday, None);
    }
}
