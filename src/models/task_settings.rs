use crate::schema::task_settings;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = task_settings)]
pub struct TaskSettings {
    pub id: i64,
    pub task_id: i64,
    pub forward_mode: String,
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
    pub language_filter_mode: String,
    pub allowed_languages: Option<Value>,
    pub keyword_filters: Option<Value>,
    pub length_filter_settings: Option<Value>,
    pub replace_text: Option<Value>,
    pub auto_translate: bool,
    pub target_language: Option<String>,
    pub text_cleaner_settings: Option<Value>,
    pub header_enabled: bool,
    pub header_text: Option<String>,
    pub footer_enabled: bool,
    pub footer_text: Option<String>,
    pub format_settings: Option<Value>,
    pub day_filter_enabled: bool,
    pub day_filter_settings: Option<Value>,
    pub working_hours_enabled: bool,
    pub start_hour: i32,
    pub end_hour: i32,
    pub utc_offset_minutes: i32,
    pub sending_limit_enabled: bool,
    pub sending_limit_settings: Option<Value>,
    pub delay_min: i32,
    pub delay_max: i32,
    pub remove_caption: bool,
    pub silent_mode: bool,
    pub pin_messages: bool,
    pub link_preview: bool,
    pub preserve_replies: bool,
    pub sync_edits: bool,
    pub manual_mode: bool,
    pub duplicate_signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
