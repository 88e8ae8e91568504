use frankenstein::InlineKeyboardButton;
use frankenstein::InlineKeyboardMarkup;
use frankenstein::Message;
use serde::{Deserialize, Serialize};

/// Exactly one kind is classified per message; the corresponding `allow_*`
/// toggle governs it in the filter pipeline.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Text,
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    VideoNote,
    Sticker,
    Animation,
    Contact,
    Location,
    Venue,
    Poll,
    Dice,
}

impl MediaKind {
    pub fn is_media(self) -> bool {
        !matches!(
            self,
            MediaKind::Text
                | MediaKind::Contact
                | MediaKind::Location
                | MediaKind::Venue
                | MediaKind::Poll
                | MediaKind::Dice
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotButton {
    pub text: String,
    pub url: Option<String>,
    pub callback_data: Option<String>,
}

/// A stored stand-in for a gateway message: what the approval gate persists
/// and later replays through the same pipeline as a live message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub chat_id: i64,
    pub message_id: i32,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub media_kind: MediaKind,
    pub file_id: Option<String>,
    pub inline_keyboard: Option<Vec<Vec<SnapshotButton>>>,
    pub source_title: Option<String>,
}

/// A message flowing through the pipeline: either live from the gateway or
/// reconstructed from a stored snapshot.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    Live(Box<Message>),
    Snapshot(MessageSnapshot),
}

impl IncomingMessage {
    pub fn chat_id(&self) -> i64 {
        match self {
            IncomingMessage::Live(message) => message.chat.id,
            IncomingMessage::Snapshot(snapshot) => snapshot.chat_id,
        }
    }

    pub fn message_id(&self) -> i32 {
        match self {
            IncomingMessage::Live(message) => message.message_id,
            IncomingMessage::Snapshot(snapshot) => snapshot.message_id,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            IncomingMessage::Live(message) => message.text.as_deref(),
            IncomingMessage::Snapshot(snapshot) => snapshot.text.as_deref(),
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            IncomingMessage::Live(message) => message.caption.as_deref(),
            IncomingMessage::Snapshot(snapshot) => snapshot.caption.as_deref(),
        }
    }

    /// Text for content checks: the body for text messages, the caption for
    /// media.
    pub fn content_text(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            IncomingMessage::Live(message) => classify(message),
            IncomingMessage::Snapshot(snapshot) => snapshot.media_kind,
        }
    }

    /// Best-available media reference: the file id used both as a dedup
    /// content proxy and to re-send snapshot media.
    pub fn media_ref(&self) -> Option<String> {
        match self {
            IncomingMessage::Live(message) => live_file_id(message),
            IncomingMessage::Snapshot(snapshot) => snapshot.file_id.clone(),
        }
    }

    pub fn reply_markup(&self) -> Option<InlineKeyboardMarkup> {
        match self {
            IncomingMessage::Live(message) => {
                message.reply_markup.as_ref().map(|markup| (**markup).clone())
            }
            IncomingMessage::Snapshot(snapshot) => {
                snapshot.inline_keyboard.as_ref().map(rebuild_keyboard)
            }
        }
    }

    pub fn has_forward_provenance(&self) -> bool {
        match self {
            IncomingMessage::Live(message) => message.forward_origin.is_some(),
            IncomingMessage::Snapshot(_) => false,
        }
    }

    pub fn reply_to_message_id(&self) -> Option<i32> {
        match self {
            IncomingMessage::Live(message) => {
                message.reply_to_message.as_ref().map(|m| m.message_id)
            }
            IncomingMessage::Snapshot(_) => None,
        }
    }

    pub fn source_title(&self) -> Option<String> {
        match self {
            IncomingMessage::Live(message) => {
                let chat = &message.chat;

                chat.title
                    .clone()
                    .or_else(|| chat.username.as_ref().map(|name| format!("@{name}")))
                    .or_else(|| chat.first_name.clone())
            }
            IncomingMessage::Snapshot(snapshot) => snapshot.source_title.clone(),
        }
    }

    pub fn snapshot(&self) -> MessageSnapshot {
        match self {
            IncomingMessage::Snapshot(snapshot) => snapshot.clone(),
            IncomingMessage::Live(message) => MessageSnapshot {
                chat_id: message.chat.id,
                message_id: message.message_id,
                text: message.text.clone(),
                caption: message.caption.clone(),
                media_kind: classify(message),
                file_id: live_file_id(message),
                inline_keyboard: message
                    .reply_markup
                    .as_ref()
                    .map(|markup| snapshot_keyboard(markup)),
                source_title: self.source_title(),
            },
        }
    }
}

fn classify(message: &Message) -> MediaKind {
    if message.photo.is_some() {
        MediaKind::Photo
    } else if message.video.is_some() {
        MediaKind::Video
    } else if message.document.is_some() {
        MediaKind::Document
    } else if message.audio.is_some() {
        MediaKind::Audio
    } else if message.voice.is_some() {
        MediaKind::Voice
    } else if message.video_note.is_some() {
        MediaKind::VideoNote
    } else if message.sticker.is_some() {
        MediaKind::Sticker
    } else if message.animation.is_some() {
        MediaKind::Animation
    } else if message.contact.is_some() {
        MediaKind::Contact
    } else if message.location.is_some() {
        MediaKind::Location
    } else if message.venue.is_some() {
        MediaKind::Venue
    } else if message.poll.is_some() {
        MediaKind::Poll
    } else if message.dice.is_some() {
        MediaKind::Dice
    } else {
        MediaKind::Text
    }
}

fn live_file_id(message: &Message) -> Option<String> {
    if let Some(photos) = &message.photo {
        // highest resolution variant
        return photos.last().map(|photo| photo.file_id.clone());
    }

    if let Some(video) = &message.video {
        return Some(video.file_id.clone());
    }

    if let Some(document) = &message.document {
        return Some(document.file_id.clone());
    }

    if let Some(audio) = &message.audio {
        return Some(audio.file_id.clone());
    }

    if let Some(voice) = &message.voice {
        return Some(voice.file_id.clone());
    }

    if let Some(video_note) = &message.video_note {
        return Some(video_note.file_id.clone());
    }

    if let Some(sticker) = &message.sticker {
        return Some(sticker.file_id.clone());
    }

    if let Some(animation) = &message.animation {
        return Some(animation.file_id.clone());
    }

    None
}

fn snapshot_keyboard(markup: &InlineKeyboardMarkup) -> Vec<Vec<SnapshotButton>> {
    markup
        .inline_keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| SnapshotButton {
                    text: button.text.clone(),
                    url: button.url.clone(),
                    callback_data: button.callback_data.clone(),
                })
                .collect()
        })
        .collect()
}

fn rebuild_keyboard(rows: &Vec<Vec<SnapshotButton>>) -> InlineKeyboardMarkup {
    let keyboard = rows
        .iter()
        .map(|row| {
            row.iter()
                .filter(|button| button.url.is_some() || button.callback_data.is_some())
                .map(|button| {
                    let mut rebuilt = InlineKeyboardButton::builder()
                        .text(button.text.clone())
                        .build();

                    rebuilt.url = button.url.clone();
                    rebuilt.callback_data = button.callback_data.clone();

                    rebuilt
                })
                .collect::<Vec<InlineKeyboardButton>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    InlineKeyboardMarkup {
        inline_keyboard: keyboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_message(text: Option<&str>, caption: Option<&str>) -> IncomingMessage {
        IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id: 7,
            text: text.map(str::to_string),
            caption: caption.map(str::to_string),
            media_kind: if text.is_some() {
                MediaKind::Text
            } else {
                MediaKind::Photo
            },
            file_id: caption.map(|_| "file-1".to_string()),
            inline_keyboard: None,
            source_title: Some("News".to_string()),
        })
    }

    #[test]
    fn content_text_prefers_text_over_caption() {
        let message = snapshot_message(Some("body"), None);
        assert_eq!(message.content_text(), Some("body"));

        let message = snapshot_message(None, Some("caption"));
        assert_eq!(message.content_text(), Some("caption"));
    }

    #[test]
    fn rebuilt_keyboard_drops_buttons_without_action() {
        let rows = vec![vec![
            SnapshotButton {
                text: "open".to_string(),
                url: Some("https://example.com".to_string()),
                callback_data: None,
            },
            SnapshotButton {
                text: "dead".to_string(),
                url: None,
                callback_data: None,
            },
        ]];

        let markup = rebuild_keyboard(&rows);

        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "open");
    }
}
