use crate::db::duplicates;
use crate::settings::DedupSignature;
use crate::telegram::IncomingMessage;
use diesel::result::Error;
use diesel::PgConnection;
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

const TRACKER_LIMIT: usize = 10_000;
const TRACKER_TRIM: usize = 5_000;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DedupOutcome {
    pub is_duplicate: bool,
    pub times_seen: i32,
}

/// Duplicate detection with two layers: a bounded in-memory replay guard over
/// raw (task, chat, message) identities, and the persisted content-signature
/// records consulted by the duplicate filter stage.
pub struct Deduplicator {
    tracker: Mutex<ReplayTracker>,
}

struct ReplayTracker {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            tracker: Mutex::new(ReplayTracker {
                seen: HashSet::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// True when the exact message was already admitted to the pipeline,
    /// which absorbs gateway update replays.
    pub fn seen_before(&self, task_id: i64, chat_id: i64, message_id: i32) -> bool {
        let key = format!("{task_id}_{chat_id}_{message_id}");
        let mut tracker = self.tracker.lock().unwrap();

        if tracker.seen.contains(&key) {
            return true;
        }

        tracker.seen.insert(key.clone());
        tracker.order.push_back(key);

        if tracker.seen.len() > TRACKER_LIMIT {
            while tracker.seen.len() > TRACKER_TRIM {
                if let Some(oldest) = tracker.order.pop_front() {
                    tracker.seen.remove(&oldest);
                } else {
                    break;
                }
            }
        }

        false
    }

    /// Evaluates the persisted content signature. The first evaluation
    /// inserts a record with `times_seen = 1` and reports no duplicate; any
    /// later one bumps the counter and reports a hit.
    pub fn evaluate(
        &self,
        conn: &mut PgConnection,
        task_id: i64,
        message: &IncomingMessage,
        mode: DedupSignature,
    ) -> Result<DedupOutcome, Error> {
        let Some(signature) = content_signature(message, mode) else {
            // nothing to fingerprint
            return Ok(DedupOutcome {
                is_duplicate: false,
                times_seen: 0,
            });
        };

        let record = duplicates::record_seen(conn, task_id, &signature)?;

        Ok(DedupOutcome {
            is_duplicate: record.times_seen > 1,
            times_seen: record.times_seen,
        })
    }

    pub fn tracker_size(&self) -> usize {
        self.tracker.lock().unwrap().seen.len()
    }

    pub fn evict(&self) {
        let mut tracker = self.tracker.lock().unwrap();

        if tracker.seen.len() > TRACKER_TRIM {
            while tracker.seen.len() > TRACKER_TRIM {
                if let Some(oldest) = tracker.order.pop_front() {
                    tracker.seen.remove(&oldest);
                } else {
                    break;
                }
            }
        }
    }
}

/// SHA-256 over the best-available content proxy; `ContentAndId` folds the
/// source message id in, `ContentOnly` enables true content dedup.
pub fn content_signature(message: &IncomingMessage, mode: DedupSignature) -> Option<String> {
    let content = message
        .content_text()
        .map(str::to_string)
        .or_else(|| message.media_ref())?;

    let input = match mode {
        DedupSignature::ContentAndId => format!("{content}_{}", message.message_id()),
        DedupSignature::ContentOnly => content,
    };

    Some(format!("{:x}", Sha256::digest(input.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::incoming::{MediaKind, MessageSnapshot};

    fn text_message(message_id: i32, text: &str) -> IncomingMessage {
        IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id,
            text: Some(text.to_string()),
            caption: None,
            media_kind: MediaKind::Text,
            file_id: None,
            inline_keyboard: None,
            source_title: None,
        })
    }

    #[test]
    fn replay_guard_flags_second_sighting() {
        let dedup = Deduplicator::new();

        assert!(!dedup.seen_before(1, -1001, 42));
        assert!(dedup.seen_before(1, -1001, 42));
        assert!(!dedup.seen_before(1, -1001, 43));
    }

    #[test]
    fn id_inclusive_signatures_never_collide_across_messages() {
        let first = text_message(1, "same content");
        let second = text_message(2, "same content");

        let a = content_signature(&first, DedupSignature::ContentAndId).unwrap();
        let b = content_signature(&second, DedupSignature::ContentAndId).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn content_only_signatures_collide_for_equal_content() {
        let first = text_message(1, "same content");
        let second = text_message(2, "same content");

        let a = content_signature(&first, DedupSignature::ContentOnly).unwrap();
        let b = content_signature(&second, DedupSignature::ContentOnly).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn messages_without_content_are_not_fingerprinted() {
        let message = IncomingMessage::Snapshot(MessageSnapshot {
            chat_id: -1001,
            message_id: 9,
            text: None,
            caption: None,
            media_kind: MediaKind::Dice,
            file_id: None,
            inline_keyboard: None,
            source_title: None,
        });

        assert!(content_signature(&message, DedupSignature::ContentAndId).is_none());
    }
}
