use crate::schema::message_mappings;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Correspondence between one source message and the messages it produced in
/// each target chat. `target_message_ids` is an ordered JSON list of
/// `{"<target_chat_id>": <forwarded_message_id>}` objects, appended to as more
/// targets succeed.
#[derive(Queryable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = message_mappings)]
pub struct MessageMapping {
    pub id: i64,
    pub task_id: i64,
    pub source_chat_id: i64,
    pub source_message_id: i32,
    pub target_message_ids: Value,
    pub created_at: DateTime<Utc>,
}

impl MessageMapping {
    /// The forwarded message id recorded for the given target chat, if any.
    pub fn forwarded_message_id(&self, target_chat_id: i64) -> Option<i32> {
        let list = self.target_message_ids.as_array()?;
        let key = target_chat_id.to_string();

        for entry in list {
            if let Some(id) = entry.get(&key).and_then(Value::as_i64) {
                return Some(id as i32);
            }
        }

        None
    }
}
