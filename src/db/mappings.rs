use crate::models::MessageMapping;
use crate::schema::message_mappings;
use diesel::prelude::*;
use diesel::result::Error;
use serde_json::{Map, Value};

pub fn find(
    conn: &mut PgConnection,
    task_id: i64,
    source_chat_id: i64,
    source_message_id: i32,
) -> Option<MessageMapping> {
    message_mappings::table
        .filter(message_mappings::task_id.eq(task_id))
        .filter(message_mappings::source_chat_id.eq(source_chat_id))
        .filter(message_mappings::source_message_id.eq(source_message_id))
        .order(message_mappings::created_at.desc())
        .first::<MessageMapping>(conn)
        .ok()
}

/// Records one (target chat, forwarded message) pair, appending to the
/// existing mapping row rather than replacing it so earlier targets survive.
pub fn append_target(
    conn: &mut PgConnection,
    task_id: i64,
    source_chat_id: i64,
    source_message_id: i32,
    target_chat_id: i64,
    forwarded_message_id: i32,
) -> Result<MessageMapping, Error> {
    let mut pair = Map::new();
    pair.insert(
        target_chat_id.to_string(),
        Value::from(forwarded_message_id),
    );
    let entry = Value::Object(pair);

    match find(conn, task_id, source_chat_id, source_message_id) {
        Some(mapping) => {
            let mut list = match mapping.target_message_ids.clone() {
                Value::Array(list) => list,
                _ => Vec::new(),
            };
            list.push(entry);

            diesel::update(message_mappings::table.find(mapping.id))
                .set(message_mappings::target_message_ids.eq(Value::Array(list)))
                .get_result::<MessageMapping>(conn)
        }

        None => diesel::insert_into(message_mappings::table)
            .values((
                message_mappings::task_id.eq(task_id),
                message_mappings::source_chat_id.eq(source_chat_id),
                message_mappings::source_message_id.eq(source_message_id),
                message_mappings::target_message_ids.eq(Value::Array(vec![entry])),
            ))
            .get_result::<MessageMapping>(conn),
    }
}

/// Resolves the forwarded counterpart of a source message in one target chat,
/// used for reply preservation and edit propagation.
pub fn find_forwarded_message_id(
    conn: &mut PgConnection,
    task_id: i64,
    source_chat_id: i64,
    source_message_id: i32,
    target_chat_id: i64,
) -> Option<i32> {
    find(conn, task_id, source_chat_id, source_message_id)
        .and_then(|mapping| mapping.forwarded_message_id(target_chat_id))
}
