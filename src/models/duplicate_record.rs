use crate::schema::duplicate_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Queryable, Identifiable, Debug, Clone, Eq, PartialEq)]
#[diesel(table_name = duplicate_records)]
pub struct DuplicateRecord {
    pub id: i64,
    pub task_id: i64,
    pub content_hash: String,
    pub times_seen: i32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}
