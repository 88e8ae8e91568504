use crate::schema::sending_stats;
use chrono::NaiveDate;
use diesel::prelude::*;

#[derive(Queryable, Identifiable, Debug, Clone, Eq, PartialEq)]
#[diesel(table_name = sending_stats)]
pub struct SendingStat {
    pub id: i64,
    pub task_id: i64,
    pub day: NaiveDate,
    pub hour: i32,
    pub minute: i32,
    pub message_count: i32,
}
