use crate::db;
use crate::models::ForwardingLog;
use crate::schema::forwarding_logs;
use chrono::Duration;
use diesel::prelude::*;
use diesel::result::Error;

#[derive(Insertable, Clone)]
#[diesel(table_name = forwarding_logs)]
pub struct NewForwardingLog {
    pub task_id: i64,
    pub source_chat_id: i64,
    pub target_chat_id: i64,
    pub source_message_id: i32,
    pub forwarded_message_id: Option<i32>,
    pub status: String,
    pub error_message: Option<String>,
}

pub fn create(conn: &mut PgConnection, new_log: NewForwardingLog) -> Result<ForwardingLog, Error> {
    diesel::insert_into(forwarding_logs::table)
        .values(new_log)
        .get_result::<ForwardingLog>(conn)
}

pub fn fetch_for_message(
    conn: &mut PgConnection,
    task_id: i64,
    source_message_id: i32,
) -> Result<Vec<ForwardingLog>, Error> {
    forwarding_logs::table
        .filter(forwarding_logs::task_id.eq(task_id))
        .filter(forwarding_logs::source_message_id.eq(source_message_id))
        .order(forwarding_logs::id)
        .get_results(conn)
}

pub fn delete_older_than(conn: &mut PgConnection, days: i64) -> Result<usize, Error> {
    let cutoff = db::current_time() - Duration::days(days);

    diesel::delete(forwarding_logs::table.filter(forwarding_logs::created_at.lt(cutoff)))
        .execute(conn)
}
