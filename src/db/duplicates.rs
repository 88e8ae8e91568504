use crate::db;
use crate::models::DuplicateRecord;
use crate::schema::duplicate_records;
use chrono::Duration;
use diesel::prelude::*;
use diesel::result::Error;

/// Upserts the signature and reports whether it had been seen before. A hit
/// bumps `times_seen` and `last_seen`; a miss inserts a fresh record.
pub fn record_seen(
    conn: &mut PgConnection,
    task_id: i64,
    content_hash: &str,
) -> Result<DuplicateRecord, Error> {
    let now = db::current_time();

    diesel::insert_into(duplicate_records::table)
        .values((
            duplicate_records::task_id.eq(task_id),
            duplicate_records::content_hash.eq(content_hash),
            duplicate_records::times_seen.eq(1),
            duplicate_records::first_seen.eq(now),
            duplicate_records::last_seen.eq(now),
        ))
        .on_conflict((duplicate_records::task_id, duplicate_records::content_hash))
        .do_update()
        .set((
            duplicate_records::times_seen.eq(duplicate_records::times_seen + 1),
            duplicate_records::last_seen.eq(now),
        ))
        .get_result::<DuplicateRecord>(conn)
}

pub fn delete_stale(conn: &mut PgConnection, days: i64) -> Result<usize, Error> {
    let cutoff = db::current_time() - Duration::days(days);

    diesel::delete(duplicate_records::table.filter(duplicate_records::last_seen.lt(cutoff)))
        .execute(conn)
}
