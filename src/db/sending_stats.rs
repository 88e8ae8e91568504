use chrono::{DateTime, Duration, FixedOffset, Timelike};
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel::result::Error;

use crate::schema::sending_stats;

/// Counts only increment after successful forwards; blocked messages never
/// count against the limits.
pub fn increment(
    conn: &mut PgConnection,
    task_id: i64,
    now: DateTime<FixedOffset>,
) -> Result<usize, Error> {
    diesel::insert_into(sending_stats::table)
        .values((
            sending_stats::task_id.eq(task_id),
            sending_stats::day.eq(now.date_naive()),
            sending_stats::hour.eq(now.hour() as i32),
            sending_stats::minute.eq(now.minute() as i32),
            sending_stats::message_count.eq(1),
        ))
        .on_conflict((
            sending_stats::task_id,
            sending_stats::day,
            sending_stats::hour,
            sending_stats::minute,
        ))
        .do_update()
        .set(sending_stats::message_count.eq(sending_stats::message_count + 1))
        .execute(conn)
}

pub fn count_for_minute(
    conn: &mut PgConnection,
    task_id: i64,
    now: DateTime<FixedOffset>,
) -> Result<i64, Error> {
    let count: Option<i64> = sending_stats::table
        .filter(sending_stats::task_id.eq(task_id))
        .filter(sending_stats::day.eq(now.date_naive()))
        .filter(sending_stats::hour.eq(now.hour() as i32))
        .filter(sending_stats::minute.eq(now.minute() as i32))
        .select(sum(sending_stats::message_count))
        .first(conn)?;

    Ok(count.unwrap_or(0))
}

pub fn count_for_hour(
    conn: &mut PgConnection,
    task_id: i64,
    now: DateTime<FixedOffset>,
) -> Result<i64, Error> {
    let count: Option<i64> = sending_stats::table
        .filter(sending_stats::task_id.eq(task_id))
        .filter(sending_stats::day.eq(now.date_naive()))
        .filter(sending_stats::hour.eq(now.hour() as i32))
        .select(sum(sending_stats::message_count))
        .first(conn)?;

    Ok(count.unwrap_or(0))
}

pub fn count_for_day(
    conn: &mut PgConnection,
    task_id: i64,
    now: DateTime<FixedOffset>,
) -> Result<i64, Error> {
    let count: Option<i64> = sending_stats::table
        .filter(sending_stats::task_id.eq(task_id))
        .filter(sending_stats::day.eq(now.date_naive()))
        .select(sum(sending_stats::message_count))
        .first(conn)?;

    Ok(count.unwrap_or(0))
}

pub fn delete_older_than(
    conn: &mut PgConnection,
    now: DateTime<FixedOffset>,
    days: i64,
) -> Result<usize, Error> {
    let cutoff = (now - Duration::days(days)).date_naive();

    diesel::delete(sending_stats::table.filter(sending_stats::day.lt(cutoff))).execute(conn)
}
