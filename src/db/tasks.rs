use crate::db;
use crate::models::task::TASK_TYPE_BOT;
use crate::models::{Source, Target, Task, TaskSettings};
use crate::schema::{sources, targets, task_settings, tasks};
use diesel::prelude::*;
use diesel::result::Error;

#[derive(Insertable, Clone)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub user_id: i64,
    pub name: String,
    pub task_type: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = sources)]
pub struct NewSource {
    pub task_id: i64,
    pub chat_id: i64,
    pub name: Option<String>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = targets)]
pub struct NewTarget {
    pub task_id: i64,
    pub chat_id: i64,
    pub name: Option<String>,
}

pub fn create(conn: &mut PgConnection, new_task: NewTask) -> Result<Task, Error> {
    diesel::insert_into(tasks::table)
        .values(new_task)
        .get_result::<Task>(conn)
}

pub fn find(conn: &mut PgConnection, id: i64) -> Option<Task> {
    tasks::table.find(id).first::<Task>(conn).ok()
}

pub fn fetch_active_tasks(conn: &mut PgConnection) -> Result<Vec<Task>, Error> {
    tasks::table
        .filter(tasks::is_active.eq(true))
        .order(tasks::id)
        .get_results(conn)
}

pub fn set_active(conn: &mut PgConnection, id: i64, active: bool) -> Result<usize, Error> {
    diesel::update(tasks::table.find(id))
        .set((
            tasks::is_active.eq(active),
            tasks::updated_at.eq(db::current_time()),
        ))
        .execute(conn)
}

/// Persists the automatic userbot -> bot downgrade.
pub fn downgrade_to_bot(conn: &mut PgConnection, id: i64) -> Result<usize, Error> {
    diesel::update(tasks::table.find(id))
        .set((
            tasks::task_type.eq(TASK_TYPE_BOT),
            tasks::updated_at.eq(db::current_time()),
        ))
        .execute(conn)
}

pub fn remove(conn: &mut PgConnection, id: i64) -> Result<usize, Error> {
    diesel::delete(tasks::table.find(id)).execute(conn)
}

pub fn add_source(conn: &mut PgConnection, new_source: NewSource) -> Result<Source, Error> {
    diesel::insert_into(sources::table)
        .values(new_source)
        .get_result::<Source>(conn)
}

pub fn add_target(conn: &mut PgConnection, new_target: NewTarget) -> Result<Target, Error> {
    diesel::insert_into(targets::table)
        .values(new_target)
        .get_result::<Target>(conn)
}

pub fn fetch_active_sources(conn: &mut PgConnection, task_id: i64) -> Result<Vec<Source>, Error> {
    sources::table
        .filter(sources::task_id.eq(task_id))
        .filter(sources::is_active.eq(true))
        .order(sources::id)
        .get_results(conn)
}

pub fn fetch_active_targets(conn: &mut PgConnection, task_id: i64) -> Result<Vec<Target>, Error> {
    targets::table
        .filter(targets::task_id.eq(task_id))
        .filter(targets::is_active.eq(true))
        .order(targets::id)
        .get_results(conn)
}

pub fn find_source_by_chat(conn: &mut PgConnection, task_id: i64, chat_id: i64) -> Option<Source> {
    sources::table
        .filter(sources::task_id.eq(task_id))
        .filter(sources::chat_id.eq(chat_id))
        .first::<Source>(conn)
        .ok()
}

pub fn find_settings(conn: &mut PgConnection, task_id: i64) -> Option<TaskSettings> {
    task_settings::table
        .filter(task_settings::task_id.eq(task_id))
        .first::<TaskSettings>(conn)
        .ok()
}

/// Creates the settings row with every toggle at its documented default.
pub fn create_default_settings(
    conn: &mut PgConnection,
    task_id: i64,
) -> Result<TaskSettings, Error> {
    diesel::insert_into(task_settings::table)
        .values(task_settings::task_id.eq(task_id))
        .get_result::<TaskSettings>(conn)
}
