use crate::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub const TASK_TYPE_BOT: &str = "bot";
pub const TASK_TYPE_USERBOT: &str = "userbot";

#[derive(Queryable, Identifiable, Debug, Clone, Eq, PartialEq)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub task_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn uses_userbot(&self) -> bool {
        self.task_type == TASK_TYPE_USERBOT
    }
}
