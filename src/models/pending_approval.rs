use crate::schema::pending_approvals;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

pub const APPROVAL_PENDING: &str = "pending";
pub const APPROVAL_APPROVED: &str = "approved";
pub const APPROVAL_REJECTED: &str = "rejected";

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = pending_approvals)]
pub struct PendingApproval {
    pub id: i64,
    pub task_id: i64,
    pub source_chat_id: i64,
    pub source_message_id: i32,
    pub message_data: Value,
    pub status: String,
    pub approved_by: Option<i64>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PendingApproval {
    pub fn is_pending(&self) -> bool {
        self.status == APPROVAL_PENDING
    }
}
