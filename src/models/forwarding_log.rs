use crate::schema::forwarding_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Terminal outcome of one forwarding attempt. Every processed message ends
/// in exactly one of these per log row.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogStatus {
    Success,
    Failed,
    Filtered,
    Duplicate,
    PendingApproval,
    WorkingHours,
    DayFilter,
    SendingLimit,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Failed => "failed",
            LogStatus::Filtered => "filtered",
            LogStatus::Duplicate => "duplicate",
            LogStatus::PendingApproval => "pending_approval",
            LogStatus::WorkingHours => "working_hours",
            LogStatus::DayFilter => "day_filter",
            LogStatus::SendingLimit => "sending_limit",
        }
    }
}

#[derive(Queryable, Identifiable, Debug, Clone, Eq, PartialEq)]
#[diesel(table_name = forwarding_logs)]
pub struct ForwardingLog {
    pub id: i64,
    pub task_id: i64,
    pub source_chat_id: i64,
    pub target_chat_id: i64,
    pub source_message_id: i32,
    pub forwarded_message_id: Option<i32>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
