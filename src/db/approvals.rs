use crate::db;
use crate::models::pending_approval::{APPROVAL_PENDING, APPROVAL_REJECTED};
use crate::models::PendingApproval;
use crate::schema::pending_approvals;
use diesel::prelude::*;
use diesel::result::Error;
use serde_json::Value;

pub fn create(
    conn: &mut PgConnection,
    task_id: i64,
    source_chat_id: i64,
    source_message_id: i32,
    message_data: Value,
) -> Result<PendingApproval, Error> {
    diesel::insert_into(pending_approvals::table)
        .values((
            pending_approvals::task_id.eq(task_id),
            pending_approvals::source_chat_id.eq(source_chat_id),
            pending_approvals::source_message_id.eq(source_message_id),
            pending_approvals::message_data.eq(message_data),
            pending_approvals::status.eq(APPROVAL_PENDING),
        ))
        .get_result::<PendingApproval>(conn)
}

pub fn find(conn: &mut PgConnection, id: i64) -> Option<PendingApproval> {
    pending_approvals::table
        .find(id)
        .first::<PendingApproval>(conn)
        .ok()
}

/// Finalizes a pending approval. The `status = 'pending'` guard makes the
/// transition idempotent: a second decision matches zero rows.
pub fn decide(
    conn: &mut PgConnection,
    id: i64,
    approver_id: i64,
    new_status: &str,
) -> Result<usize, Error> {
    diesel::update(
        pending_approvals::table
            .find(id)
            .filter(pending_approvals::status.eq(APPROVAL_PENDING)),
    )
    .set((
        pending_approvals::status.eq(new_status),
        pending_approvals::approved_by.eq(approver_id),
        pending_approvals::decided_at.eq(db::current_time()),
    ))
    .execute(conn)
}

pub fn reject_pending_for_task(conn: &mut PgConnection, task_id: i64) -> Result<usize, Error> {
    diesel::update(
        pending_approvals::table
            .filter(pending_approvals::task_id.eq(task_id))
            .filter(pending_approvals::status.eq(APPROVAL_PENDING)),
    )
    .set((
        pending_approvals::status.eq(APPROVAL_REJECTED),
        pending_approvals::decided_at.eq(db::current_time()),
    ))
    .execute(conn)
}
