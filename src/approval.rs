use crate::db::approvals;
use crate::models::pending_approval::{APPROVAL_APPROVED, APPROVAL_REJECTED};
use crate::models::{PendingApproval, Task};
use crate::telegram::gateway::{ForwardSpec, GatewayError, MessagingGateway, SendTextSpec};
use crate::telegram::IncomingMessage;
use diesel::PgConnection;
use frankenstein::{InlineKeyboardButton, InlineKeyboardMarkup};

const APPROVE_PREFIX: &str = "approve_";
const REJECT_PREFIX: &str = "reject_";

const APPROVE_LABEL: &str = "✅ موافق - نشر";
const REJECT_LABEL: &str = "❌ رفض - إلغاء";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug)]
pub enum ApprovalError {
    NotFound,
    /// Decision on an already-finalized record; rejected with no side effect.
    AlreadyDecided,
    CorruptSnapshot(serde_json::Error),
    Storage(diesel::result::Error),
    Pool(String),
    Gateway(GatewayError),
}

impl From<diesel::result::Error> for ApprovalError {
    fn from(error: diesel::result::Error) -> Self {
        ApprovalError::Storage(error)
    }
}

/// Snapshots the message, persists it as `pending` and asks the task's
/// administrator to decide. The prompt failure is logged but does not undo
/// the stored approval: the record stays decidable from the management layer.
pub async fn submit(
    conn: &mut PgConnection,
    gateway: &dyn MessagingGateway,
    task: &Task,
    message: &IncomingMessage,
) -> Result<PendingApproval, ApprovalError> {
    let snapshot = message.snapshot();
    let message_data = serde_json::to_value(&snapshot).map_err(ApprovalError::CorruptSnapshot)?;

    let approval = approvals::create(
        conn,
        task.id,
        message.chat_id(),
        message.message_id(),
        message_data,
    )?;

    if let Err(error) = send_request(gateway, task, message, &approval).await {
        log::error!(
            "Failed to send the approval request for task {}: {}",
            task.id,
            error.description()
        );
    }

    Ok(approval)
}

/// Applies a terminal decision. The `pending` guard in the update makes a
/// second decision match zero rows, which surfaces as `AlreadyDecided`.
pub fn apply_decision(
    conn: &mut PgConnection,
    approval_id: i64,
    approver_id: i64,
    decision: Decision,
) -> Result<PendingApproval, ApprovalError> {
    let new_status = match decision {
        Decision::Approve => APPROVAL_APPROVED,
        Decision::Reject => APPROVAL_REJECTED,
    };

    let updated = approvals::decide(conn, approval_id, approver_id, new_status)?;

    if updated == 0 {
        return match approvals::find(conn, approval_id) {
            None => Err(ApprovalError::NotFound),
            Some(_) => Err(ApprovalError::AlreadyDecided),
        };
    }

    approvals::find(conn, approval_id).ok_or(ApprovalError::NotFound)
}

/// Parses `approve_<id>` / `reject_<id>` callback payloads.
pub fn parse_callback(data: &str) -> Option<(Decision, i64)> {
    if let Some(id) = data.strip_prefix(APPROVE_PREFIX) {
        return id.parse().ok().map(|id| (Decision::Approve, id));
    }

    if let Some(id) = data.strip_prefix(REJECT_PREFIX) {
        return id.parse().ok().map(|id| (Decision::Reject, id));
    }

    None
}

async fn send_request(
    gateway: &dyn MessagingGateway,
    task: &Task,
    message: &IncomingMessage,
    approval: &PendingApproval,
) -> Result<(), GatewayError> {
    // show the admin the original first, then the decision prompt
    if let IncomingMessage::Live(_) = message {
        let forward = ForwardSpec::builder()
            .chat_id(task.user_id)
            .from_chat_id(message.chat_id())
            .message_id(message.message_id())
            .build();

        if let Err(error) = gateway.forward_message(&forward).await {
            log::warn!(
                "Could not forward the original message for approval {}: {}",
                approval.id,
                error.description()
            );
        }
    }

    let source = message
        .source_title()
        .unwrap_or_else(|| "غير معروف".to_string());

    let prompt = format!(
        "📋 طلب موافقة على النشر\n\n🔢 رقم المهمة: {}\n📤 من القناة: {}\n\nهل تريد نشر هذه الرسالة إلى جميع القنوات الهدف؟",
        task.id, source
    );

    let spec = SendTextSpec::builder()
        .chat_id(task.user_id)
        .text(prompt)
        .reply_markup(Some(decision_keyboard(approval.id)))
        .build();

    gateway.send_text(&spec).await?;

    Ok(())
}

fn decision_keyboard(approval_id: i64) -> InlineKeyboardMarkup {
    let mut approve = InlineKeyboardButton::builder()
        .text(APPROVE_LABEL.to_string())
        .build();
    approve.callback_data = Some(format!("{APPROVE_PREFIX}{approval_id}"));

    let mut reject = InlineKeyboardButton::builder()
        .text(REJECT_LABEL.to_string())
        .build();
    reject.callback_data = Some(format!("{REJECT_PREFIX}{approval_id}"));

    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![approve, reject]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_approval_callbacks() {
        assert_eq!(parse_callback("approve_42"), Some((Decision::Approve, 42)));
        assert_eq!(parse_callback("reject_7"), Some((Decision::Reject, 7)));
        assert_eq!(parse_callback("approve_x"), None);
        assert_eq!(parse_callback("noise"), None);
    }

    #[test]
    fn decision_keyboard_carries_both_controls() {
        let keyboard = decision_keyboard(13);

        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
        assert_eq!(
            keyboard.inline_keyboard[0][0].callback_data.as_deref(),
            Some("approve_13")
        );
        assert_eq!(
            keyboard.inline_keyboard[0][1].callback_data.as_deref(),
            Some("reject_13")
        );
    }
}
