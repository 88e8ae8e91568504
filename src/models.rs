pub mod duplicate_record;
pub mod forwarding_log;
pub mod message_mapping;
pub mod pending_approval;
pub mod sending_stat;
pub mod source;
pub mod target;
pub mod task;
pub mod task_settings;

pub use duplicate_record::DuplicateRecord;
pub use forwarding_log::ForwardingLog;
pub use message_mapping::MessageMapping;
pub use pending_approval::PendingApproval;
pub use sending_stat::SendingStat;
pub use source::Source;
pub use target::Target;
pub use task::Task;
pub use task_settings::TaskSettings;
