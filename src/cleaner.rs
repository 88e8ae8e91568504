pub mod clean_job;

pub use clean_job::CleanJob;

pub const JOB_TYPE: &str = "clean";
