use crate::config::Config;
use crate::db;
use crate::db::{duplicates, logs, sending_stats};
use chrono::FixedOffset;
use fang::typetag;
use fang::FangError;
use fang::Queueable;
use fang::Runnable;
use fang::Scheduled;
use serde::{Deserialize, Serialize};

/// Cron-scheduled retention pass over the append-only tables: forwarding
/// logs, duplicate records and sending counters. Runs independently of
/// message processing.
#[derive(Serialize, Deserialize)]
pub struct CleanJob {}

impl Default for CleanJob {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanJob {
    pub fn new() -> Self {
        CleanJob {}
    }
}

#[typetag::serde]
impl Runnable for CleanJob {
    fn run(&self, _queue: &dyn Queueable) -> Result<(), FangError> {
        let mut connection = db::pool().get()?;

        log::info!("Started pruning aged rows");

        match logs::delete_older_than(&mut connection, Config::log_retention_days()) {
            Ok(count) => log::info!("Removed {count} old forwarding logs"),
            Err(error) => {
                let description = format!("{error:?}");
                return Err(FangError { description });
            }
        }

        match duplicates::delete_stale(&mut connection, Config::dedup_retention_days()) {
            Ok(count) => log::info!("Removed {count} stale duplicate records"),
            Err(error) => {
                let description = format!("{error:?}");
                return Err(FangError { description });
            }
        }

        let now = db::current_time().with_timezone(&FixedOffset::east_opt(0).unwrap());

        match sending_stats::delete_older_than(&mut connection, now, Config::log_retention_days()) {
            Ok(count) => log::info!("Removed {count} aged sending counters"),
            Err(error) => {
                let description = format!("{error:?}");
                return Err(FangError { description });
            }
        }

        Ok(())
    }

    fn cron(&self) -> Option<Scheduled> {
        Some(Scheduled::CronPattern(Config::clean_cron_pattern()))
    }

    fn uniq(&self) -> bool {
        true
    }

    fn task_type(&self) -> String {
        super::JOB_TYPE.to_string()
    }
}
