use std::env;
use std::str::FromStr;

pub struct Config {}

impl Config {
    pub fn database_url() -> String {
        Self::read_var("DATABASE_URL")
    }

    pub fn telegram_bot_token() -> String {
        Self::read_var("TELEGRAM_BOT_TOKEN")
    }

    pub fn telegram_base_url() -> String {
        Self::read_var_with_default("TELEGRAM_BASE_URL", "https://api.telegram.org/bot")
    }

    /// Base URL of the session-scoped gateway used for userbot tasks. When
    /// unset, every userbot task is downgraded to the bot backend at startup.
    pub fn userbot_base_url() -> Option<String> {
        env::var("USERBOT_BASE_URL").ok()
    }

    pub fn userbot_session_token() -> Option<String> {
        env::var("USERBOT_SESSION_TOKEN").ok()
    }

    pub fn translate_api_url() -> Option<String> {
        env::var("TRANSLATE_API_URL").ok()
    }

    pub fn owner_telegram_id() -> Option<i64> {
        Self::read_var_option("OWNER_TELEGRAM_ID")
    }

    pub fn db_pool_number() -> u32 {
        Self::read_var_with_default("DB_POOL_NUMBER", "10")
            .parse()
            .unwrap()
    }

    pub fn request_timeout_in_seconds() -> u64 {
        Self::read_var_with_default("REQUEST_TIMEOUT_IN_SECONDS", "10")
            .parse()
            .unwrap()
    }

    pub fn task_cache_ttl_seconds() -> u64 {
        Self::read_var_with_default("TASK_CACHE_TTL_SECONDS", "300")
            .parse()
            .unwrap()
    }

    pub fn monitor_queue_size() -> usize {
        Self::read_var_with_default("MONITOR_QUEUE_SIZE", "100")
            .parse()
            .unwrap()
    }

    pub fn log_retention_days() -> i64 {
        Self::read_var_with_default("LOG_RETENTION_DAYS", "7")
            .parse()
            .unwrap()
    }

    pub fn dedup_retention_days() -> i64 {
        Self::read_var_with_default("DEDUP_RETENTION_DAYS", "7")
            .parse()
            .unwrap()
    }

    pub fn clean_cron_pattern() -> String {
        Self::read_var_with_default("CLEAN_CRON_PATTERN", "0 0 * * * *")
    }

    pub fn clean_workers_number() -> u32 {
        Self::read_var_with_default("CLEAN_WORKERS_NUMBER", "2")
            .parse()
            .unwrap()
    }

    fn read_var_option<T: FromStr>(name: &str) -> Option<T> {
        let value = env::var(name).ok()?;

        match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => panic!("{name} can not be parsed"),
        }
    }

    fn read_var_with_default(name: &str, default_value: &str) -> String {
        env::var(name).unwrap_or_else(|_| default_value.to_string())
    }

    fn read_var(name: &str) -> String {
        env::var(name).unwrap_or_else(|_| panic!("{name} must be set"))
    }
}
