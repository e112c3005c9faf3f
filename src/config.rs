use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Config {
    /// How many days into the future a transaction may be dated.
    pub future_dating_allowance_days: i64,
    /// Wait budget for a per-aggregate lock before returning Busy.
    pub lock_wait_ms: u64,
    /// Tick period of the recurrence/reminder scheduler loop.
    pub scheduler_interval_secs: u64,
    /// How many transactions the dashboard lists as "recent".
    pub recent_transactions_limit: usize,
    /// Minutes ahead of the due time a reminder becomes notifiable.
    pub reminder_lookahead_mins: i64,
    pub log_level: String,
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
            env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }

        Self {
            future_dating_allowance_days: parsed("FUTURE_DATING_ALLOWANCE_DAYS", 7),
            lock_wait_ms: parsed("LOCK_WAIT_MS", 500),
            scheduler_interval_secs: parsed("SCHEDULER_INTERVAL_SECS", 60),
            recent_transactions_limit: parsed("RECENT_TRANSACTIONS_LIMIT", 10),
            reminder_lookahead_mins: parsed("REMINDER_LOOKAHEAD_MINS", 60),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
