#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::SendOptions;
use std::time::Duration;

pub use toml_config::BotConfig;

/// Runtime knobs for [`Messenger`](crate::Messenger).
#[derive(Debug, Clone, PartialEq)]
pub struct MessagingSettings {
    /// Multiplier applied to the platform's `retry_after` before sleeping.
    pub retry_factor: f64,
    /// `None` keeps retrying for as long as the platform rate limits.
    pub max_rate_limit_retries: Option<u32>,
    pub auto_delete_delay: Duration,
    pub send_options: SendOptions,
}

impl Default for MessagingSettings {
    fn default() -> Self {
        Self {
            retry_factor: 1.2,
            max_rate_limit_retries: None,
            auto_delete_delay: Duration::from_secs(60),
            send_options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSettings {
    pub update_interval: Duration,
    /// Non-forced refreshes closer together than this are skipped.
    pub min_refresh: Duration,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(15),
            min_refresh: Duration::from_secs(3),
        }
    }
}
