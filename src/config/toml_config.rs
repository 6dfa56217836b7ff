use crate::config::{MessagingSettings, StatusSettings};
use crate::domain::ports::SendOptions;
use crate::utils::error::{CourierError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub messaging: Option<MessagingConfig>,
    pub status: Option<StatusConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    /// Chat the bot forwards into when it needs to read a message by id.
    pub probe_chat_id: Option<i64>,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    pub retry_factor: Option<f64>,
    pub max_rate_limit_retries: Option<u32>,
    pub auto_delete_seconds: Option<u64>,
    pub disable_web_page_preview: Option<bool>,
    pub disable_notification: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    pub update_interval_seconds: Option<u64>,
    pub min_refresh_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

impl BotConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CourierError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CourierError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn api_base_url(&self) -> &str {
        self.telegram
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.request_timeout_seconds.unwrap_or(30))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.telegram
            .download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("tg-courier"))
    }

    pub fn messaging_settings(&self) -> MessagingSettings {
        let defaults = MessagingSettings::default();
        let Some(messaging) = &self.messaging else {
            return defaults;
        };

        MessagingSettings {
            retry_factor: messaging.retry_factor.unwrap_or(defaults.retry_factor),
            max_rate_limit_retries: messaging.max_rate_limit_retries,
            auto_delete_delay: messaging
                .auto_delete_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.auto_delete_delay),
            send_options: SendOptions {
                disable_web_page_preview: messaging
                    .disable_web_page_preview
                    .unwrap_or(defaults.send_options.disable_web_page_preview),
                disable_notification: messaging
                    .disable_notification
                    .unwrap_or(defaults.send_options.disable_notification),
            },
        }
    }

    pub fn status_settings(&self) -> StatusSettings {
        let defaults = StatusSettings::default();
        let Some(status) = &self.status else {
            return defaults;
        };

        StatusSettings {
            update_interval: status
                .update_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.update_interval),
            min_refresh: status
                .min_refresh_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.min_refresh),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_bot_token("telegram.bot_token", &self.telegram.bot_token)?;
        validation::validate_url("telegram.api_base_url", self.api_base_url())?;

        if let Some(timeout) = self.telegram.request_timeout_seconds {
            validation::validate_range("telegram.request_timeout_seconds", timeout, 1, 600)?;
        }

        if let Some(messaging) = &self.messaging {
            if let Some(factor) = messaging.retry_factor {
                validation::validate_range("messaging.retry_factor", factor, 1.0, 10.0)?;
            }
        }

        let status = self.status_settings();
        if status.update_interval.is_zero() {
            return Err(CourierError::InvalidConfigValueError {
                field: "status.update_interval_seconds".to_string(),
                value: "0".to_string(),
                reason: "Interval must be at least one second".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
