pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::BotApiClient;
pub use config::{BotConfig, MessagingSettings, StatusSettings};
pub use crate::core::link::{parse_tg_link, LinkTarget, ParsedLink, ResolvedLink};
pub use crate::core::{messenger::Messenger, status::StatusBoard};
pub use utils::error::{ApiFailure, CourierError, Result};
