// Adapters layer: concrete platform sessions.

pub mod bot_api;
pub mod wire;

pub use bot_api::BotApiClient;
