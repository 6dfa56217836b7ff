pub mod link;
pub mod messenger;
pub mod status;

pub use crate::domain::model::{ChatRef, InlineKeyboard, InputContent, InputFile, Message, Session};
pub use crate::domain::ports::{ChatApi, StatusRenderer};
pub use crate::utils::error::Result;
