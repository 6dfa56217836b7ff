//! Bot API JSON shapes.

use crate::domain::model::Message;
use crate::utils::error::{ApiFailure, CourierError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i32>,
    pub description: Option<String>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
    pub migrate_to_chat_id: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Unwraps `result`, or turns an `ok: false` envelope into a platform failure.
    pub fn into_result(self, status: u16) -> Result<T> {
        if !self.ok {
            let parameters = self.parameters;
            let mut failure = ApiFailure::new(
                self.error_code.unwrap_or(i32::from(status)),
                self.description.unwrap_or_else(|| "Unknown error".to_string()),
            );
            failure.retry_after = parameters.as_ref().and_then(|p| p.retry_after);
            if let Some(chat_id) = parameters.and_then(|p| p.migrate_to_chat_id) {
                failure.description = format!("{} (migrated to {})", failure.description, chat_id);
            }
            return Err(CourierError::Telegram(failure));
        }

        self.result.ok_or_else(|| CourierError::ResponseError {
            message: "Telegram returned ok but no result".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TgFileRef {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    pub message_thread_id: Option<i64>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub document: Option<TgFileRef>,
    pub video: Option<TgFileRef>,
    pub audio: Option<TgFileRef>,
    pub voice: Option<TgFileRef>,
    pub animation: Option<TgFileRef>,
    /// Sizes ascend; the last one is the original.
    #[serde(default)]
    pub photo: Vec<TgFileRef>,
    pub forward_origin: Option<TgForwardOrigin>,
}

/// Present on forwarded messages; `chat` is set for channel posts.
#[derive(Debug, Deserialize)]
pub struct TgForwardOrigin {
    pub chat: Option<TgChat>,
    pub message_id: Option<i64>,
}

impl From<TgMessage> for Message {
    fn from(msg: TgMessage) -> Self {
        let file_id = msg
            .document
            .or(msg.video)
            .or(msg.audio)
            .or(msg.voice)
            .or(msg.animation)
            .or_else(|| msg.photo.into_iter().last())
            .map(|f| f.file_id);

        Message {
            chat_id: msg.chat.id,
            id: msg.message_id,
            thread_id: msg.message_thread_id,
            text: msg.text.or(msg.caption),
            file_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TgFile {
    pub file_id: String,
    pub file_path: Option<String>,
}
