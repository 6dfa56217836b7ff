use crate::domain::model::{
    ChatRef, InlineKeyboard, InputContent, InputFile, Message, RenderedStatus,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Options shared by outgoing text messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub disable_web_page_preview: bool,
    pub disable_notification: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            disable_web_page_preview: true,
            disable_notification: true,
        }
    }
}

/// Where an outgoing message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub chat: ChatRef,
    pub thread_id: Option<i64>,
    pub reply_to: Option<i64>,
}

impl Destination {
    pub fn reply_to(message: &Message) -> Self {
        Self {
            chat: ChatRef::Id(message.chat_id),
            thread_id: message.thread_id,
            reply_to: Some(message.id),
        }
    }

    pub fn chat(chat_id: i64, thread_id: Option<i64>) -> Self {
        Self {
            chat: ChatRef::Id(chat_id),
            thread_id,
            reply_to: None,
        }
    }
}

/// One authenticated client session on the messaging platform.
///
/// Platform rejections surface as [`CourierError::Telegram`](crate::CourierError::Telegram);
/// a rate-limited call carries `retry_after`.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_text(
        &self,
        to: &Destination,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        options: SendOptions,
    ) -> Result<Message>;

    async fn edit_text(
        &self,
        message: &Message,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        options: SendOptions,
    ) -> Result<Message>;

    async fn delete_message(&self, message: &Message) -> Result<()>;

    async fn send_document(
        &self,
        to: &Destination,
        file: &InputFile,
        caption: &str,
        options: SendOptions,
    ) -> Result<Message>;

    async fn send_content(
        &self,
        to: &Destination,
        content: &InputContent,
        options: SendOptions,
    ) -> Result<Message>;

    async fn send_album(
        &self,
        to: &Destination,
        contents: &[InputContent],
        options: SendOptions,
    ) -> Result<Vec<Message>>;

    async fn get_message(&self, chat: &ChatRef, message_id: i64) -> Result<Message>;

    /// Downloads the file attached to `message` and returns its local path.
    async fn download(&self, message: &Message) -> Result<PathBuf>;
}

/// Renders the text of a status message. Returns `None` when there is nothing
/// left to report for `sid`.
#[async_trait]
pub trait StatusRenderer: Send + Sync {
    async fn render(
        &self,
        sid: i64,
        is_user: bool,
        page_no: u32,
        status: &str,
        page_step: u32,
    ) -> Option<RenderedStatus>;
}
