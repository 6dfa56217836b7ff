use crate::domain::model::{
    ChatRef, InlineKeyboard, InputContent, InputFile, Message, RenderedStatus,
};
use crate::domain::ports::{ChatApi, Destination, SendOptions, StatusRenderer};
use crate::utils::error::{ApiFailure, CourierError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText {
        chat: ChatRef,
        thread_id: Option<i64>,
        reply_to: Option<i64>,
        text: String,
        with_buttons: bool,
    },
    EditText {
        chat_id: i64,
        id: i64,
        text: String,
    },
    Delete {
        chat_id: i64,
        id: i64,
    },
    SendDocument {
        chat_id: i64,
        caption: String,
    },
    SendContent {
        chat_id: i64,
    },
    SendAlbum {
        chat_id: i64,
        count: usize,
    },
    GetMessage {
        chat: ChatRef,
        id: i64,
    },
    Download {
        id: i64,
    },
}

/// In-memory session. Queued failures are handed out one per call, in order.
#[derive(Clone, Default)]
pub struct MockApi {
    calls: Arc<Mutex<Vec<Call>>>,
    failures: Arc<Mutex<VecDeque<ApiFailure>>>,
    stored: Arc<Mutex<HashMap<(ChatRef, i64), Message>>>,
    next_id: Arc<AtomicI64>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicI64::new(1000)),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, failure: ApiFailure) {
        self.failures.lock().unwrap().push_back(failure);
    }

    pub fn store(&self, chat: ChatRef, message: Message) {
        self.stored.lock().unwrap().insert((chat, message.id), message);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().pop_front() {
            Some(failure) => Err(CourierError::Telegram(failure)),
            None => Ok(()),
        }
    }

    fn new_message(&self, to: &Destination, text: Option<String>) -> Message {
        Message {
            chat_id: chat_id_of(to),
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            thread_id: to.thread_id,
            text,
            file_id: None,
        }
    }
}

fn chat_id_of(to: &Destination) -> i64 {
    match &to.chat {
        ChatRef::Id(id) => *id,
        ChatRef::Username(_) => 0,
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn send_text(
        &self,
        to: &Destination,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        _options: SendOptions,
    ) -> Result<Message> {
        self.record(Call::SendText {
            chat: to.chat.clone(),
            thread_id: to.thread_id,
            reply_to: to.reply_to,
            text: text.to_string(),
            with_buttons: buttons.is_some(),
        })?;
        Ok(self.new_message(to, Some(text.to_string())))
    }

    async fn edit_text(
        &self,
        message: &Message,
        text: &str,
        _buttons: Option<&InlineKeyboard>,
        _options: SendOptions,
    ) -> Result<Message> {
        self.record(Call::EditText {
            chat_id: message.chat_id,
            id: message.id,
            text: text.to_string(),
        })?;
        Ok(message.clone().with_text(text))
    }

    async fn delete_message(&self, message: &Message) -> Result<()> {
        self.record(Call::Delete {
            chat_id: message.chat_id,
            id: message.id,
        })
    }

    async fn send_document(
        &self,
        to: &Destination,
        _file: &InputFile,
        caption: &str,
        _options: SendOptions,
    ) -> Result<Message> {
        self.record(Call::SendDocument {
            chat_id: chat_id_of(to),
            caption: caption.to_string(),
        })?;
        Ok(self.new_message(to, Some(caption.to_string())))
    }

    async fn send_content(
        &self,
        to: &Destination,
        _content: &InputContent,
        _options: SendOptions,
    ) -> Result<Message> {
        self.record(Call::SendContent {
            chat_id: chat_id_of(to),
        })?;
        Ok(self.new_message(to, None))
    }

    async fn send_album(
        &self,
        to: &Destination,
        contents: &[InputContent],
        _options: SendOptions,
    ) -> Result<Vec<Message>> {
        self.record(Call::SendAlbum {
            chat_id: chat_id_of(to),
            count: contents.len(),
        })?;
        Ok(contents.iter().map(|_| self.new_message(to, None)).collect())
    }

    async fn get_message(&self, chat: &ChatRef, message_id: i64) -> Result<Message> {
        self.record(Call::GetMessage {
            chat: chat.clone(),
            id: message_id,
        })?;
        let found = self
            .stored
            .lock()
            .unwrap()
            .get(&(chat.clone(), message_id))
            .cloned();
        found.ok_or_else(|| {
            CourierError::Telegram(ApiFailure::new(400, "Bad Request: message not found"))
        })
    }

    async fn download(&self, message: &Message) -> Result<PathBuf> {
        self.record(Call::Download { id: message.id })?;
        Ok(PathBuf::from("/tmp/mock").join(message.file_id.clone().unwrap_or_default()))
    }
}

/// Renders `"<sid> page <n> <status>"`, or nothing once `finish` was called.
#[derive(Clone, Default)]
pub struct MockRenderer {
    text: Arc<Mutex<Option<String>>>,
    finished: Arc<Mutex<bool>>,
    renders: Arc<Mutex<Vec<(i64, bool, u32, String, u32)>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the rendered text regardless of arguments.
    pub fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = Some(text.to_string());
    }

    pub fn finish(&self) {
        *self.finished.lock().unwrap() = true;
    }

    pub fn renders(&self) -> Vec<(i64, bool, u32, String, u32)> {
        self.renders.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusRenderer for MockRenderer {
    async fn render(
        &self,
        sid: i64,
        is_user: bool,
        page_no: u32,
        status: &str,
        page_step: u32,
    ) -> Option<RenderedStatus> {
        self.renders
            .lock()
            .unwrap()
            .push((sid, is_user, page_no, status.to_string(), page_step));
        if *self.finished.lock().unwrap() {
            return None;
        }
        let text = self
            .text
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("{} page {} {}", sid, page_no, status));
        Some(RenderedStatus::new(text))
    }
}
