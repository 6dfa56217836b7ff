use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A chat message as far as this crate cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub chat_id: i64,
    pub id: i64,
    pub thread_id: Option<i64>,
    pub text: Option<String>,
    /// File attached to the message, if any.
    pub file_id: Option<String>,
}

impl Message {
    /// A bare reference to an existing message, used as a reply or edit target.
    pub fn reference(chat_id: i64, id: i64) -> Self {
        Self {
            chat_id,
            id,
            thread_id: None,
            text: None,
            file_id: None,
        }
    }

    pub fn in_thread(mut self, thread_id: Option<i64>) -> Self {
        self.thread_id = thread_id;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatRef {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Username(name) => write!(f, "@{}", name),
        }
    }
}

impl Serialize for ChatRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChatRef::Id(id) => serializer.serialize_i64(*id),
            ChatRef::Username(_) => serializer.collect_str(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// Inline keyboard attached below a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the last row, opening one if needed.
    pub fn button(mut self, button: InlineButton) -> Self {
        match self.rows.last_mut() {
            Some(row) => row.push(button),
            None => self.rows.push(vec![button]),
        }
        self
    }

    pub fn row(mut self) -> Self {
        if self.rows.last().map(|row| !row.is_empty()).unwrap_or(false) {
            self.rows.push(Vec::new());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    /// Local file, uploaded as multipart.
    Path(PathBuf),
    /// A file already stored on the platform.
    FileId(String),
    Url(String),
}

impl InputFile {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
    Photo,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Document => "document",
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

/// Content of an outgoing message other than a plain reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputContent {
    Text(String),
    Media {
        kind: MediaKind,
        file: InputFile,
        caption: Option<String>,
    },
}

impl InputContent {
    pub fn document(file: InputFile, caption: impl Into<String>) -> Self {
        Self::media(MediaKind::Document, file, caption)
    }

    pub fn photo(file: InputFile, caption: impl Into<String>) -> Self {
        Self::media(MediaKind::Photo, file, caption)
    }

    pub fn video(file: InputFile, caption: impl Into<String>) -> Self {
        Self::media(MediaKind::Video, file, caption)
    }

    pub fn audio(file: InputFile, caption: impl Into<String>) -> Self {
        Self::media(MediaKind::Audio, file, caption)
    }

    fn media(kind: MediaKind, file: InputFile, caption: impl Into<String>) -> Self {
        let caption = caption.into();
        Self::Media {
            kind,
            file,
            caption: (!caption.is_empty()).then_some(caption),
        }
    }
}

/// Which client answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Bot,
    User,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Bot => f.write_str("bot"),
            Session::User => f.write_str("user"),
        }
    }
}

/// Status text plus its buttons, as produced by a
/// [`StatusRenderer`](crate::domain::ports::StatusRenderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatus {
    pub text: String,
    pub buttons: Option<InlineKeyboard>,
}

impl RenderedStatus {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: None,
        }
    }

    pub fn with_buttons(mut self, buttons: InlineKeyboard) -> Self {
        self.buttons = Some(buttons);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_serializes_in_platform_shape() {
        let keyboard = InlineKeyboard::new()
            .button(InlineButton::callback("Prev", "status 1 prev"))
            .button(InlineButton::callback("Next", "status 1 next"))
            .row()
            .button(InlineButton::link("Docs", "https://example.com"));

        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inline_keyboard": [
                    [
                        {"text": "Prev", "callback_data": "status 1 prev"},
                        {"text": "Next", "callback_data": "status 1 next"}
                    ],
                    [{"text": "Docs", "url": "https://example.com"}]
                ]
            })
        );
    }

    #[test]
    fn test_row_does_not_open_empty_rows() {
        let keyboard = InlineKeyboard::new().row().row();
        assert!(keyboard.rows.is_empty());
        assert!(keyboard.is_empty());
    }

    #[test]
    fn test_chat_ref_serializes_id_as_number() {
        assert_eq!(
            serde_json::to_value(ChatRef::Id(-1001234)).unwrap(),
            serde_json::json!(-1001234)
        );
        assert_eq!(
            serde_json::to_value(ChatRef::Username("channel".into())).unwrap(),
            serde_json::json!("@channel")
        );
    }

    #[test]
    fn test_empty_caption_is_dropped() {
        let content = InputContent::document(InputFile::FileId("abc".into()), "");
        assert_eq!(
            content,
            InputContent::Media {
                kind: MediaKind::Document,
                file: InputFile::FileId("abc".into()),
                caption: None,
            }
        );
    }
}
