//! Bot API session over HTTPS.

use crate::adapters::wire::{ApiResponse, TgFile, TgMessage};
use crate::config::BotConfig;
use crate::domain::model::{ChatRef, InlineKeyboard, InputContent, InputFile, MediaKind, Message};
use crate::domain::ports::{ChatApi, Destination, SendOptions};
use crate::utils::error::{ApiFailure, CourierError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

const API_TIMEOUT_SECS: u64 = 30;

pub struct BotApiClient {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
    probe_chat_id: Option<i64>,
    download_dir: PathBuf,
}

impl BotApiClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: Duration::from_secs(API_TIMEOUT_SECS),
            probe_chat_id: None,
            download_dir: std::env::temp_dir().join("tg-courier"),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        let mut client = Self::new(config.telegram.bot_token.clone(), config.api_base_url())
            .with_timeout(config.request_timeout())
            .with_download_dir(config.download_dir());
        client.probe_chat_id = config.telegram.probe_chat_id;
        client
    }

    /// Chat used to read messages by id; see [`ChatApi::get_message`].
    pub fn with_probe_chat(mut self, chat_id: i64) -> Self {
        self.probe_chat_id = Some(chat_id);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &Value) -> Result<T> {
        tracing::debug!("Calling {}", method);
        let response = self
            .client
            .post(self.api_url(method))
            .json(params)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T> {
        tracing::debug!("Calling {} (multipart)", method);
        let response = self
            .client
            .post(self.api_url(method))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// The platform answers errors with a JSON envelope and a matching HTTP
    /// status; anything else (proxies, gateways) becomes a failure carrying the
    /// HTTP status and body.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => envelope.into_result(status.as_u16()),
            Err(_) if !status.is_success() => Err(CourierError::Telegram(ApiFailure::new(
                i32::from(status.as_u16()),
                body,
            ))),
            Err(e) => Err(CourierError::SerializationError(e)),
        }
    }

    async fn send_media(
        &self,
        to: &Destination,
        kind: MediaKind,
        file: &InputFile,
        caption: Option<&str>,
        options: SendOptions,
    ) -> Result<Message> {
        let method = media_method(kind);
        let field = kind.as_str();

        let message: TgMessage = match file {
            InputFile::Path(path) => {
                let mut form = destination_form(to, options)?;
                if let Some(caption) = caption {
                    form = form.text("caption", caption.to_string());
                }
                form = form.part(field.to_string(), file_part(path).await?);
                self.call_multipart(method, form).await?
            }
            InputFile::FileId(reference) | InputFile::Url(reference) => {
                let mut params = destination_params(to, options);
                params[field] = Value::String(reference.clone());
                if let Some(caption) = caption {
                    params["caption"] = Value::String(caption.to_string());
                }
                self.call(method, &params).await?
            }
        };
        Ok(message.into())
    }
}

fn media_method(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Document => "sendDocument",
        MediaKind::Photo => "sendPhoto",
        MediaKind::Video => "sendVideo",
        MediaKind::Audio => "sendAudio",
    }
}

fn destination_params(to: &Destination, options: SendOptions) -> Value {
    let mut params = json!({
        "chat_id": to.chat,
        "disable_notification": options.disable_notification,
    });
    if let Some(thread_id) = to.thread_id {
        params["message_thread_id"] = json!(thread_id);
    }
    if let Some(reply_to) = to.reply_to {
        params["reply_parameters"] = json!({
            "message_id": reply_to,
            "allow_sending_without_reply": true,
        });
    }
    params
}

fn destination_form(to: &Destination, options: SendOptions) -> Result<Form> {
    let params = destination_params(to, options);
    let mut form = Form::new();
    if let Value::Object(fields) = params {
        for (key, value) in fields {
            let text = match value {
                Value::String(s) => s,
                other => serde_json::to_string(&other)?,
            };
            form = form.text(key, text);
        }
    }
    Ok(form)
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file")
        .to_string();
    Ok(Part::bytes(bytes).file_name(file_name))
}

fn link_preview(options: SendOptions) -> Value {
    json!({ "is_disabled": options.disable_web_page_preview })
}

#[async_trait]
impl ChatApi for BotApiClient {
    async fn send_text(
        &self,
        to: &Destination,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        options: SendOptions,
    ) -> Result<Message> {
        let mut params = destination_params(to, options);
        params["text"] = Value::String(text.to_string());
        params["link_preview_options"] = link_preview(options);
        if let Some(buttons) = buttons {
            params["reply_markup"] = serde_json::to_value(buttons)?;
        }

        let message: TgMessage = self.call("sendMessage", &params).await?;
        Ok(message.into())
    }

    async fn edit_text(
        &self,
        message: &Message,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        options: SendOptions,
    ) -> Result<Message> {
        let mut params = json!({
            "chat_id": message.chat_id,
            "message_id": message.id,
            "text": text,
            "link_preview_options": link_preview(options),
        });
        if let Some(buttons) = buttons {
            params["reply_markup"] = serde_json::to_value(buttons)?;
        }

        let edited: TgMessage = self.call("editMessageText", &params).await?;
        Ok(edited.into())
    }

    async fn delete_message(&self, message: &Message) -> Result<()> {
        let params = json!({
            "chat_id": message.chat_id,
            "message_id": message.id,
        });
        let _: bool = self.call("deleteMessage", &params).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        to: &Destination,
        file: &InputFile,
        caption: &str,
        options: SendOptions,
    ) -> Result<Message> {
        let caption = (!caption.is_empty()).then_some(caption);
        self.send_media(to, MediaKind::Document, file, caption, options)
            .await
    }

    async fn send_content(
        &self,
        to: &Destination,
        content: &InputContent,
        options: SendOptions,
    ) -> Result<Message> {
        match content {
            InputContent::Text(text) => self.send_text(to, text, None, options).await,
            InputContent::Media {
                kind,
                file,
                caption,
            } => {
                self.send_media(to, *kind, file, caption.as_deref(), options)
                    .await
            }
        }
    }

    async fn send_album(
        &self,
        to: &Destination,
        contents: &[InputContent],
        options: SendOptions,
    ) -> Result<Vec<Message>> {
        let mut media = Vec::with_capacity(contents.len());
        let mut uploads = Vec::new();

        for (index, content) in contents.iter().enumerate() {
            let InputContent::Media {
                kind,
                file,
                caption,
            } = content
            else {
                return Err(CourierError::unsupported("text inside an album"));
            };

            let reference = match file {
                InputFile::Path(path) => {
                    let name = format!("file{}", index);
                    uploads.push((name.clone(), path.clone()));
                    format!("attach://{}", name)
                }
                InputFile::FileId(reference) | InputFile::Url(reference) => reference.clone(),
            };

            let mut item = json!({ "type": kind.as_str(), "media": reference });
            if let Some(caption) = caption {
                item["caption"] = Value::String(caption.clone());
            }
            media.push(item);
        }

        let messages: Vec<TgMessage> = if uploads.is_empty() {
            let mut params = destination_params(to, options);
            params["media"] = Value::Array(media);
            self.call("sendMediaGroup", &params).await?
        } else {
            let mut form = destination_form(to, options)?
                .text("media", serde_json::to_string(&media)?);
            for (name, path) in &uploads {
                form = form.part(name.clone(), file_part(path).await?);
            }
            self.call_multipart("sendMediaGroup", form).await?
        };

        Ok(messages.into_iter().map(Message::from).collect())
    }

    /// The Bot API cannot read a message by id, so the message is forwarded to
    /// the probe chat, read there and the copy deleted again.
    async fn get_message(&self, chat: &ChatRef, message_id: i64) -> Result<Message> {
        let Some(probe_chat_id) = self.probe_chat_id else {
            return Err(CourierError::unsupported("getMessage without a probe chat"));
        };

        let params = json!({
            "chat_id": probe_chat_id,
            "from_chat_id": chat,
            "message_id": message_id,
            "disable_notification": true,
        });
        let forwarded: TgMessage = self.call("forwardMessage", &params).await?;

        let copy = Message::reference(forwarded.chat.id, forwarded.message_id);
        if let Err(e) = self.delete_message(&copy).await {
            tracing::warn!("Could not remove probe copy {}: {}", copy.id, e);
        }

        let origin_chat = forwarded
            .forward_origin
            .as_ref()
            .and_then(|origin| origin.chat.as_ref())
            .map(|c| c.id);
        let mut message = Message::from(forwarded);
        message.id = message_id;
        message.thread_id = None;
        message.chat_id = match chat {
            ChatRef::Id(id) => *id,
            ChatRef::Username(_) => origin_chat.unwrap_or(message.chat_id),
        };
        Ok(message)
    }

    async fn download(&self, message: &Message) -> Result<PathBuf> {
        let Some(file_id) = &message.file_id else {
            return Err(CourierError::ResponseError {
                message: format!("Message {} has no attached file", message.id),
            });
        };

        let file: TgFile = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let Some(file_path) = file.file_path else {
            return Err(CourierError::ResponseError {
                message: format!("File {} has no download path", file.file_id),
            });
        };

        let response = self
            .client
            .get(self.file_url(&file_path))
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Telegram(ApiFailure::new(i32::from(status), body)));
        }
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let base_name = Path::new(&file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("file");
        let local_path = self
            .download_dir
            .join(format!("{}_{}_{}", message.chat_id, message.id, base_name));
        tokio::fs::write(&local_path, &bytes).await?;

        Ok(local_path)
    }
}
