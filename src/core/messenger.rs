use crate::config::MessagingSettings;
use crate::domain::model::{InlineKeyboard, InputContent, InputFile, Message};
use crate::domain::ports::{ChatApi, Destination};
use crate::utils::error::Result;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Send/edit/delete helpers over one bot session and an optional user session.
///
/// Every sending call handles platform rate limiting the same way: the failure is
/// logged as a warning and, when the call is blocking, retried after
/// `retry_after * retry_factor`.
pub struct Messenger<A: ChatApi> {
    bot: A,
    user: Option<A>,
    settings: MessagingSettings,
}

impl<A: ChatApi> Messenger<A> {
    pub fn new(bot: A, settings: MessagingSettings) -> Self {
        Self {
            bot,
            user: None,
            settings,
        }
    }

    pub fn with_user_session(mut self, user: A) -> Self {
        self.user = Some(user);
        self
    }

    pub fn bot(&self) -> &A {
        &self.bot
    }

    pub fn user(&self) -> Option<&A> {
        self.user.as_ref()
    }

    pub fn settings(&self) -> &MessagingSettings {
        &self.settings
    }

    /// Replies to `reply_to` in its chat and thread.
    pub async fn send_message(
        &self,
        reply_to: &Message,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        block: bool,
    ) -> Result<Message> {
        let to = &Destination::reply_to(reply_to);
        let options = self.settings.send_options;
        let result = self
            .retry_rate_limited(block, || self.bot.send_text(to, text, buttons, options))
            .await;
        log_failure("send message", result)
    }

    pub async fn edit_message(
        &self,
        message: &Message,
        text: &str,
        buttons: Option<&InlineKeyboard>,
        block: bool,
    ) -> Result<Message> {
        let options = self.settings.send_options;
        let result = self
            .retry_rate_limited(block, || self.bot.edit_text(message, text, buttons, options))
            .await;
        log_failure("edit message", result)
    }

    pub async fn send_file(
        &self,
        reply_to: &Message,
        file: &InputFile,
        caption: &str,
    ) -> Result<Message> {
        let to = &Destination::reply_to(reply_to);
        let options = self.settings.send_options;
        let result = self
            .retry_rate_limited(true, || self.bot.send_document(to, file, caption, options))
            .await;
        log_failure("send file", result)
    }

    /// Failures other than rate limiting are returned without being logged;
    /// callers usually fall back to another content type.
    pub async fn send_message_with_content(
        &self,
        reply_to: &Message,
        content: &InputContent,
    ) -> Result<Message> {
        let to = &Destination::reply_to(reply_to);
        let options = self.settings.send_options;
        self.retry_rate_limited(true, || self.bot.send_content(to, content, options))
            .await
    }

    /// On failure the replied-to message is returned so callers always get a
    /// message to link to.
    pub async fn send_album(
        &self,
        reply_to: &Message,
        contents: &[InputContent],
    ) -> Vec<Message> {
        let to = &Destination::reply_to(reply_to);
        let options = self.settings.send_options;
        let result = self
            .retry_rate_limited(true, || self.bot.send_album(to, contents, options))
            .await;
        match result {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!("Failed to send album: {}", e);
                vec![reply_to.clone()]
            }
        }
    }

    /// Posts a feed update, through the user session when there is one.
    pub async fn send_rss(
        &self,
        text: &str,
        chat_id: i64,
        thread_id: Option<i64>,
    ) -> Result<Message> {
        let app = self.user.as_ref().unwrap_or(&self.bot);
        let to = &Destination::chat(chat_id, thread_id);
        let options = self.settings.send_options;
        let result = self
            .retry_rate_limited(true, || app.send_text(to, text, None, options))
            .await;
        log_failure("send rss", result)
    }

    pub async fn delete_message(&self, message: &Message) {
        if let Err(e) = self.bot.delete_message(message).await {
            tracing::error!("{}", e);
        }
    }

    /// Waits `auto_delete_delay`, then deletes whichever messages were given.
    pub async fn auto_delete_message(
        &self,
        cmd_message: Option<&Message>,
        bot_message: Option<&Message>,
    ) {
        tokio::time::sleep(self.settings.auto_delete_delay).await;
        if let Some(message) = cmd_message {
            self.delete_message(message).await;
        }
        if let Some(message) = bot_message {
            self.delete_message(message).await;
        }
    }

    pub async fn temp_download(&self, message: &Message) -> Result<PathBuf> {
        let path = self.bot.download(message).await?;
        tracing::debug!("Downloaded message {} to {}", message.id, path.display());
        Ok(path)
    }

    async fn retry_rate_limited<T, F, Fut>(&self, block: bool, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let Some(wait_for) = err.retry_after() else {
                return Err(err);
            };
            tracing::warn!("{}", err);

            let within_budget = self
                .settings
                .max_rate_limit_retries
                .map(|max| retries < max)
                .unwrap_or(true);
            if !block || !within_budget {
                return Err(err);
            }

            retries += 1;
            tokio::time::sleep(self.scaled_wait(wait_for)).await;
        }
    }

    /// `wait_for * retry_factor`, or plain `wait_for` when the factor is not a
    /// usable multiplier (negative, NaN, or overflowing).
    fn scaled_wait(&self, wait_for: Duration) -> Duration {
        Duration::try_from_secs_f64(wait_for.as_secs_f64() * self.settings.retry_factor)
            .unwrap_or(wait_for)
    }
}

impl<A: ChatApi + 'static> Messenger<A> {
    /// Runs [`Messenger::auto_delete_message`] in the background.
    pub fn spawn_auto_delete(
        self: &Arc<Self>,
        cmd_message: Option<Message>,
        bot_message: Option<Message>,
    ) -> JoinHandle<()> {
        let messenger = Arc::clone(self);
        tokio::spawn(async move {
            messenger
                .auto_delete_message(cmd_message.as_ref(), bot_message.as_ref())
                .await;
        })
    }
}

fn log_failure<T>(action: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::error!("Failed to {}: {}", action, e);
    }
    result
}
