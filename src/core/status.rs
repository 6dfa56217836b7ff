use crate::config::StatusSettings;
use crate::core::messenger::Messenger;
use crate::domain::model::Message;
use crate::domain::ports::{ChatApi, StatusRenderer};
use crate::utils::interval::SetInterval;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_STATUS_FILTER: &str = "All";

/// The live status message for one status id.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub message: Message,
    pub last_update: Instant,
    pub page_no: u32,
    pub page_step: u32,
    pub status: String,
    pub is_user: bool,
}

#[derive(Default)]
struct BoardState {
    entries: HashMap<i64, StatusEntry>,
    intervals: HashMap<i64, SetInterval>,
}

impl BoardState {
    fn drop_status(&mut self, sid: i64) {
        self.entries.remove(&sid);
        self.cancel_interval(sid);
    }

    fn cancel_interval(&mut self, sid: i64) {
        if let Some(interval) = self.intervals.remove(&sid) {
            interval.cancel();
        }
    }
}

/// Shared status messages, one per chat (or per user), refreshed on an interval.
///
/// Entries and their refresh intervals live behind a single async mutex, so
/// sending, refreshing and deleting never interleave.
pub struct StatusBoard<A: ChatApi, R: StatusRenderer> {
    messenger: Arc<Messenger<A>>,
    renderer: R,
    settings: StatusSettings,
    state: Mutex<BoardState>,
    stop_all: AtomicBool,
}

impl<A, R> StatusBoard<A, R>
where
    A: ChatApi + 'static,
    R: StatusRenderer + 'static,
{
    pub fn new(messenger: Arc<Messenger<A>>, renderer: R, settings: StatusSettings) -> Arc<Self> {
        Arc::new(Self {
            messenger,
            renderer,
            settings,
            state: Mutex::new(BoardState::default()),
            stop_all: AtomicBool::new(false),
        })
    }

    /// While set, sending and refreshing are no-ops.
    pub fn set_stop_all(&self, stop: bool) {
        self.stop_all.store(stop, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_all.load(Ordering::SeqCst)
    }

    pub async fn entry(&self, sid: i64) -> Option<StatusEntry> {
        self.state.lock().await.entries.get(&sid).cloned()
    }

    pub async fn entry_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.state.lock().await.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn has_interval(&self, sid: i64) -> bool {
        self.state.lock().await.intervals.contains_key(&sid)
    }

    /// Moves the status for `sid` to another page. Returns false when there is no status.
    pub async fn set_page(&self, sid: i64, page_no: u32, page_step: u32) -> bool {
        let mut state = self.state.lock().await;
        match state.entries.get_mut(&sid) {
            Some(entry) => {
                entry.page_no = page_no.max(1);
                entry.page_step = page_step.max(1);
                true
            }
            None => false,
        }
    }

    /// Restricts the status for `sid` to tasks in `status`. Returns false when there is no status.
    pub async fn set_filter(&self, sid: i64, status: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.entries.get_mut(&sid) {
            Some(entry) => {
                entry.status = status.to_string();
                entry.page_no = 1;
                true
            }
            None => false,
        }
    }

    /// Re-renders the status for `sid` and edits its message when the text changed.
    ///
    /// Non-forced refreshes closer than `min_refresh` to the previous one are
    /// skipped. A status that renders to nothing, or whose message the platform
    /// rejects with a 400-409 code, is dropped along with its interval.
    pub async fn update_status_message(&self, sid: i64, force: bool) {
        if self.is_stopped() {
            return;
        }

        let mut state = self.state.lock().await;
        let Some(entry) = state.entries.get_mut(&sid) else {
            state.cancel_interval(sid);
            return;
        };

        if !force && entry.last_update.elapsed() < self.settings.min_refresh {
            return;
        }
        entry.last_update = Instant::now();

        let rendered = self
            .renderer
            .render(sid, entry.is_user, entry.page_no, &entry.status, entry.page_step)
            .await;
        let Some(rendered) = rendered else {
            tracing::debug!("Status {} has nothing left to show", sid);
            state.drop_status(sid);
            return;
        };

        if rendered.text == entry.message.text_or_empty() {
            return;
        }

        match self
            .messenger
            .edit_message(&entry.message, &rendered.text, rendered.buttons.as_ref(), false)
            .await
        {
            Ok(_) => {
                entry.message.text = Some(rendered.text);
                entry.last_update = Instant::now();
            }
            Err(e) if e.is_message_gone() => {
                tracing::debug!("Status {} message is gone: {}", sid, e);
                state.drop_status(sid);
            }
            Err(e) => {
                tracing::error!("Status with id: {} haven't been updated. Error: {}", sid, e);
            }
        }
    }

    /// Posts a fresh status message in reply to `msg`, replacing any existing one.
    ///
    /// `user_id == 0` makes a chat-wide status keyed by the chat id; chat-wide
    /// statuses also get a refresh interval.
    pub async fn send_status_message(self: &Arc<Self>, msg: &Message, user_id: i64) {
        if self.is_stopped() {
            return;
        }

        let sid = if user_id != 0 { user_id } else { msg.chat_id };
        let is_user = user_id != 0;

        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get(&sid) {
            let rendered = self
                .renderer
                .render(sid, is_user, entry.page_no, &entry.status, entry.page_step)
                .await;
            let Some(rendered) = rendered else {
                state.drop_status(sid);
                return;
            };

            let old_message = entry.message.clone();
            let mut message = match self
                .messenger
                .send_message(msg, &rendered.text, rendered.buttons.as_ref(), false)
                .await
            {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!("Status with id: {} haven't been sent. Error: {}", sid, e);
                    return;
                }
            };
            self.messenger.delete_message(&old_message).await;

            message.text = Some(rendered.text);
            if let Some(entry) = state.entries.get_mut(&sid) {
                entry.message = message;
                entry.last_update = Instant::now();
            }
        } else {
            let Some(rendered) = self
                .renderer
                .render(sid, is_user, 1, DEFAULT_STATUS_FILTER, 1)
                .await
            else {
                return;
            };

            let mut message = match self
                .messenger
                .send_message(msg, &rendered.text, rendered.buttons.as_ref(), false)
                .await
            {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!("Status with id: {} haven't been sent. Error: {}", sid, e);
                    return;
                }
            };

            message.text = Some(rendered.text);
            state.entries.insert(
                sid,
                StatusEntry {
                    message,
                    last_update: Instant::now(),
                    page_no: 1,
                    page_step: 1,
                    status: DEFAULT_STATUS_FILTER.to_string(),
                    is_user,
                },
            );
        }

        if !is_user && !state.intervals.contains_key(&sid) {
            let interval = self.spawn_refresh(sid);
            state.intervals.insert(sid, interval);
            tracing::debug!(
                "Refreshing status {} every {:?}",
                sid,
                self.settings.update_interval
            );
        }
    }

    /// Deletes every status message and forgets its entry.
    pub async fn delete_status(&self) {
        let mut state = self.state.lock().await;
        let sids: Vec<i64> = state.entries.keys().copied().collect();
        for sid in sids {
            if let Some(entry) = state.entries.remove(&sid) {
                self.messenger.delete_message(&entry.message).await;
            }
        }
    }

    /// Stops all refreshing and cancels every interval; entries are kept.
    pub async fn shutdown(&self) {
        self.set_stop_all(true);
        let mut state = self.state.lock().await;
        for (_, interval) in state.intervals.drain() {
            interval.cancel();
        }
    }

    fn spawn_refresh(self: &Arc<Self>, sid: i64) -> SetInterval {
        let board: Weak<Self> = Arc::downgrade(self);
        SetInterval::spawn(self.settings.update_interval, move || {
            let board = board.clone();
            async move {
                match board.upgrade() {
                    Some(board) => {
                        board.update_status_message(sid, false).await;
                        true
                    }
                    None => false,
                }
            }
        })
    }
}
