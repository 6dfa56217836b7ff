//! Deep links to chat messages.
//!
//! Two forms are understood:
//!
//! - `https://t.me/<username>/<id>`, `https://t.me/c/<chat>/<id>` and the
//!   topic variants `https://t.me/c/<chat>/<topic>/<id>`
//! - `tg://openmessage?user_id=<user>&message_id=<id>`
//!
//! `<id>` may be a range `a-b`, which expands to one link per message.

use crate::core::messenger::Messenger;
use crate::domain::model::{ChatRef, Message, Session};
use crate::domain::ports::ChatApi;
use crate::utils::error::{CourierError, Result};
use regex::Regex;
use std::sync::LazyLock;

const PUBLIC_PREFIX: &str = "https://t.me/";

static PUBLIC_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://t\.me/(?:c/)?([^/]+)(?:/[^/]+)?/([0-9-]+)")
        .expect("valid public link pattern")
});

static PRIVATE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^tg://openmessage\?user_id=([0-9]+)&message_id=([0-9-]+)")
        .expect("valid private link pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    pub chat: ChatRef,
    /// First message id of the link (start of the range, if any).
    pub message_id: i64,
    pub private: bool,
    /// Expanded per-message links when the link names a range; empty otherwise.
    pub range: Vec<String>,
}

pub fn is_private_link(link: &str) -> bool {
    !link.starts_with(PUBLIC_PREFIX)
}

pub fn parse_tg_link(link: &str) -> Result<ParsedLink> {
    let private = is_private_link(link);
    let pattern = if private { &*PRIVATE_LINK } else { &*PUBLIC_LINK };
    let caps = pattern
        .captures(link)
        .ok_or_else(|| CourierError::link(format!("Unrecognized message link: {}", link)))?;

    let chat_token = &caps[1];
    let id_token = &caps[2];

    let (message_id, range) = match id_token.split_once('-') {
        Some((start, end)) => {
            let start = parse_id(start, link)?;
            let end = parse_id(end, link)?;
            (start, expand_range(link, private, start, end))
        }
        None => (parse_id(id_token, link)?, Vec::new()),
    };

    let chat = if chat_token.chars().all(|c| c.is_ascii_digit()) {
        let raw = if private {
            chat_token.to_string()
        } else {
            format!("-100{}", chat_token)
        };
        ChatRef::Id(parse_id(&raw, link)?)
    } else {
        ChatRef::Username(chat_token.to_string())
    };

    Ok(ParsedLink {
        chat,
        message_id,
        private,
        range,
    })
}

fn parse_id(token: &str, link: &str) -> Result<i64> {
    token.parse::<i64>().map_err(|_| {
        CourierError::link(format!("Invalid message id '{}' in link: {}", token, link))
    })
}

fn expand_range(link: &str, private: bool, start: i64, end: i64) -> Vec<String> {
    let prefix = if private {
        link.split("&message_id=").next().unwrap_or(link)
    } else {
        link.rsplit_once('/').map(|(head, _)| head).unwrap_or(link)
    };

    // an inverted range still yields its first message
    let last = end.max(start);
    (start..=last)
        .map(|id| {
            if private {
                format!("{}&message_id={}", prefix, id)
            } else {
                format!("{}/{}", prefix, id)
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Single(Message),
    Range(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub target: LinkTarget,
    pub session: Session,
}

impl ResolvedLink {
    fn new(parsed: ParsedLink, message: Message, session: Session) -> Self {
        let target = if parsed.range.is_empty() {
            LinkTarget::Single(message)
        } else {
            LinkTarget::Range(parsed.range)
        };
        Self { target, session }
    }
}

impl<A: ChatApi> Messenger<A> {
    /// Resolves a message link to the message it names, or to the expanded links
    /// of a range, along with the session that can read it.
    ///
    /// Public links are tried with the bot first and fall back to the user
    /// session; private links need the user session.
    pub async fn get_tg_link_message(&self, link: &str) -> Result<ResolvedLink> {
        if is_private_link(link) && self.user().is_none() {
            return Err(CourierError::link(
                "USER_SESSION required for this private link!",
            ));
        }

        let parsed = parse_tg_link(link)?;
        tracing::debug!(
            "Resolving link to chat {} message {} (private: {})",
            parsed.chat,
            parsed.message_id,
            parsed.private
        );

        if !parsed.private {
            match self.bot().get_message(&parsed.chat, parsed.message_id).await {
                Ok(message) => return Ok(ResolvedLink::new(parsed, message, Session::Bot)),
                Err(e) => {
                    if self.user().is_none() {
                        return Err(CourierError::link(platform_reason(&e)));
                    }
                    tracing::debug!("Bot cannot read {}, trying user session: {}", link, e);
                }
            }
        }

        let Some(user) = self.user() else {
            return Err(CourierError::link("Private: Please report!"));
        };

        match user.get_message(&parsed.chat, parsed.message_id).await {
            Ok(message) => Ok(ResolvedLink::new(parsed, message, Session::User)),
            Err(e) => Err(CourierError::link(format!(
                "You don't have access to this chat!. ERROR: {}",
                platform_reason(&e)
            ))),
        }
    }
}

fn platform_reason(err: &CourierError) -> String {
    match err.api_failure() {
        Some(failure) => failure.description.clone(),
        None => err.to_string(),
    }
}
