//! The message log and outbound composition. The log has exactly one
//! insertion path: inbound `receive-message` events. A local send is only
//! reflected here once the coordinator echoes it back, so the sender's own
//! message can never be inserted twice.

use tracing::debug;

use crate::error::ChatError;
use crate::events::MessagePayload;
use crate::model::{now_ms, Attachment, ChatMessage, ReplySnapshot};

/// Append-only, arrival-ordered store of chat entries.
#[derive(Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an inbound message. Arrival order is authoritative; the wire
    /// timestamp is never used to reorder. A missing sender name degrades
    /// to `"Anonymous"` rather than failing the reconciliation pass.
    pub fn append(&mut self, payload: MessagePayload) -> &ChatMessage {
        let username = if payload.username.trim().is_empty() {
            "Anonymous".to_string()
        } else {
            payload.username
        };
        debug!(from = %username, has_file = payload.file.is_some(), "message appended");
        self.entries.push(ChatMessage {
            username,
            body: payload.message,
            reply_to: payload.reply_to,
            attachment: payload.file,
            color: payload.user_color,
            received_at_ms: now_ms(),
        });
        self.entries.last().expect("just pushed")
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the outbound `send-message` payload. Rejected when there is
/// neither trimmed text nor an attachment. The reply citation is an owned
/// snapshot, so nothing done to the original message afterwards can change
/// what was sent.
pub fn compose(
    username: &str,
    color: &str,
    body: &str,
    attachment: Option<Attachment>,
    reply_to: Option<ReplySnapshot>,
) -> Result<MessagePayload, ChatError> {
    let body = body.trim();
    if body.is_empty() && attachment.is_none() {
        return Err(ChatError::EmptyMessage);
    }
    Ok(MessagePayload {
        username: username.to_string(),
        message: body.to_string(),
        reply_to,
        file: attachment,
        user_color: color.to_string(),
        timestamp: now_ms(),
    })
}
