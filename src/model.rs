use serde::{Deserialize, Serialize};

/// An online user as tracked by the roster. The color is assigned locally
/// when the user is first observed and is not synced between clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub color: String,
}

/// Snapshot of a reply target taken when the reply is drafted. Carries
/// copies of the cited fields so later changes to the original message can
/// never rewrite the citation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplySnapshot {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub message: String,
}

/// Wire representation of a file attached to a message. `data` is a
/// self-describing data URL (`data:<mime>;base64,...`), so the payload can
/// be rendered or downloaded without consulting the other fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime: String,
    pub data: String,
    pub size: u64,
}

/// One entry in the message log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub username: String,
    pub body: String,
    pub reply_to: Option<ReplySnapshot>,
    pub attachment: Option<Attachment>,
    pub color: String,
    /// Local arrival time in unix milliseconds. Display metadata only;
    /// the log is ordered by arrival, not by this value.
    pub received_at_ms: i64,
}

/// Format a unix-millisecond stamp as `HH:MM` for display.
pub fn format_time(unix_ms: i64) -> String {
    match time::OffsetDateTime::from_unix_timestamp(unix_ms / 1000) {
        Ok(t) => format!("{:02}:{:02}", t.hour(), t.minute()),
        Err(_) => "??:??".into(),
    }
}

/// Current time in unix milliseconds.
pub fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
