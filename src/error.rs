use thiserror::Error;

/// Errors surfaced to the embedding UI. Reconciliation of inbound events
/// never returns these; malformed events degrade in place instead.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("unsupported file type: {mime}")]
    UnsupportedFileType { mime: String },
    #[error("message has no text and no attachment")]
    EmptyMessage,
    #[error("username must not be empty")]
    InvalidUsername,
    #[error("already joined")]
    AlreadyJoined,
    #[error("not joined yet")]
    NotJoined,
    #[error("no message at index {0}")]
    NoSuchMessage(usize),
    #[error("attachment encoding failed")]
    EncodeFailed,
    #[error("connection closed")]
    TransportClosed,
    #[error("websocket error: {0}")]
    Websocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
