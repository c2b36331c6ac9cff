//! Wire events exchanged with the coordinator. Frames are JSON texts of
//! shape `{"event": "<kebab-case name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::model::{Attachment, ReplySnapshot};

/// Payload naming a single user. `username` defaults to empty on malformed
/// frames; each consumer decides how to degrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRef {
    #[serde(default)]
    pub username: String,
}

impl UserRef {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Message payload, used both for inbound `receive-message` and outbound
/// `send-message` (the coordinator reflects sends back verbatim).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplySnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Attachment>,
    #[serde(default)]
    pub user_color: String,
    /// Sender-side stamp in unix milliseconds. Display metadata only.
    #[serde(default)]
    pub timestamp: i64,
}

/// Events consumed from the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    ReceiveMessage(MessagePayload),
    UserJoined(UserRef),
    UserLeft(UserRef),
    ExistingUsers(Vec<UserRef>),
    UserTyping(UserRef),
}

/// Events emitted toward the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announced once per session; the payload is the bare username.
    Join(String),
    SendMessage(MessagePayload),
    Typing(UserRef),
    StopTyping(UserRef),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_event_names_are_kebab_case() {
        let ev: ServerEvent = serde_json::from_str(
            r#"{"event":"user-joined","data":{"username":"bob"}}"#,
        )
        .unwrap();
        assert_eq!(ev, ServerEvent::UserJoined(UserRef::new("bob")));

        let ev: ServerEvent =
            serde_json::from_str(r#"{"event":"existing-users","data":[{"username":"a"}]}"#)
                .unwrap();
        assert_eq!(ev, ServerEvent::ExistingUsers(vec![UserRef::new("a")]));
    }

    #[test]
    fn outbound_join_carries_bare_username() {
        let json = serde_json::to_string(&ClientEvent::Join("alice".into())).unwrap();
        assert_eq!(json, r#"{"event":"join","data":"alice"}"#);
    }

    #[test]
    fn message_payload_uses_camel_case() {
        let payload = MessagePayload {
            username: "alice".into(),
            message: "hi".into(),
            reply_to: Some(ReplySnapshot {
                username: "bob".into(),
                message: "yo".into(),
            }),
            file: None,
            user_color: "#4F46E5".into(),
            timestamp: 42,
        };
        let json = serde_json::to_value(ClientEvent::SendMessage(payload)).unwrap();
        assert_eq!(json["event"], "send-message");
        assert_eq!(json["data"]["replyTo"]["username"], "bob");
        assert_eq!(json["data"]["userColor"], "#4F46E5");
        assert!(json["data"].get("file").is_none());
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let ev: ServerEvent =
            serde_json::from_str(r#"{"event":"receive-message","data":{"message":"hi"}}"#)
                .unwrap();
        match ev {
            ServerEvent::ReceiveMessage(p) => {
                assert_eq!(p.username, "");
                assert_eq!(p.message, "hi");
                assert!(p.file.is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unknown_event_name_is_an_error() {
        let res: Result<ServerEvent, _> =
            serde_json::from_str(r#"{"event":"room-renamed","data":{}}"#);
        assert!(res.is_err());
    }
}
