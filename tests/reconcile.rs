//! End-to-end reconciliation scenarios: synthetic inbound event sequences
//! fed straight into a session over the in-process bus, no socket.

use std::collections::HashSet;

use community_chat::attachment::FileInput;
use community_chat::config::Config;
use community_chat::error::ChatError;
use community_chat::events::{ClientEvent, MessagePayload, ServerEvent, UserRef};
use community_chat::identity::Palette;
use community_chat::session::Session;
use community_chat::transport::LocalBus;

fn new_session(bus: &std::sync::Arc<LocalBus>) -> Session {
    Session::with_palette(bus.clone(), &Config::default(), Palette::seeded(99))
}

fn message(from: &str, text: &str) -> ServerEvent {
    ServerEvent::ReceiveMessage(MessagePayload {
        username: from.into(),
        message: text.into(),
        ..Default::default()
    })
}

#[tokio::test]
async fn presence_flow_matches_the_room() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    session.apply(ServerEvent::ExistingUsers(vec![UserRef::new("Bob")]));
    let names: HashSet<String> = session
        .roster()
        .iter()
        .map(|u| u.username.clone())
        .collect();
    assert!(names.contains("Bob"));
    assert!(names.contains("Alice"));

    session.apply(ServerEvent::UserJoined(UserRef::new("Carol")));
    assert!(session.roster().iter().any(|u| u.username == "Carol"));

    session.apply(ServerEvent::UserLeft(UserRef::new("Bob")));
    let names: Vec<&str> = session
        .roster()
        .iter()
        .map(|u| u.username.as_str())
        .collect();
    assert!(!names.contains(&"Bob"));
    assert!(names.contains(&"Carol"));
}

#[tokio::test]
async fn duplicate_and_out_of_order_presence_events_are_benign() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    // a join can race the initial snapshot on reconnect
    session.apply(ServerEvent::UserJoined(UserRef::new("Bob")));
    session.apply(ServerEvent::UserJoined(UserRef::new("Bob")));
    session.apply(ServerEvent::ExistingUsers(vec![
        UserRef::new("Bob"),
        UserRef::new("Carol"),
    ]));
    session.apply(ServerEvent::UserJoined(UserRef::new("Bob")));

    let mut seen = HashSet::new();
    assert!(session.roster().iter().all(|u| seen.insert(&u.username)));
    assert_eq!(session.roster().len(), 3); // Bob, Carol, Alice
}

#[tokio::test]
async fn messages_keep_arrival_order() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    session.apply(message("Bob", "one"));
    session.apply(message("", "two"));
    session.apply(message("Carol", "three"));

    let log = session.messages();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].body, "one");
    assert_eq!(log[1].username, "Anonymous");
    assert_eq!(log[2].body, "three");
}

#[tokio::test]
async fn reply_cites_the_message_as_it_was() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    session.apply(message("Bob", "original text"));
    session.set_reply(0).unwrap();
    session.send("replying").await.unwrap();

    // more traffic after the send must not affect the emitted citation
    session.apply(message("Bob", "newer text"));

    let sent = bus.sent();
    let payload = sent
        .iter()
        .find_map(|ev| match ev {
            ClientEvent::SendMessage(p) => Some(p.clone()),
            _ => None,
        })
        .expect("a send-message event");
    let cited = payload.reply_to.expect("a reply citation");
    assert_eq!(cited.username, "Bob");
    assert_eq!(cited.message, "original text");
}

#[tokio::test]
async fn attachment_rides_the_outbound_message() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    session
        .attach(FileInput::new("notes.txt", "text/plain", b"hello".to_vec()))
        .await
        .unwrap();
    // attachment alone is enough, no body required
    session.send("").await.unwrap();

    let sent = bus.sent();
    let payload = match sent.last() {
        Some(ClientEvent::SendMessage(p)) => p.clone(),
        other => panic!("expected send-message, got {other:?}"),
    };
    let file = payload.file.clone().expect("an attachment");
    assert_eq!(file.name, "notes.txt");
    assert_eq!(file.size, 5);
    assert!(file.data.starts_with("data:text/plain;base64,"));

    // the echo path carries it into the log untouched
    session.apply(ServerEvent::ReceiveMessage(payload));
    assert_eq!(
        session.messages()[0].attachment.as_ref().unwrap().name,
        "notes.txt"
    );
}

#[tokio::test]
async fn oversized_file_never_reaches_the_wire() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    let limit = Config::default().max_attachment_bytes();
    let err = session
        .attach(FileInput::new(
            "big.txt",
            "text/plain",
            vec![0u8; (limit + 1) as usize],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::FileTooLarge { .. }));
    assert!(session.staged().is_none());
    assert!(matches!(
        session.send("").await,
        Err(ChatError::EmptyMessage)
    ));
    assert_eq!(bus.sent(), vec![ClientEvent::Join("Alice".into())]);
}

#[tokio::test]
async fn boundary_sized_file_is_accepted() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();

    let limit = Config::default().max_attachment_bytes();
    session
        .attach(FileInput::new(
            "exact.txt",
            "text/plain",
            vec![0u8; limit as usize],
        ))
        .await
        .unwrap();
    assert!(session.staged().is_some());
}

#[tokio::test]
async fn malformed_event_does_not_disturb_other_state() {
    let bus = LocalBus::new();
    let mut session = new_session(&bus);
    session.join("Alice").unwrap();
    session.apply(ServerEvent::UserJoined(UserRef::new("Bob")));
    session.apply(message("Bob", "hello"));

    // events with no username at all
    session.apply(ServerEvent::UserTyping(UserRef::new("")));
    session.apply(ServerEvent::UserJoined(UserRef::new("")));
    session.apply(ServerEvent::ReceiveMessage(MessagePayload {
        message: "from nobody".into(),
        ..Default::default()
    }));

    assert_eq!(session.roster().len(), 2);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].username, "Anonymous");
    assert!(session.typists().is_empty());
}
