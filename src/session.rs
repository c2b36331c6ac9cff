//! Session orchestration: binds user actions to outbound events and every
//! inbound event to exactly one reconciliation call. Owns the local user's
//! identity, the roster, the message log, the typing coordinator and the
//! compose state (draft reply plus staged attachment).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::attachment::{self, FileInput, Staged};
use crate::config::Config;
use crate::error::ChatError;
use crate::events::{ClientEvent, ServerEvent};
use crate::identity::Palette;
use crate::messages::{self, MessageLog};
use crate::model::{ChatMessage, ReplySnapshot, User};
use crate::presence::Roster;
use crate::transport::Transport;
use crate::typing::TypingCoordinator;

pub struct Session {
    transport: Arc<dyn Transport>,
    palette: Palette,
    max_attachment_bytes: u64,

    username: String,
    color: String,
    joined: bool,

    roster: Roster,
    log: MessageLog,
    typing: TypingCoordinator,

    staged: Option<Staged>,
    reply: Option<ReplySnapshot>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::with_palette(transport, config, Palette::new())
    }

    /// Construct with a caller-provided palette so tests can pin colors.
    pub fn with_palette(
        transport: Arc<dyn Transport>,
        config: &Config,
        palette: Palette,
    ) -> Self {
        let typing = TypingCoordinator::new(
            Arc::clone(&transport),
            config.typing_debounce(),
            config.typing_expiry(),
        );
        Self {
            transport,
            palette,
            max_attachment_bytes: config.max_attachment_bytes(),
            username: String::new(),
            color: String::new(),
            joined: false,
            roster: Roster::new(),
            log: MessageLog::new(),
            typing,
            staged: None,
            reply: None,
        }
    }

    /// Join the room. Whitespace-only names are rejected; a second join in
    /// the same session is rejected so the `join` event is emitted exactly
    /// once. The local user goes into the roster immediately rather than
    /// waiting for the coordinator's echo.
    pub fn join(&mut self, username: &str) -> Result<(), ChatError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::InvalidUsername);
        }
        if self.joined {
            return Err(ChatError::AlreadyJoined);
        }
        self.username = username.to_string();
        self.color = self.palette.pick();
        self.transport.send(ClientEvent::Join(self.username.clone()))?;
        self.joined = true;
        self.roster
            .insert_with_color(&self.username, self.color.clone());
        debug!(user = %self.username, "joined");
        Ok(())
    }

    /// Compose-box keystroke. Drives the typing debounce.
    pub fn input_changed(&mut self) {
        if self.joined {
            self.typing.local_edit(&self.username);
        }
    }

    /// Stage a file for the next send, replacing any previously staged
    /// one. Validation and preview decoding happen here, before any
    /// network interaction.
    pub async fn attach(&mut self, file: FileInput) -> Result<(), ChatError> {
        let staged = attachment::stage(file, self.max_attachment_bytes).await?;
        self.staged = Some(staged);
        Ok(())
    }

    pub fn clear_attachment(&mut self) {
        self.staged = None;
    }

    /// Draft a reply citing the message at `index` in the log. The citation
    /// is snapshotted now; later log growth or edits cannot change it.
    pub fn set_reply(&mut self, index: usize) -> Result<(), ChatError> {
        let target = self.log.get(index).ok_or(ChatError::NoSuchMessage(index))?;
        self.reply = Some(ReplySnapshot {
            username: target.username.clone(),
            message: target.body.clone(),
        });
        Ok(())
    }

    pub fn cancel_reply(&mut self) {
        self.reply = None;
    }

    /// Send the compose box. No-op errors when there is neither text nor a
    /// staged attachment. Blocks on attachment encoding before emitting;
    /// on success the compose state (staged file, preview, reply draft) is
    /// cleared as one reset. The message itself only enters the log when
    /// the coordinator reflects it back.
    pub async fn send(&mut self, body: &str) -> Result<(), ChatError> {
        if !self.joined {
            return Err(ChatError::NotJoined);
        }
        if body.trim().is_empty() && self.staged.is_none() {
            return Err(ChatError::EmptyMessage);
        }
        let file = match &self.staged {
            Some(staged) => Some(attachment::encode_for_send(&staged.file).await?),
            None => None,
        };
        let payload = messages::compose(
            &self.username,
            &self.color,
            body,
            file,
            self.reply.clone(),
        )?;
        self.transport.send(ClientEvent::SendMessage(payload))?;
        self.staged = None;
        self.reply = None;
        Ok(())
    }

    /// Reconcile one inbound event. Infallible: malformed payloads degrade
    /// in place and never corrupt unrelated state.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ReceiveMessage(payload) => {
                self.log.append(payload);
            }
            ServerEvent::UserJoined(user) => {
                if user.username.trim().is_empty() {
                    warn!("user-joined without a username, skipping");
                    return;
                }
                if self.roster.insert(&user.username, &mut self.palette) {
                    debug!(user = %user.username, "user joined");
                }
            }
            ServerEvent::UserLeft(user) => {
                if self.roster.remove(&user.username) {
                    debug!(user = %user.username, "user left");
                }
            }
            ServerEvent::ExistingUsers(list) => {
                self.roster.replace_all(
                    list.into_iter()
                        .map(|u| u.username)
                        .filter(|name| !name.trim().is_empty()),
                    &mut self.palette,
                );
                // the snapshot lists the others; keep ourselves represented
                if self.joined {
                    self.roster
                        .insert_with_color(&self.username, self.color.clone());
                }
            }
            ServerEvent::UserTyping(user) => {
                if user.username.trim().is_empty() {
                    warn!("user-typing without a username, skipping");
                    return;
                }
                self.typing.remote_typing(&user.username);
            }
        }
    }

    /// Tear the session down: cancel every pending timer. The caller drops
    /// the inbound receiver; together that unbinds everything, so a
    /// reconnect starts from a clean slate with no duplicate handlers.
    pub fn shutdown(&mut self) {
        self.typing.shutdown();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.entries()
    }

    pub fn roster(&self) -> &[User] {
        self.roster.users()
    }

    pub fn typists(&self) -> Vec<String> {
        self.typing.typists()
    }

    pub fn staged(&self) -> Option<&Staged> {
        self.staged.as_ref()
    }

    pub fn reply(&self) -> Option<&ReplySnapshot> {
        self.reply.as_ref()
    }
}
