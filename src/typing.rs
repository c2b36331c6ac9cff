//! Typing signal coordination. Two independent jobs: collapse local
//! keystroke bursts into one `typing` / `stop-typing` pair, and expire
//! remote typing indicators on a per-user timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::events::{ClientEvent, UserRef};
use crate::transport::Transport;

struct Inner {
    /// Bumped on every arm. A timer task re-checks its own generation
    /// under the lock before acting, so a task that was already past its
    /// sleep when aborted can never act on a rearmed slot.
    generation: u64,
    /// Pending trailing `stop-typing` for the local user. `Some` while we
    /// have announced typing and the debounce window is open.
    stop_timer: Option<(u64, JoinHandle<()>)>,
    /// Expiry timer per remote typist. Rearmed, never left to fire stale.
    remote: HashMap<String, (u64, JoinHandle<()>)>,
}

pub struct TypingCoordinator {
    inner: Arc<Mutex<Inner>>,
    transport: Arc<dyn Transport>,
    debounce: Duration,
    expiry: Duration,
}

impl TypingCoordinator {
    pub fn new(transport: Arc<dyn Transport>, debounce: Duration, expiry: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                stop_timer: None,
                remote: HashMap::new(),
            })),
            transport,
            debounce,
            expiry,
        }
    }

    /// Local keystroke. Emits `typing` only on the idle-to-typing
    /// transition; every call rearms the trailing `stop-typing` timer, so
    /// continuous activity produces at most one event pair per burst.
    pub fn local_edit(&self, username: &str) {
        let mut inner = self.inner.lock();
        let was_typing = match inner.stop_timer.take() {
            Some((_, timer)) => {
                timer.abort();
                true
            }
            None => false,
        };
        if !was_typing {
            if let Err(e) = self.transport.send(ClientEvent::Typing(UserRef::new(username))) {
                warn!(error = %e, "failed to announce typing");
            }
        }
        inner.generation += 1;
        let generation = inner.generation;
        let inner_handle = Arc::clone(&self.inner);
        let transport = Arc::clone(&self.transport);
        let name = username.to_string();
        let debounce = self.debounce;
        inner.stop_timer = Some((
            generation,
            tokio::spawn(async move {
                tokio::time::sleep(debounce).await;
                {
                    let mut inner = inner_handle.lock();
                    let still_armed =
                        matches!(inner.stop_timer, Some((armed, _)) if armed == generation);
                    if !still_armed {
                        // superseded while we slept
                        return;
                    }
                    inner.stop_timer = None;
                }
                if let Err(e) = transport.send(ClientEvent::StopTyping(UserRef::new(&name))) {
                    warn!(error = %e, "failed to announce stop-typing");
                }
            }),
        ));
    }

    /// Remote `user-typing`. Adding an already-present user is a no-op on
    /// the observable set but still resets that user's expiry deadline.
    /// Remote `stop-typing` is deliberately not consumed; the local expiry
    /// timer is authoritative.
    pub fn remote_typing(&self, username: &str) {
        let mut inner = self.inner.lock();
        if let Some((_, timer)) = inner.remote.remove(username) {
            timer.abort();
        }
        inner.generation += 1;
        let generation = inner.generation;
        let inner_handle = Arc::clone(&self.inner);
        let name = username.to_string();
        let expiry = self.expiry;
        inner.remote.insert(
            username.to_string(),
            (
                generation,
                tokio::spawn(async move {
                    tokio::time::sleep(expiry).await;
                    let mut inner = inner_handle.lock();
                    // only the most recent arm for this user may evict it
                    if matches!(inner.remote.get(&name), Some((armed, _)) if *armed == generation)
                    {
                        inner.remote.remove(&name);
                    }
                }),
            ),
        );
    }

    /// Users currently considered typing. Unordered.
    pub fn typists(&self) -> Vec<String> {
        self.inner.lock().remote.keys().cloned().collect()
    }

    pub fn is_typing(&self, username: &str) -> bool {
        self.inner.lock().remote.contains_key(username)
    }

    /// Cancel every pending timer. Called on session teardown so no stale
    /// callback can fire after a reconnect rebinds the coordinator.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if let Some((_, timer)) = inner.stop_timer.take() {
            timer.abort();
        }
        for (_, (_, timer)) in inner.remote.drain() {
            timer.abort();
        }
    }
}

impl Drop for TypingCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
