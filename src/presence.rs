//! The online-user roster. A set keyed by username, kept in arrival order
//! for display. The transport may deliver duplicate joins (reconnects) or
//! joins racing the initial snapshot; reconciliation absorbs both.

use crate::identity::Palette;
use crate::model::User;

#[derive(Default)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user unless one with the same name is already present.
    /// Returns whether the roster changed.
    pub fn insert(&mut self, username: &str, palette: &mut Palette) -> bool {
        let color = palette.pick();
        self.insert_with_color(username, color)
    }

    /// Insert with a caller-chosen color (used for the local user, whose
    /// roster color must match the color on their outbound messages).
    pub fn insert_with_color(&mut self, username: &str, color: String) -> bool {
        if self.contains(username) {
            return false;
        }
        self.users.push(User {
            username: username.to_string(),
            color,
        });
        true
    }

    /// Remove every entry with this name. Returns whether any was removed.
    pub fn remove(&mut self, username: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.username != username);
        self.users.len() != before
    }

    /// Replace the whole roster from an `existing-users` snapshot, each
    /// entry getting a fresh color. Duplicate names in the snapshot
    /// collapse to one entry.
    pub fn replace_all<I>(&mut self, usernames: I, palette: &mut Palette)
    where
        I: IntoIterator<Item = String>,
    {
        self.users.clear();
        for name in usernames {
            self.insert(&name, palette);
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.iter().any(|u| u.username == username)
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
