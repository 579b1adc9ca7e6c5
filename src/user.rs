//! User identities.
//!
//! The board works against a fixed directory of mock users. The same four
//! identities also make up the pool the peer-activity generator draws its
//! synthetic "other users" from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A board member. Equality is by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            avatar: None,
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The fixed set of mock users, in directory order.
pub fn mock_users() -> Vec<User> {
    vec![
        User::new("1", "alice@example.com", "Alice Johnson"),
        User::new("2", "bob@example.com", "Bob Smith"),
        User::new("3", "charlie@example.com", "Charlie Brown"),
        User::new("4", "diana@example.com", "Diana Prince"),
    ]
}

/// Look up a user by id, email, or case-insensitive display name.
pub fn find_user<'a>(users: &'a [User], needle: &str) -> Option<&'a User> {
    let needle = non_empty(Some(needle))?;
    users.iter().find(|user| {
        user.id == needle
            || user.email.eq_ignore_ascii_case(needle)
            || user.name.eq_ignore_ascii_case(needle)
    })
}

/// Users other than `current`, preserving directory order.
pub fn other_users<'a>(users: &'a [User], current: &User) -> Vec<&'a User> {
    users.iter().filter(|user| user.id != current.id).collect()
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
