//! Common data types used throughout the sync client

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single item on a shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub name: String,
    /// Free-text details (quantity notes, brand, ...)
    pub details: String,
    pub checked: bool,
}

/// Complete point-in-time copy of one remote list
///
/// A snapshot is the unit of cache replacement: refreshes build a new
/// snapshot and swap it in whole, they never edit one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSnapshot {
    pub id: String,
    pub name: String,
    pub items: Vec<ListItem>,
}

impl ListSnapshot {
    /// Find an item by its identifier.
    pub fn item(&self, item_id: &str) -> Option<&ListItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Number of items not yet checked off.
    pub fn unchecked_count(&self) -> usize {
        self.items.iter().filter(|item| !item.checked).count()
    }
}

/// Credentials supplied at client construction
///
/// The two variants select mutually exclusive authentication modes: a
/// password login yields a signed user id, a refresh token yields an
/// access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { email: String, password: String },
    RefreshToken(String),
}

impl Credentials {
    /// Password credentials.
    pub fn password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password { email: email.into(), password: password.into() }
    }

    /// Long-lived refresh token credentials.
    pub fn refresh_token(token: impl Into<String>) -> Self {
        Self::RefreshToken(token.into())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Self::RefreshToken(_) => f.debug_tuple("RefreshToken").field(&"<redacted>").finish(),
        }
    }
}
