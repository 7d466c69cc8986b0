use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage-assigned identifier for a contest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contestant's picks. The shape is owned by the frontend; any JSON object is accepted.
pub type BracketDocument = Map<String, Value>;

/// Registration form as posted by the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Normalized registration ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub bracket: Option<BracketDocument>,
    pub score: i64,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// The stored bracket, or an empty object before the first submission.
    pub fn bracket_or_empty(&self) -> Value {
        Value::Object(self.bracket.clone().unwrap_or_default())
    }

    pub fn registration_view(&self) -> RegistrationView {
        RegistrationView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }

    /// Public listing projection. Deliberately excludes the email address.
    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            bracket: self.bracket_or_empty(),
            locked: self.locked,
        }
    }

    pub fn detail(&self) -> EntryDetail {
        EntryDetail {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            bracket: self.bracket_or_empty(),
            locked: self.locked,
            score: self.score,
        }
    }

    pub fn bracket_view(&self) -> BracketView {
        BracketView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            bracket: self.bracket_or_empty(),
            locked: self.locked,
        }
    }

    pub fn leaderboard_row(&self) -> LeaderboardRow {
        LeaderboardRow {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            score: self.score,
            locked: self.locked,
        }
    }
}

/// Response to a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationView {
    pub id: EntryId,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: EntryId,
    pub name: String,
    pub username: Option<String>,
    pub bracket: Value,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetail {
    pub id: EntryId,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub bracket: Value,
    pub locked: bool,
    pub score: i64,
}

/// Backs the frontend "View" button; same as the detail minus the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketView {
    pub id: EntryId,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub bracket: Value,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub id: EntryId,
    pub name: String,
    pub username: Option<String>,
    pub score: i64,
    pub locked: bool,
}

/// Confirmation returned after a bracket is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketReceipt {
    pub status: &'static str,
    pub entry_id: EntryId,
}

impl BracketReceipt {
    pub fn saved(entry_id: EntryId) -> Self {
        Self {
            status: "saved",
            entry_id,
        }
    }
}
