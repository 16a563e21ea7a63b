use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Paste;

/// Input to `PasteService::create`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPaste {
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
    pub syntax: String,
    /// Plaintext; hashed before storage.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub delete_after_read: bool,
    /// Time to live in seconds. Missing means the service default.
    #[serde(default)]
    pub expires_in_secs: Option<i64>,
}

/// Paste as returned over HTTP, with its short identifier.
#[derive(Debug, Serialize)]
pub struct PasteResponse {
    pub short_id: String,
    #[serde(flatten)]
    pub paste: Paste,
    pub protected: bool,
}

impl From<Paste> for PasteResponse {
    fn from(paste: Paste) -> Self {
        Self {
            short_id: paste.url(),
            protected: paste.is_protected(),
            paste,
        }
    }
}

/// Answer to a create request: enough to build the share link.
#[derive(Debug, Serialize)]
pub struct CreatedPaste {
    pub short_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}
