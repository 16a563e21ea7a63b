use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::base62;

/// A stored paste.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Paste {
    pub id: u64,
    pub title: Option<String>,
    pub body: String,
    pub syntax: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub delete_after_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl Paste {
    /// Short identifier used in public URLs.
    pub fn url(&self) -> String {
        base62::encode(self.id)
    }

    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        matches!(self.expires_at, Some(exp) if now >= exp)
    }
}

/// Row shape in Postgres, where the id lives in a BIGINT.
#[derive(Debug, FromRow)]
pub struct PasteRow {
    pub id: i64,
    pub title: Option<String>,
    pub body: String,
    pub syntax: String,
    pub password_hash: Option<String>,
    pub delete_after_read: bool,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
}

impl From<PasteRow> for Paste {
    fn from(r: PasteRow) -> Self {
        Self {
            // BIGINT holds the same 64 bits
            id: r.id as u64,
            title: r.title,
            body: r.body,
            syntax: r.syntax,
            password_hash: r.password_hash,
            delete_after_read: r.delete_after_read,
            created_at: r.created_at,
            expires_at: r.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn paste(expires_at: Option<OffsetDateTime>) -> Paste {
        Paste {
            id: 62,
            title: None,
            body: "body".into(),
            syntax: "text".into(),
            password_hash: Some("$argon2id$secret".into()),
            delete_after_read: false,
            created_at: OffsetDateTime::now_utc(),
            expires_at,
        }
    }

    #[test]
    fn url_is_base62_of_id() {
        assert_eq!(paste(None).url(), "10");
    }

    #[test]
    fn expiry_boundaries() {
        let now = OffsetDateTime::now_utc();
        assert!(!paste(None).is_expired_at(now));
        assert!(!paste(Some(now + Duration::seconds(1))).is_expired_at(now));
        assert!(paste(Some(now)).is_expired_at(now));
        assert!(paste(Some(now - Duration::seconds(1))).is_expired_at(now));
    }

    #[test]
    fn row_id_keeps_all_64_bits() {
        let row = PasteRow {
            id: -1,
            title: None,
            body: "b".into(),
            syntax: "s".into(),
            password_hash: None,
            delete_after_read: true,
            created_at: OffsetDateTime::now_utc(),
            expires_at: None,
        };
        assert_eq!(Paste::from(row).id, u64::MAX);
    }

    #[test]
    fn password_hash_not_serialized() {
        let json = serde_json::to_string(&paste(None)).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"delete_after_read\":false"));
    }
}
