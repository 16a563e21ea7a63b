use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    error::AppResult,
    pastes::repo_types::{Paste, PasteRow},
    store::PasteStore,
};

/// Pastes in Postgres. Ids are random u64 values stored bit-for-bit in a
/// BIGINT primary key.
#[derive(Clone)]
pub struct PgPasteStore {
    db: PgPool,
}

impl PgPasteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PasteStore for PgPasteStore {
    async fn create(&self, paste: &Paste) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pastes
                (id, title, body, syntax, password_hash, delete_after_read, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(paste.id as i64)
        .bind(&paste.title)
        .bind(&paste.body)
        .bind(&paste.syntax)
        .bind(&paste.password_hash)
        .bind(paste.delete_after_read)
        .bind(paste.created_at)
        .bind(paste.expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find(&self, id: u64) -> AppResult<Option<Paste>> {
        let row = sqlx::query_as::<_, PasteRow>(
            r#"
            SELECT id, title, body, syntax, password_hash, delete_after_read, created_at, expires_at
            FROM pastes
            WHERE id = $1
            "#,
        )
        .bind(id as i64)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Paste::from))
    }

    async fn take(&self, id: u64) -> AppResult<Option<Paste>> {
        // a single DELETE .. RETURNING: concurrent takers race on the row lock
        // and only one of them gets it back
        let row = sqlx::query_as::<_, PasteRow>(
            r#"
            DELETE FROM pastes
            WHERE id = $1
            RETURNING id, title, body, syntax, password_hash, delete_after_read, created_at, expires_at
            "#,
        )
        .bind(id as i64)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Paste::from))
    }

    async fn delete(&self, id: u64) -> AppResult<()> {
        sqlx::query("DELETE FROM pastes WHERE id = $1")
            .bind(id as i64)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AppResult<u64> {
        let res = sqlx::query("DELETE FROM pastes WHERE expires_at IS NOT NULL AND expires_at <= $1")
            .bind(now)
            .execute(&self.db)
            .await?;
        debug!(removed = res.rows_affected(), "expired pastes purged");
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Arc;

    async fn store() -> PgPasteStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = crate::db::connect(&url).await.expect("connect");
        PgPasteStore::new(db)
    }

    fn paste(id: u64) -> Paste {
        Paste {
            id,
            title: None,
            body: "hello".into(),
            syntax: "text".into(),
            password_hash: None,
            delete_after_read: true,
            // postgres keeps microseconds
            created_at: OffsetDateTime::now_utc().replace_nanosecond(0).unwrap(),
            expires_at: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn create_find_take_delete() {
        let store = store().await;
        let id = rand::random::<u64>() | (1 << 63); // exercise the sign bit
        let p = paste(id);

        store.create(&p).await.unwrap();
        assert!(matches!(store.create(&p).await, Err(AppError::Duplicate(_))));
        assert_eq!(store.find(id).await.unwrap(), Some(p.clone()));
        assert_eq!(store.take(id).await.unwrap(), Some(p));
        assert_eq!(store.take(id).await.unwrap(), None);
        store.delete(id).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires DATABASE_URL"]
    async fn concurrent_take_yields_one_winner() {
        let store = Arc::new(store().await);
        let id = rand::random::<u64>();
        store.create(&paste(id)).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take(id).await.unwrap().is_some() })
            })
            .collect();
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
