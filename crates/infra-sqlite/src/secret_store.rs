// SQLite SecretStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use openreel_core::error::Result;
use openreel_core::port::{SecretStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Credentials kept in the local database, keyed by account
pub struct SqliteSecretStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteSecretStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl SecretStore for SqliteSecretStore {
    async fn load(&self, account: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT value FROM secrets WHERE account = ?")
            .bind(account)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn save(&self, account: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO secrets (account, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(account) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(account)
        .bind(value)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, account: &str) -> Result<()> {
        sqlx::query("DELETE FROM secrets WHERE account = ?")
            .bind(account)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use openreel_core::port::secret_store::{
        has_kling_credentials, save_or_clear, KLING_ACCESS_KEY_ACCOUNT, KLING_SECRET_KEY_ACCOUNT,
    };
    use openreel_core::port::time_provider::mocks::MockTimeProvider;

    async fn setup_test_db() -> SqliteSecretStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteSecretStore::new(pool, Arc::new(MockTimeProvider::new(1_000)))
    }

    #[tokio::test]
    async fn test_save_load_replace() {
        let store = setup_test_db().await;
        assert_eq!(store.load(KLING_ACCESS_KEY_ACCOUNT).await.unwrap(), None);

        store.save(KLING_ACCESS_KEY_ACCOUNT, "ak-1").await.unwrap();
        store.save(KLING_ACCESS_KEY_ACCOUNT, "ak-2").await.unwrap();
        assert_eq!(
            store.load(KLING_ACCESS_KEY_ACCOUNT).await.unwrap().as_deref(),
            Some("ak-2")
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = setup_test_db().await;
        store.save(KLING_SECRET_KEY_ACCOUNT, "sk").await.unwrap();

        tokio_test::assert_ok!(store.delete(KLING_SECRET_KEY_ACCOUNT).await);
        tokio_test::assert_ok!(store.delete(KLING_SECRET_KEY_ACCOUNT).await);
        assert_eq!(store.load(KLING_SECRET_KEY_ACCOUNT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credentials_detection() {
        let store = setup_test_db().await;
        save_or_clear(&store, KLING_ACCESS_KEY_ACCOUNT, " ak ").await.unwrap();
        assert!(!has_kling_credentials(&store).await.unwrap());

        save_or_clear(&store, KLING_SECRET_KEY_ACCOUNT, "sk").await.unwrap();
        assert!(has_kling_credentials(&store).await.unwrap());

        save_or_clear(&store, KLING_ACCESS_KEY_ACCOUNT, "").await.unwrap();
        assert!(!has_kling_credentials(&store).await.unwrap());
    }
}
