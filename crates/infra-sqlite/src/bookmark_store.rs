// SQLite BookmarkStore Implementation
// Output folder lives in the settings table

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use openreel_core::error::{AppError, Result};
use openreel_core::port::{BookmarkStore, TimeProvider};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const OUTPUT_FOLDER_KEY: &str = "output_folder";

pub struct SqliteBookmarkStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteBookmarkStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl BookmarkStore for SqliteBookmarkStore {
    async fn save(&self, path: &Path) -> Result<()> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_dir() {
            return Err(AppError::Validation(format!(
                "Not a directory: {}",
                path.display()
            )));
        }

        let path = tokio::fs::canonicalize(path).await?;
        let value = path.to_str().ok_or_else(|| {
            AppError::Validation(format!("Path is not valid UTF-8: {}", path.display()))
        })?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(OUTPUT_FOLDER_KEY)
        .bind(value)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(path = %value, "Output folder saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<PathBuf>> {
        let stored: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(OUTPUT_FOLDER_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(stored) = stored else {
            return Ok(None);
        };

        let path = PathBuf::from(stored);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => Ok(Some(path)),
            _ => {
                warn!(path = %path.display(), "Stored output folder is stale");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use openreel_core::port::time_provider::mocks::MockTimeProvider;

    async fn setup_test_db() -> SqliteBookmarkStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookmarkStore::new(pool, Arc::new(MockTimeProvider::new(1_000)))
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "openreel-bookmark-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_unset_is_none() {
        let store = setup_test_db().await;
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = setup_test_db().await;
        let dir = scratch_dir("save");

        store.save(&dir).await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some(std::fs::canonicalize(&dir).unwrap())
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_stale_folder_is_none() {
        let store = setup_test_db().await;
        let dir = scratch_dir("stale");

        store.save(&dir).await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_missing_or_file_path() {
        let store = setup_test_db().await;
        let dir = scratch_dir("file");
        let file = dir.join("clip.mov");
        std::fs::write(&file, b"").unwrap();

        assert!(matches!(
            store.save(&file).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.save(&dir.join("missing")).await,
            Err(AppError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
