// Composition root: stores, providers and the generation service

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Cli;
use openreel_core::application::GenerationService;
use openreel_core::port::id_provider::UuidProvider;
use openreel_core::port::secret_store::has_kling_credentials;
use openreel_core::port::time_provider::SystemTimeProvider;
use openreel_core::port::{
    BookmarkStore, GenerationRepository, SecretStore, SimulatedProvider, TimeProvider,
    VideoProvider,
};
use openreel_infra_kling::KlingProvider;
use openreel_infra_sqlite::{
    create_pool, run_migrations, SqliteBookmarkStore, SqliteGenerationRepository,
    SqliteSecretStore,
};

pub struct Studio {
    pub secrets: Arc<dyn SecretStore>,
    pub repo: Arc<dyn GenerationRepository>,
    pub bookmarks: Arc<dyn BookmarkStore>,
    time_provider: Arc<dyn TimeProvider>,
    kling_base_url: String,
    http_timeout: Duration,
    mock_duration: Duration,
}

impl Studio {
    /// Open the database, run migrations and wire the adapters
    pub async fn open(cli: &Cli) -> Result<Self> {
        let db_path = cli.database_path();
        if !cli.is_in_memory() {
            if let Some(parent) = Path::new(&db_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        info!(db_path = %db_path, "Initializing database...");
        let pool = create_pool(&db_path)
            .await
            .context("DB pool creation failed")?;
        run_migrations(&pool).await.context("Migration failed")?;

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

        Ok(Self {
            secrets: Arc::new(SqliteSecretStore::new(pool.clone(), time_provider.clone())),
            repo: Arc::new(SqliteGenerationRepository::new(pool.clone())),
            bookmarks: Arc::new(SqliteBookmarkStore::new(pool, time_provider.clone())),
            time_provider,
            kling_base_url: cli.kling_base_url.clone(),
            http_timeout: cli.http_timeout(),
            mock_duration: cli.mock_duration(),
        })
    }

    /// Kling when both keys are stored, the simulated provider otherwise
    pub async fn select_provider(&self) -> Result<Arc<dyn VideoProvider>> {
        if has_kling_credentials(self.secrets.as_ref()).await? {
            let provider = KlingProvider::new(
                &self.kling_base_url,
                self.secrets.clone(),
                self.time_provider.clone(),
                self.http_timeout,
            )?;
            Ok(Arc::new(provider))
        } else {
            Ok(Arc::new(SimulatedProvider::new(self.mock_duration)))
        }
    }

    pub async fn generation_service(&self) -> Result<GenerationService> {
        let provider = self.select_provider().await?;
        info!(provider = %provider.provider_id(), "Provider selected");

        Ok(GenerationService::new(
            provider,
            self.repo.clone(),
            Arc::new(UuidProvider),
            self.time_provider.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use openreel_core::port::secret_store::{
        save_or_clear, KLING_ACCESS_KEY_ACCOUNT, KLING_SECRET_KEY_ACCOUNT,
    };

    async fn in_memory_studio() -> Studio {
        let cli = Cli::try_parse_from(["openreel", "--db-path", "sqlite::memory:", "history"])
            .unwrap();
        Studio::open(&cli).await.unwrap()
    }

    #[tokio::test]
    async fn test_simulated_provider_without_keys() {
        let studio = in_memory_studio().await;
        let provider = tokio_test::assert_ok!(studio.select_provider().await);
        assert_eq!(provider.provider_id(), "mock");
    }

    #[tokio::test]
    async fn test_kling_provider_with_both_keys() {
        let studio = in_memory_studio().await;
        let secrets = studio.secrets.as_ref();

        save_or_clear(secrets, KLING_ACCESS_KEY_ACCOUNT, "ak").await.unwrap();
        assert_eq!(studio.select_provider().await.unwrap().provider_id(), "mock");

        save_or_clear(secrets, KLING_SECRET_KEY_ACCOUNT, "sk").await.unwrap();
        assert_eq!(studio.select_provider().await.unwrap().provider_id(), "kling");

        save_or_clear(secrets, KLING_SECRET_KEY_ACCOUNT, "   ").await.unwrap();
        assert_eq!(studio.select_provider().await.unwrap().provider_id(), "mock");
    }
}
