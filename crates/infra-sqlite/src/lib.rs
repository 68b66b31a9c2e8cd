// OpenReel Infrastructure - SQLite Adapter
// Implements: GenerationRepository, SecretStore, BookmarkStore

mod bookmark_store;
mod connection;
mod error;
mod generation_repository;
mod migration;
mod secret_store;

pub use bookmark_store::SqliteBookmarkStore;
pub use connection::create_pool;
pub use generation_repository::SqliteGenerationRepository;
pub use migration::run_migrations;
pub use secret_store::SqliteSecretStore;
