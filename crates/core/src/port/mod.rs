// Port Layer - Interfaces for external dependencies

pub mod bookmark_store;
pub mod generation_repository;
pub mod id_provider; // For deterministic testing
pub mod secret_store;
pub mod simulated_provider;
pub mod time_provider;
pub mod video_provider;

// Re-exports
pub use bookmark_store::BookmarkStore;
pub use generation_repository::GenerationRepository;
pub use id_provider::IdProvider;
pub use secret_store::{InMemorySecretStore, SecretStore};
pub use simulated_provider::SimulatedProvider;
pub use time_provider::TimeProvider;
pub use video_provider::{GenerationStatus, ProviderError, VideoProvider};
