// Domain Layer - Pure business logic and entities

pub mod error;
pub mod generation;

// Re-exports
pub use error::DomainError;
pub use generation::{
    normalize_prompt, AspectRatio, GenerationConfig, GenerationId, GenerationJob, JobHandle,
    JobStatus,
};
