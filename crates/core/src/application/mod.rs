// Application Layer - Use Cases and Business Logic

pub mod generation;

// Re-exports
pub use generation::{GenerationPhase, GenerationService, GenerationState, PollPolicy};
