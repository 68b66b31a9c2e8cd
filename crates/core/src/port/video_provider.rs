// Video Provider Port
// Abstraction over the compute backend that renders a generation job

use crate::domain::{GenerationConfig, JobHandle};
use async_trait::async_trait;
use thiserror::Error;

/// Status reported by a provider for a submitted job
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationStatus {
    Processing { progress: Option<f64> },
    Completed { video_url: String },
    Failed { reason: String },
}

/// Provider errors
///
/// The display text of each variant becomes the job's failure reason,
/// so HTTP errors render as the server-supplied message only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider credentials are missing.")]
    MissingCredentials,

    #[error("Failed to encode request: {0}")]
    Encoding(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Provider reported completion without a video URL.")]
    MissingVideoUrl,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Video Provider trait
///
/// Implementations:
/// - SimulatedProvider: local timing-based stand-in ("mock")
/// - KlingProvider: signed HTTP calls against the Kling API ("kling")
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Identifier recorded on every job this provider owns
    fn provider_id(&self) -> &str;

    /// Submit a job and return the provider's handle for it
    ///
    /// # Errors
    /// - ProviderError::MissingCredentials if the request cannot be signed
    /// - ProviderError::Http / Transport on network failure
    /// - ProviderError::InvalidResponse if no job id is returned
    async fn submit(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<JobHandle, ProviderError>;

    /// Check the status of a submitted job (single round trip, idempotent)
    async fn check_status(&self, handle: &str) -> Result<GenerationStatus, ProviderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Scripted provider for testing
    ///
    /// `check_status` replays the scripted responses in order and keeps
    /// repeating the last one once the script runs out.
    pub struct ScriptedProvider {
        submit_result: Result<JobHandle, ProviderError>,
        script: Arc<Mutex<VecDeque<Result<GenerationStatus, ProviderError>>>>,
        last: Arc<Mutex<Result<GenerationStatus, ProviderError>>>,
        submit_count: Arc<Mutex<usize>>,
        check_count: Arc<Mutex<usize>>,
        check_latency: Duration,
    }

    impl ScriptedProvider {
        pub fn new(script: Vec<Result<GenerationStatus, ProviderError>>) -> Self {
            Self {
                submit_result: Ok("scripted-job".to_string()),
                script: Arc::new(Mutex::new(script.into_iter().collect())),
                last: Arc::new(Mutex::new(Ok(GenerationStatus::Processing { progress: None }))),
                submit_count: Arc::new(Mutex::new(0)),
                check_count: Arc::new(Mutex::new(0)),
                check_latency: Duration::ZERO,
            }
        }

        /// Provider that never leaves PROCESSING
        pub fn new_stuck() -> Self {
            Self::new(vec![])
        }

        /// Provider whose submit call fails
        pub fn new_submit_failure(err: ProviderError) -> Self {
            let mut provider = Self::new(vec![]);
            provider.submit_result = Err(err);
            provider
        }

        /// Delay every status check by `latency`
        pub fn with_check_latency(mut self, latency: Duration) -> Self {
            self.check_latency = latency;
            self
        }

        pub fn submit_count(&self) -> usize {
            *self.submit_count.lock().unwrap()
        }

        pub fn check_count(&self) -> usize {
            *self.check_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl VideoProvider for ScriptedProvider {
        fn provider_id(&self) -> &str {
            "scripted"
        }

        async fn submit(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<JobHandle, ProviderError> {
            *self.submit_count.lock().unwrap() += 1;
            self.submit_result.clone()
        }

        async fn check_status(&self, _handle: &str) -> Result<GenerationStatus, ProviderError> {
            *self.check_count.lock().unwrap() += 1;
            if !self.check_latency.is_zero() {
                tokio::time::sleep(self.check_latency).await;
            }

            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(result) => {
                    *self.last.lock().unwrap() = result.clone();
                    result
                }
                None => self.last.lock().unwrap().clone(),
            }
        }
    }
}
