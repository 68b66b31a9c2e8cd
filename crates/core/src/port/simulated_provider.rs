// Simulated Provider
// Local stand-in for the remote backend: fabricates timing-based progress

use crate::domain::{GenerationConfig, JobHandle};
use crate::port::video_provider::{GenerationStatus, ProviderError, VideoProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default simulated render time (2 seconds)
pub const DEFAULT_PROCESSING_DURATION: Duration = Duration::from_secs(2);

pub const SIMULATED_PROVIDER_ID: &str = "mock";

/// Offline provider used when no remote credentials are configured
///
/// Handle start times live behind a mutex so concurrent submit/check calls
/// for different handles never clobber each other.
pub struct SimulatedProvider {
    processing_duration: Duration,
    output_dir: PathBuf,
    jobs: Mutex<HashMap<JobHandle, Instant>>,
}

impl SimulatedProvider {
    pub fn new(processing_duration: Duration) -> Self {
        Self {
            processing_duration,
            output_dir: std::env::temp_dir(),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Override the directory used for synthetic output URLs
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    fn output_url(&self, handle: &str) -> String {
        let path = self.output_dir.join(format!("openreel_mock_{}.mov", handle));
        format!("file://{}", path.display())
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSING_DURATION)
    }
}

#[async_trait]
impl VideoProvider for SimulatedProvider {
    fn provider_id(&self) -> &str {
        SIMULATED_PROVIDER_ID
    }

    async fn submit(
        &self,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<JobHandle, ProviderError> {
        let handle = uuid::Uuid::new_v4().to_string();
        self.jobs.lock().await.insert(handle.clone(), Instant::now());
        debug!(handle = %handle, "Simulated job submitted");
        Ok(handle)
    }

    async fn check_status(&self, handle: &str) -> Result<GenerationStatus, ProviderError> {
        let mut jobs = self.jobs.lock().await;

        let Some(started_at) = jobs.get(handle).copied() else {
            return Ok(GenerationStatus::Failed {
                reason: "Unknown job id.".to_string(),
            });
        };

        let elapsed = started_at.elapsed();
        if elapsed < self.processing_duration {
            let progress =
                (elapsed.as_secs_f64() / self.processing_duration.as_secs_f64()).min(1.0);
            return Ok(GenerationStatus::Processing {
                progress: Some(progress),
            });
        }

        jobs.remove(handle);
        Ok(GenerationStatus::Completed {
            video_url: self.output_url(handle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_of(status: GenerationStatus) -> f64 {
        match status {
            GenerationStatus::Processing { progress: Some(p) } => p,
            other => panic!("expected PROCESSING with progress, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_check_is_processing() {
        let provider = SimulatedProvider::default();
        let handle = provider
            .submit("prompt", &GenerationConfig::default())
            .await
            .unwrap();

        let progress = progress_of(provider.check_status(&handle).await.unwrap());
        assert!(progress < 0.01, "progress should start near zero: {}", progress);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_is_idempotent_without_time_passing() {
        let provider = SimulatedProvider::default();
        let handle = provider
            .submit("prompt", &GenerationConfig::default())
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;

        let first = provider.check_status(&handle).await.unwrap();
        let second = provider.check_status(&handle).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic() {
        let provider = SimulatedProvider::new(Duration::from_secs(10));
        let handle = provider
            .submit("prompt", &GenerationConfig::default())
            .await
            .unwrap();

        let mut last = 0.0;
        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            let progress = progress_of(provider.check_status(&handle).await.unwrap());
            assert!(progress >= last);
            last = progress;
        }
        assert!((last - 0.9).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_duration_with_handle_in_url() {
        let provider = SimulatedProvider::default();
        let handle = provider
            .submit("prompt", &GenerationConfig::default())
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(2100)).await;

        match provider.check_status(&handle).await.unwrap() {
            GenerationStatus::Completed { video_url } => {
                assert!(video_url.starts_with("file://"));
                assert!(video_url.contains(&handle));
            }
            other => panic!("expected COMPLETED, got {:?}", other),
        }

        // Handle is forgotten once completed
        assert_eq!(
            provider.check_status(&handle).await.unwrap(),
            GenerationStatus::Failed {
                reason: "Unknown job id.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_handle_fails() {
        let provider = SimulatedProvider::default();
        let status = provider.check_status("nope").await.unwrap();
        assert_eq!(
            status,
            GenerationStatus::Failed {
                reason: "Unknown job id.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_submits_keep_distinct_entries() {
        let provider = std::sync::Arc::new(SimulatedProvider::new(Duration::from_secs(60)));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let provider = provider.clone();
            handles.push(tokio::spawn(async move {
                provider
                    .submit("prompt", &GenerationConfig::default())
                    .await
                    .unwrap()
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 16);

        for id in &ids {
            assert!(matches!(
                provider.check_status(id).await.unwrap(),
                GenerationStatus::Processing { .. }
            ));
        }
    }
}
