// Generation Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Generation ID (UUID v4)
pub type GenerationId = String;

/// Provider-side job handle. Only meaningful to the provider that issued it.
pub type JobHandle = String;

/// Shortest clip a provider accepts (seconds)
pub const MIN_DURATION_SECONDS: u8 = 1;

/// Longest clip a provider accepts (seconds)
pub const MAX_DURATION_SECONDS: u8 = 10;

/// Output aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(DomainError::ValidationError(format!(
                "Unsupported aspect ratio: {}",
                other
            ))),
        }
    }
}

/// Generation parameters sent to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub aspect_ratio: AspectRatio,
    pub duration_seconds: u8,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Landscape,
            duration_seconds: 4,
        }
    }
}

impl GenerationConfig {
    pub fn new(aspect_ratio: AspectRatio, duration_seconds: u8) -> Self {
        Self {
            aspect_ratio,
            duration_seconds,
        }
    }

    /// Reject durations outside the provider range
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&self.duration_seconds) {
            return Err(DomainError::ValidationError(format!(
                "Duration must be between {} and {} seconds (got {})",
                MIN_DURATION_SECONDS, MAX_DURATION_SECONDS, self.duration_seconds
            )));
        }
        Ok(())
    }
}

/// Trim a prompt and reject it if nothing is left
pub fn normalize_prompt(prompt: &str) -> Result<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(DomainError::ValidationError(
            "Prompt must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Persisted job status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing { progress: Option<f64> },
    Completed { remote_url: String },
    Failed { reason: String },
}

impl JobStatus {
    /// Status label as stored in the database
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing { .. } => "PROCESSING",
            JobStatus::Completed { .. } => "COMPLETED",
            JobStatus::Failed { .. } => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Generation Job Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: GenerationId,
    pub prompt: String,
    pub config: GenerationConfig,
    pub provider_id: String,
    pub status: JobStatus,

    pub created_at: i64, // epoch ms
    pub finished_at: Option<i64>,

    pub error_message: Option<String>,
}

impl GenerationJob {
    /// Create a new job in QUEUED state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `prompt` - Already-normalized prompt
    /// * `config` - Generation parameters
    /// * `provider_id` - Provider that will own the job
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        prompt: impl Into<String>,
        config: GenerationConfig,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            config,
            provider_id: provider_id.into(),
            status: JobStatus::Queued,
            created_at,
            finished_at: None,
            error_message: None,
        }
    }

    /// Last reported progress, 1.0 once completed
    pub fn progress(&self) -> Option<f64> {
        match &self.status {
            JobStatus::Processing { progress } => *progress,
            JobStatus::Completed { .. } => Some(1.0),
            _ => None,
        }
    }

    pub fn remote_url(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Completed { remote_url } => Some(remote_url),
            _ => None,
        }
    }

    fn ensure_not_terminal(&self, to: &str) -> Result<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// QUEUED/PROCESSING -> PROCESSING (progress clamped to [0, 1])
    pub fn mark_processing(&mut self, progress: Option<f64>) -> Result<()> {
        self.ensure_not_terminal("PROCESSING")?;
        self.status = JobStatus::Processing {
            progress: progress.map(|p| p.clamp(0.0, 1.0)),
        };
        Ok(())
    }

    /// PROCESSING -> COMPLETED with explicit timestamp
    pub fn complete(&mut self, remote_url: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_not_terminal("COMPLETED")?;
        self.status = JobStatus::Completed {
            remote_url: remote_url.into(),
        };
        self.finished_at = Some(now_millis);
        self.error_message = None;
        Ok(())
    }

    /// Any non-terminal state -> FAILED with explicit timestamp
    pub fn fail(&mut self, reason: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_not_terminal("FAILED")?;
        let reason = reason.into();
        self.status = JobStatus::Failed {
            reason: reason.clone(),
        };
        self.finished_at = Some(now_millis);
        self.error_message = Some(reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> GenerationJob {
        GenerationJob::new(
            "gen-1",
            1_000,
            "a cat surfing",
            GenerationConfig::default(),
            "mock",
        )
    }

    #[test]
    fn test_prompt_is_trimmed() {
        assert_eq!(normalize_prompt("  sunset \n").unwrap(), "sunset");
    }

    #[test]
    fn test_blank_prompt_rejected() {
        assert!(normalize_prompt("").is_err());
        assert!(normalize_prompt(" \t\n ").is_err());
    }

    #[test]
    fn test_duration_bounds() {
        assert!(GenerationConfig::new(AspectRatio::Square, 1).validate().is_ok());
        assert!(GenerationConfig::new(AspectRatio::Square, 10).validate().is_ok());
        assert!(GenerationConfig::new(AspectRatio::Square, 0).validate().is_err());
        assert!(GenerationConfig::new(AspectRatio::Square, 11).validate().is_err());
    }

    #[test]
    fn test_aspect_ratio_parsing() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!(AspectRatio::Square.to_string(), "1:1");
        assert!("4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_lifecycle_to_completed() {
        let mut job = job();
        assert_eq!(job.status, JobStatus::Queued);

        job.mark_processing(None).unwrap();
        job.mark_processing(Some(0.4)).unwrap();
        assert_eq!(job.progress(), Some(0.4));

        job.complete("https://cdn.example.com/v.mp4", 5_000).unwrap();
        assert_eq!(job.remote_url(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(job.progress(), Some(1.0));
        assert_eq!(job.finished_at, Some(5_000));
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_fail_sets_error_message() {
        let mut job = job();
        job.fail("invalid token", 2_000).unwrap();
        assert_eq!(job.error_message.as_deref(), Some("invalid token"));
        assert_eq!(job.finished_at, Some(2_000));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = job();
        job.complete("file:///tmp/x.mov", 3_000).unwrap();

        assert!(job.mark_processing(Some(0.5)).is_err());
        assert!(job.fail("late failure", 4_000).is_err());
        assert!(job.complete("file:///tmp/y.mov", 4_000).is_err());
        assert_eq!(job.finished_at, Some(3_000));
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut job = job();
        job.mark_processing(Some(1.7)).unwrap();
        assert_eq!(job.progress(), Some(1.0));
    }
}
