// Observable generation session state
use crate::domain::GenerationId;
use serde::Serialize;

/// Orchestrator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl GenerationPhase {
    /// True while a polling task owns the job
    pub fn is_active(&self) -> bool {
        matches!(self, GenerationPhase::Submitting | GenerationPhase::Polling)
    }
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GenerationPhase::Idle => "IDLE",
            GenerationPhase::Submitting => "SUBMITTING",
            GenerationPhase::Polling => "POLLING",
            GenerationPhase::Completed => "COMPLETED",
            GenerationPhase::Failed => "FAILED",
            GenerationPhase::TimedOut => "TIMED_OUT",
            GenerationPhase::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Snapshot published to observers on every transition
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct GenerationState {
    pub phase: GenerationPhase,
    pub job_id: Option<GenerationId>,
    pub progress: Option<f64>,
    /// Transient status or error message
    pub message: Option<String>,
}
