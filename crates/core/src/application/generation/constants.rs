// Generation polling constants (No magic values)
use std::time::Duration;

/// Poll interval while a job is young (5s)
pub const FAST_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll interval once a job counts as slow (10s)
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Age after which polling switches to the slow interval (30s)
pub const SLOW_POLL_THRESHOLD: Duration = Duration::from_secs(30);

/// Hard deadline for a single generation (5 minutes)
pub const GENERATION_DEADLINE: Duration = Duration::from_secs(300);

/// Failure reason recorded when the deadline expires
pub const TIMEOUT_REASON: &str = "generation timed out";

/// Status message published when a polling task is cancelled
pub const CANCELLED_MESSAGE: &str = "Generation cancelled.";
