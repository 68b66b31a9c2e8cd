// Generation Orchestrator - submit, poll, finalize (one active job at a time)

mod cancel;
pub mod constants;
mod policy;
mod state;

pub use cancel::{cancel_channel, CancelHandle, CancelToken};
pub use policy::PollPolicy;
pub use state::{GenerationPhase, GenerationState};

use crate::domain::{normalize_prompt, GenerationConfig, GenerationId, GenerationJob};
use crate::error::{AppError, Result};
use crate::port::{
    GenerationRepository, GenerationStatus, IdProvider, TimeProvider, VideoProvider,
};
use constants::{CANCELLED_MESSAGE, TIMEOUT_REASON};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// The polling task currently owning a job
struct ActiveGeneration {
    job_id: GenerationId,
    cancel: CancelHandle,
    handle: JoinHandle<()>,
}

/// Generation service (single-writer orchestrator)
///
/// Starting a new job cancels the previous polling task and waits for it
/// to exit before the new job is written, so two tasks never persist
/// concurrently.
pub struct GenerationService {
    provider: Arc<dyn VideoProvider>,
    repo: Arc<dyn GenerationRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    policy: PollPolicy,
    state_tx: Arc<watch::Sender<GenerationState>>,
    active: Mutex<Option<ActiveGeneration>>,
}

impl GenerationService {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        repo: Arc<dyn GenerationRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let (state_tx, _) = watch::channel(GenerationState::default());
        Self {
            provider,
            repo,
            id_provider,
            time_provider,
            policy: PollPolicy::default(),
            state_tx: Arc::new(state_tx),
            active: Mutex::new(None),
        }
    }

    /// Override the polling policy
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> GenerationState {
        self.state_tx.borrow().clone()
    }

    /// Start a new generation
    ///
    /// Validation failures are returned before any record is created.
    /// Any previous polling task is cancelled; its record is left as last persisted.
    pub async fn start(&self, prompt: &str, config: GenerationConfig) -> Result<GenerationId> {
        let prompt = normalize_prompt(prompt).map_err(AppError::from_validation)?;
        config.validate().map_err(AppError::from_validation)?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            info!(job_id = %previous.job_id, "Cancelling previous generation");
            stop(previous).await;
        }

        let job = GenerationJob::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            prompt,
            config,
            self.provider.provider_id(),
        );
        let job_id = job.id.clone();

        info!(
            job_id = %job_id,
            provider = %job.provider_id,
            aspect_ratio = %config.aspect_ratio,
            duration_seconds = config.duration_seconds,
            "Generation queued"
        );

        let insert_error = match self.repo.insert(&job).await {
            Ok(()) => None,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to insert generation record");
                Some(save_failure_message(&e))
            }
        };

        self.state_tx.send_replace(GenerationState {
            phase: GenerationPhase::Submitting,
            job_id: Some(job_id.clone()),
            progress: None,
            message: insert_error,
        });

        let (cancel, token) = cancel_channel();
        let run = GenerationRun {
            provider: Arc::clone(&self.provider),
            repo: Arc::clone(&self.repo),
            time_provider: Arc::clone(&self.time_provider),
            policy: self.policy,
            state_tx: Arc::clone(&self.state_tx),
            cancel: token,
            job,
        };
        let handle = tokio::spawn(run.run());

        *active = Some(ActiveGeneration {
            job_id: job_id.clone(),
            cancel,
            handle,
        });

        Ok(job_id)
    }

    /// Cancel the active polling task, if any
    ///
    /// Returns true if a running task was stopped. The job record keeps its
    /// last persisted state.
    pub async fn cancel(&self) -> bool {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(previous) if !previous.handle.is_finished() => {
                info!(job_id = %previous.job_id, "Cancelling generation");
                stop(previous).await;
                true
            }
            _ => false,
        }
    }

    /// True while a polling task is running
    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    /// Wait until the current generation leaves SUBMITTING/POLLING
    pub async fn wait(&self) -> GenerationState {
        let mut rx = self.state_tx.subscribe();
        let settled = rx
            .wait_for(|state| !state.phase.is_active())
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }
}

/// Cancel a polling task and wait for it to exit
async fn stop(run: ActiveGeneration) {
    run.cancel.cancel();
    if let Err(e) = run.handle.await {
        if e.is_panic() {
            error!(job_id = %run.job_id, "Polling task panicked: {:?}", e);
        }
    }
}

fn save_failure_message(err: &AppError) -> String {
    format!("Failed to save generation: {}", err)
}

/// One submission + polling lifecycle, owned by a spawned task
struct GenerationRun {
    provider: Arc<dyn VideoProvider>,
    repo: Arc<dyn GenerationRepository>,
    time_provider: Arc<dyn TimeProvider>,
    policy: PollPolicy,
    state_tx: Arc<watch::Sender<GenerationState>>,
    cancel: CancelToken,
    job: GenerationJob,
}

impl GenerationRun {
    async fn run(mut self) {
        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return self.on_cancelled(),
            result = self.provider.submit(&self.job.prompt, &self.job.config) => result,
        };
        if self.cancel.is_cancelled() {
            return self.on_cancelled();
        }

        let handle = match submitted {
            Ok(handle) => handle,
            Err(e) => {
                warn!(job_id = %self.job.id, error = %e, "Submission failed");
                return self.finish_failed(e.to_string(), GenerationPhase::Failed).await;
            }
        };

        info!(job_id = %self.job.id, handle = %handle, "Generation submitted");

        if let Err(e) = self.job.mark_processing(None) {
            error!(job_id = %self.job.id, error = %e, "Unexpected state after submit");
            return;
        }
        let save_error = self.persist().await;
        self.publish(GenerationPhase::Polling, None, save_error);

        self.poll(&handle).await;
    }

    async fn poll(&mut self, handle: &str) {
        let started_at = Instant::now();
        let deadline_at = started_at + self.policy.deadline;

        loop {
            if self.cancel.is_cancelled() {
                return self.on_cancelled();
            }

            let now = Instant::now();
            let elapsed = now - started_at;
            if self.policy.is_expired(elapsed) {
                return self.on_timed_out(started_at).await;
            }

            let interval = self.policy.interval_for(elapsed).min(deadline_at - now);
            debug!(
                job_id = %self.job.id,
                elapsed_secs = elapsed.as_secs(),
                interval_ms = interval.as_millis() as u64,
                "Waiting before next status check"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.on_cancelled(),
                _ = sleep(interval) => {}
            }

            // A slow status call never outlives the deadline
            let status = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.on_cancelled(),
                status = self.provider.check_status(handle) => status,
                _ = sleep_until(deadline_at) => return self.on_timed_out(started_at).await,
            };
            if self.cancel.is_cancelled() {
                return self.on_cancelled();
            }

            match status {
                Ok(GenerationStatus::Processing { progress }) => {
                    if let Err(e) = self.job.mark_processing(progress) {
                        error!(job_id = %self.job.id, error = %e, "Rejected progress update");
                        return;
                    }
                    debug!(job_id = %self.job.id, progress = ?progress, "Generation in progress");
                    let save_error = self.persist().await;
                    self.publish(GenerationPhase::Polling, self.job.progress(), save_error);
                }
                Ok(GenerationStatus::Completed { video_url }) => {
                    let now = self.time_provider.now_millis();
                    if let Err(e) = self.job.complete(video_url, now) {
                        error!(job_id = %self.job.id, error = %e, "Rejected completion");
                        return;
                    }
                    info!(
                        job_id = %self.job.id,
                        elapsed_secs = started_at.elapsed().as_secs(),
                        "Generation completed"
                    );
                    let save_error = self.persist().await;
                    self.publish(GenerationPhase::Completed, Some(1.0), save_error);
                    return;
                }
                Ok(GenerationStatus::Failed { reason }) => {
                    warn!(job_id = %self.job.id, reason = %reason, "Provider reported failure");
                    return self.finish_failed(reason, GenerationPhase::Failed).await;
                }
                Err(e) => {
                    warn!(job_id = %self.job.id, error = %e, "Status check failed");
                    return self
                        .finish_failed(e.to_string(), GenerationPhase::Failed)
                        .await;
                }
            }
        }
    }

    async fn finish_failed(&mut self, reason: String, phase: GenerationPhase) {
        let now = self.time_provider.now_millis();
        if let Err(e) = self.job.fail(reason.clone(), now) {
            error!(job_id = %self.job.id, error = %e, "Rejected failure transition");
            return;
        }
        let save_error = self.persist().await;
        let message = match save_error {
            Some(save_error) => format!("{} ({})", reason, save_error),
            None => reason,
        };
        self.publish(phase, self.job.progress(), Some(message));
    }

    async fn on_timed_out(&mut self, started_at: Instant) {
        warn!(
            job_id = %self.job.id,
            elapsed_secs = started_at.elapsed().as_secs(),
            "Generation deadline exceeded"
        );
        self.finish_failed(TIMEOUT_REASON.to_string(), GenerationPhase::TimedOut)
            .await
    }

    fn on_cancelled(&self) {
        info!(job_id = %self.job.id, status = %self.job.status, "Polling task cancelled");
        self.publish(
            GenerationPhase::Cancelled,
            self.job.progress(),
            Some(CANCELLED_MESSAGE.to_string()),
        );
    }

    /// Write the snapshot; failures are reported, never propagated
    async fn persist(&self) -> Option<String> {
        match self.repo.save(&self.job).await {
            Ok(()) => None,
            Err(e) => {
                error!(job_id = %self.job.id, error = %e, "Failed to persist generation");
                Some(save_failure_message(&e))
            }
        }
    }

    fn publish(&self, phase: GenerationPhase, progress: Option<f64>, message: Option<String>) {
        self.state_tx.send_replace(GenerationState {
            phase,
            job_id: Some(self.job.id.clone()),
            progress,
            message,
        });
    }
}
