// Generation Repository Port (Persistence Sink)

use crate::domain::{GenerationId, GenerationJob};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for generation records
///
/// The orchestrator hands over a full snapshot on every transition.
#[async_trait]
pub trait GenerationRepository: Send + Sync {
    /// Insert a new record
    async fn insert(&self, job: &GenerationJob) -> Result<()>;

    /// Durably write the current snapshot of an existing record
    async fn save(&self, job: &GenerationJob) -> Result<()>;

    /// Find record by ID
    async fn find_by_id(&self, id: &GenerationId) -> Result<Option<GenerationJob>>;

    /// Most recent records first
    async fn list_recent(&self, limit: usize) -> Result<Vec<GenerationJob>>;

    /// Remove a record (browsing side only, never called by the orchestrator)
    async fn delete(&self, id: &GenerationId) -> Result<bool>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory repository that records every write
    #[derive(Default)]
    pub struct InMemoryGenerationRepository {
        jobs: Mutex<Vec<GenerationJob>>,
        history: Mutex<Vec<GenerationJob>>,
        fail_saves: AtomicBool,
    }

    impl InMemoryGenerationRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent `save` fail
        pub fn set_fail_saves(&self, fail: bool) {
            self.fail_saves.store(fail, Ordering::SeqCst);
        }

        /// Every snapshot written so far, in order
        pub fn history(&self) -> Vec<GenerationJob> {
            self.history.lock().unwrap().clone()
        }

        pub fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn upsert(&self, job: &GenerationJob) {
            let mut jobs = self.jobs.lock().unwrap();
            match jobs.iter_mut().find(|j| j.id == job.id) {
                Some(existing) => *existing = job.clone(),
                None => jobs.push(job.clone()),
            }
            self.history.lock().unwrap().push(job.clone());
        }
    }

    #[async_trait]
    impl GenerationRepository for InMemoryGenerationRepository {
        async fn insert(&self, job: &GenerationJob) -> Result<()> {
            self.upsert(job);
            Ok(())
        }

        async fn save(&self, job: &GenerationJob) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(AppError::Database("disk full".to_string()));
            }
            self.upsert(job);
            Ok(())
        }

        async fn find_by_id(&self, id: &GenerationId) -> Result<Option<GenerationJob>> {
            Ok(self.jobs.lock().unwrap().iter().find(|j| &j.id == id).cloned())
        }

        async fn list_recent(&self, limit: usize) -> Result<Vec<GenerationJob>> {
            let mut jobs = self.jobs.lock().unwrap().clone();
            jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            jobs.truncate(limit);
            Ok(jobs)
        }

        async fn delete(&self, id: &GenerationId) -> Result<bool> {
            let mut jobs = self.jobs.lock().unwrap();
            let before = jobs.len();
            jobs.retain(|j| &j.id != id);
            Ok(jobs.len() != before)
        }
    }
}
