//! Shared state for long-running edit jobs.
//!
//! Workers execute outside the request/response cycle and report progress
//! through an MPSC channel; `start_job_updater` is the single writer that
//! folds those messages into the job map. Handlers only take read locks
//! (status, listing) or short write locks (registration, cancellation).
//!
//! Two rules the updater enforces:
//! - a job that reached a terminal status (`completed`, `error`,
//!   `cancelled`) never changes again, whatever a late worker message says;
//! - progress is clamped to 0..=100.

use chrono::Utc;
use common::jobs::{Job, JobStatus, StatusResponse};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// One tracked job plus the server-side bookkeeping the wire model omits.
#[derive(Clone, Debug)]
pub struct JobEntry {
    pub job: Job,
    pub user_id: i64,
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
}

/// A status message from a background worker.
#[derive(Debug)]
pub struct JobUpdate {
    pub job_id: String,
    pub kind: UpdateKind,
}

#[derive(Debug)]
pub enum UpdateKind {
    Status(JobStatus),
    Progress(u8),
    Completed(PathBuf),
    Failed(String),
}

/// Thread-safe container shared across the Actix app as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
    pub tx: mpsc::Sender<JobUpdate>,
    cancel_flags: Arc<RwLock<HashMap<String, Arc<AtomicBool>>>>,
}

impl JobsState {
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(100);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
            cancel_flags: Arc::new(RwLock::new(HashMap::new())),
        };
        (state, rx)
    }

    /// Registers a freshly accepted upload as `queued` and hands back the
    /// cancellation flag its worker must check between segments.
    pub async fn register(
        &self,
        job_id: &str,
        filename: &str,
        user_id: i64,
        input_path: PathBuf,
    ) -> Arc<AtomicBool> {
        let entry = JobEntry {
            job: Job {
                id: job_id.to_string(),
                filename: filename.to_string(),
                status: JobStatus::Queued,
                progress: 0,
                created_at: Some(Utc::now()),
                output_url: None,
                preview_url: None,
                error: None,
            },
            user_id,
            input_path,
            output_path: None,
        };
        self.jobs.write().await.insert(job_id.to_string(), entry);

        let flag = Arc::new(AtomicBool::new(false));
        self.cancel_flags
            .write()
            .await
            .insert(job_id.to_string(), flag.clone());
        flag
    }

    /// Marks a job cancelled and flips its worker flag. Returns the error
    /// message for the client when the job cannot be cancelled.
    pub async fn cancel(&self, job_id: &str, user_id: i64) -> Result<(), CancelError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .get_mut(job_id)
            .filter(|e| e.user_id == user_id)
            .ok_or(CancelError::NotFound)?;
        if entry.job.status.is_terminal() {
            return Err(CancelError::AlreadyFinished(entry.job.status));
        }
        entry.job.status = JobStatus::Cancelled;

        if let Some(flag) = self.cancel_flags.write().await.remove(job_id) {
            flag.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Status view for the targeted poll endpoint.
    pub async fn status_for(&self, job_id: &str, user_id: i64) -> Option<StatusResponse> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(job_id).filter(|e| e.user_id == user_id)?;
        Some(StatusResponse {
            status: entry.job.status,
            progress: entry.job.progress,
            error: entry.job.error.clone(),
            output_url: entry.job.output_url.clone(),
            preview_url: entry.job.preview_url.clone(),
        })
    }

    /// All jobs owned by `user_id`, newest first.
    pub async fn jobs_for_user(&self, user_id: i64) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut out: Vec<Job> = jobs
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.job.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Output path of a completed job, for `/download/{job_id}`.
    pub async fn output_for(&self, job_id: &str, user_id: i64) -> Option<(PathBuf, String)> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(job_id).filter(|e| e.user_id == user_id)?;
        if entry.job.status != JobStatus::Completed {
            return None;
        }
        entry
            .output_path
            .clone()
            .map(|p| (p, entry.job.filename.clone()))
    }
}

#[derive(Debug)]
pub enum CancelError {
    NotFound,
    AlreadyFinished(JobStatus),
}

/// Central updater task: single consumer of worker messages.
///
/// Spawned once from `main.rs` and kept alive for the process lifetime.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        let Some(entry) = jobs.get_mut(&update.job_id) else {
            log::warn!("update for unknown job {}", update.job_id);
            continue;
        };
        if entry.job.status.is_terminal() {
            // Late worker message after completion/cancellation.
            continue;
        }
        match update.kind {
            UpdateKind::Status(status) => entry.job.status = status,
            UpdateKind::Progress(progress) => entry.job.progress = progress.min(100),
            UpdateKind::Completed(path) => {
                entry.job.status = JobStatus::Completed;
                entry.job.progress = 100;
                entry.job.output_url = Some(format!("/download/{}", entry.job.id));
                entry.output_path = Some(path);
            }
            UpdateKind::Failed(message) => {
                entry.job.status = JobStatus::Error;
                entry.job.error = Some(message);
            }
        }
        if entry.job.status.is_terminal() {
            state.cancel_flags.write().await.remove(&update.job_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn state_with_job(job_id: &str) -> (JobsState, mpsc::Receiver<JobUpdate>) {
        let (state, rx) = JobsState::new();
        state
            .register(job_id, "clip.mp4", 1, PathBuf::from("in.mp4"))
            .await;
        (state, rx)
    }

    fn update(job_id: &str, kind: UpdateKind) -> JobUpdate {
        JobUpdate {
            job_id: job_id.to_string(),
            kind,
        }
    }

    #[tokio::test]
    async fn updater_applies_progress_and_completion() {
        let (state, rx) = state_with_job("j1").await;
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        state
            .tx
            .send(update("j1", UpdateKind::Status(JobStatus::Processing)))
            .await
            .unwrap();
        state
            .tx
            .send(update("j1", UpdateKind::Progress(47)))
            .await
            .unwrap();
        state
            .tx
            .send(update("j1", UpdateKind::Completed(PathBuf::from("out.mp4"))))
            .await
            .unwrap();

        // Wait until the completion is visible.
        for _ in 0..100 {
            if let Some(s) = state.status_for("j1", 1).await {
                if s.status == JobStatus::Completed {
                    break;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let status = state.status_for("j1", 1).await.unwrap();
        assert_eq!(status.status, JobStatus::Completed);
        assert_eq!(status.progress, 100);
        assert_eq!(status.output_url.as_deref(), Some("/download/j1"));
        updater.abort();
    }

    #[tokio::test]
    async fn terminal_status_is_never_overwritten() {
        let (state, rx) = state_with_job("j2").await;
        state
            .register("marker", "m.mp4", 1, PathBuf::from("m.mp4"))
            .await;
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        state.cancel("j2", 1).await.unwrap();

        // A straggler progress update from the worker, then a marker message
        // whose effect we can wait on; the updater is strictly in order.
        state
            .tx
            .send(update("j2", UpdateKind::Progress(80)))
            .await
            .unwrap();
        state
            .tx
            .send(update("marker", UpdateKind::Completed(PathBuf::from("m.out"))))
            .await
            .unwrap();
        for _ in 0..100 {
            if let Some(s) = state.status_for("marker", 1).await {
                if s.status == JobStatus::Completed {
                    break;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let status = state.status_for("j2", 1).await.unwrap();
        assert_eq!(status.status, JobStatus::Cancelled);
        assert_eq!(status.progress, 0);
        updater.abort();
    }

    #[tokio::test]
    async fn cancel_flips_worker_flag_once() {
        let (state, _rx) = JobsState::new();
        let flag = state
            .register("j3", "clip.mp4", 7, PathBuf::from("in.mp4"))
            .await;
        assert!(!flag.load(Ordering::Relaxed));

        state.cancel("j3", 7).await.unwrap();
        assert!(flag.load(Ordering::Relaxed));

        match state.cancel("j3", 7).await {
            Err(CancelError::AlreadyFinished(JobStatus::Cancelled)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_is_scoped_to_the_owner() {
        let (state, _rx) = state_with_job("j4").await;
        assert!(matches!(
            state.cancel("j4", 999).await,
            Err(CancelError::NotFound)
        ));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_per_user() {
        let (state, _rx) = JobsState::new();
        state.register("a", "a.mp4", 1, "a".into()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        state.register("b", "b.mp4", 1, "b".into()).await;
        state.register("c", "c.mp4", 2, "c".into()).await;

        let jobs = state.jobs_for_user(1).await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "b");
        assert_eq!(jobs[1].id, "a");
    }

    #[tokio::test]
    async fn download_only_after_completion() {
        let (state, rx) = state_with_job("j5").await;
        assert!(state.output_for("j5", 1).await.is_none());

        let updater = tokio::spawn(start_job_updater(state.clone(), rx));
        state
            .tx
            .send(update("j5", UpdateKind::Completed(PathBuf::from("o.mp4"))))
            .await
            .unwrap();
        for _ in 0..100 {
            if state.output_for("j5", 1).await.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let (path, filename) = state.output_for("j5", 1).await.unwrap();
        assert_eq!(path, PathBuf::from("o.mp4"));
        assert_eq!(filename, "clip.mp4");
        assert!(state.output_for("j5", 2).await.is_none());
        updater.abort();
    }
}
