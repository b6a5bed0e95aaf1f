//! Client-side job polling protocol.
//!
//! After a submission is accepted, the client polls `GET /status/{job_id}`
//! on a fixed interval until the server reports a terminal status. This
//! module holds the protocol as a plain state machine with no timers and no
//! I/O, so the lifecycle rules can be tested deterministically on any
//! target; the frontend owns the actual interval handle and feeds responses
//! in as they arrive.
//!
//! Rules the session enforces:
//! - transitions are driven only by server responses, the client never
//!   invents one;
//! - a terminal status finishes the session exactly once; anything observed
//!   afterwards is reported as [`PollOutcome::AlreadyFinished`] and must not
//!   retrigger side effects;
//! - rendered progress is the latest server value clamped to 0..=100, with
//!   no client-side interpolation;
//! - transport or decode failures are tolerated: the session stays live and
//!   the caller retries on the next tick.

use serde::{Deserialize, Serialize};

use super::{JobStatus, StatusResponse};

/// Targeted poll cadence while a submission is active.
pub const STATUS_POLL_MS: u32 = 1_000;

/// Background job-list refresh cadence, alive for the whole page.
pub const LIST_REFRESH_MS: u32 = 3_000;

/// Terminal observation extracted from the last status response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    /// Success. Either url may be absent; when both are present the
    /// preview link is the one offered to the user first.
    Completed {
        preview_url: Option<String>,
        output_url: Option<String>,
    },
    /// Server-reported failure; `message` is shown verbatim when present.
    Error { message: Option<String> },
    Cancelled,
}

/// What the caller should do after feeding one response into the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Job still running: keep the timer, render the new progress/label.
    Continue,
    /// Terminal status observed for the first time: stop the timer,
    /// re-enable controls, apply the terminal side effects once.
    Finished(Terminal),
    /// The session already finished earlier; ignore.
    AlreadyFinished,
}

/// One active submission: the job being tracked plus the view state derived
/// from the latest server response. Created when a submission is accepted,
/// destroyed on terminal observation, explicit cancellation, or when the
/// progress modal is dismissed.
#[derive(Clone, Debug)]
pub struct PollSession {
    job_id: String,
    progress: u8,
    label: String,
    finished: bool,
    consecutive_failures: u32,
}

impl PollSession {
    pub fn new(job_id: impl Into<String>) -> Self {
        PollSession {
            job_id: job_id.into(),
            progress: 0,
            label: JobStatus::Queued.to_string(),
            finished: false,
            consecutive_failures: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Latest server-reported progress, clamped to 0..=100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Status label for the progress modal.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Folds one status response into the session.
    pub fn observe(&mut self, resp: &StatusResponse) -> PollOutcome {
        if self.finished {
            return PollOutcome::AlreadyFinished;
        }
        self.consecutive_failures = 0;
        self.progress = resp.progress.min(100);
        self.label = resp.status.to_string();

        if !resp.status.is_terminal() {
            return PollOutcome::Continue;
        }

        self.finished = true;
        let terminal = match resp.status {
            JobStatus::Completed => {
                self.progress = 100;
                Terminal::Completed {
                    preview_url: resp.preview_url.clone(),
                    output_url: resp.output_url.clone(),
                }
            }
            JobStatus::Error => Terminal::Error {
                message: resp.error.clone(),
            },
            JobStatus::Cancelled => Terminal::Cancelled,
            _ => unreachable!("non-terminal handled above"),
        };
        PollOutcome::Finished(terminal)
    }

    /// Records a transport/decode failure for one tick. The session stays
    /// live; only a terminal status stops polling. Returns the number of
    /// consecutive failures so the caller can log it.
    pub fn observe_failure(&mut self) -> u32 {
        if !self.finished {
            self.consecutive_failures += 1;
        }
        self.consecutive_failures
    }

    /// Local cancellation: stops the session immediately without waiting
    /// for the server round-trip. Idempotent like `observe`.
    pub fn cancel_locally(&mut self) -> PollOutcome {
        if self.finished {
            return PollOutcome::AlreadyFinished;
        }
        self.finished = true;
        self.label = JobStatus::Cancelled.to_string();
        PollOutcome::Finished(Terminal::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: JobStatus, progress: u8) -> StatusResponse {
        StatusResponse {
            status,
            progress,
            error: None,
            output_url: None,
            preview_url: None,
        }
    }

    #[test]
    fn happy_path_finishes_exactly_once() {
        let mut session = PollSession::new("job-1");

        assert_eq!(
            session.observe(&status(JobStatus::Queued, 0)),
            PollOutcome::Continue
        );
        assert_eq!(session.progress(), 0);

        assert_eq!(
            session.observe(&status(JobStatus::Processing, 47)),
            PollOutcome::Continue
        );
        assert_eq!(session.progress(), 47);
        assert_eq!(session.label(), "processing");

        let mut done = status(JobStatus::Completed, 100);
        done.output_url = Some("/f/1".to_string());
        let outcome = session.observe(&done);
        assert_eq!(
            outcome,
            PollOutcome::Finished(Terminal::Completed {
                preview_url: None,
                output_url: Some("/f/1".to_string()),
            })
        );

        // A duplicate terminal response must not re-fire side effects.
        assert_eq!(session.observe(&done), PollOutcome::AlreadyFinished);
        assert!(session.is_finished());
    }

    #[test]
    fn error_carries_server_message_verbatim() {
        let mut session = PollSession::new("job-err");
        let mut resp = status(JobStatus::Error, 30);
        resp.error = Some("bad file".to_string());

        assert_eq!(
            session.observe(&resp),
            PollOutcome::Finished(Terminal::Error {
                message: Some("bad file".to_string()),
            })
        );
    }

    #[test]
    fn error_without_message_reported_as_absent() {
        let mut session = PollSession::new("job-err2");
        assert_eq!(
            session.observe(&status(JobStatus::Error, 0)),
            PollOutcome::Finished(Terminal::Error { message: None })
        );
    }

    #[test]
    fn transient_failures_never_stop_polling() {
        let mut session = PollSession::new("job-flaky");
        session.observe(&status(JobStatus::Processing, 10));

        assert_eq!(session.observe_failure(), 1);
        assert_eq!(session.observe_failure(), 2);
        assert_eq!(session.observe_failure(), 3);
        assert!(!session.is_finished());

        // Only the terminal response stops the session.
        assert!(matches!(
            session.observe(&status(JobStatus::Completed, 100)),
            PollOutcome::Finished(Terminal::Completed { .. })
        ));
    }

    #[test]
    fn progress_is_clamped_and_latest_wins() {
        let mut session = PollSession::new("job-odd");
        session.observe(&status(JobStatus::Processing, 200));
        assert_eq!(session.progress(), 100);

        // A lower later value is rendered as-is: no interpolation, no
        // client-enforced monotonicity.
        session.observe(&status(JobStatus::Processing, 12));
        assert_eq!(session.progress(), 12);
    }

    #[test]
    fn completion_forces_full_progress() {
        let mut session = PollSession::new("job-90");
        session.observe(&status(JobStatus::Completed, 90));
        assert_eq!(session.progress(), 100);
    }

    #[test]
    fn server_reported_cancellation_is_terminal() {
        let mut session = PollSession::new("job-c");
        session.observe(&status(JobStatus::Processing, 20));
        assert_eq!(
            session.observe(&status(JobStatus::Cancelled, 20)),
            PollOutcome::Finished(Terminal::Cancelled)
        );
        assert_eq!(
            session.observe(&status(JobStatus::Cancelled, 20)),
            PollOutcome::AlreadyFinished
        );
    }

    #[test]
    fn local_cancel_is_idempotent_and_final() {
        let mut session = PollSession::new("job-lc");
        session.observe(&status(JobStatus::Processing, 55));

        assert_eq!(
            session.cancel_locally(),
            PollOutcome::Finished(Terminal::Cancelled)
        );
        assert_eq!(session.cancel_locally(), PollOutcome::AlreadyFinished);

        // A straggler response from an in-flight request is ignored too.
        assert_eq!(
            session.observe(&status(JobStatus::Processing, 60)),
            PollOutcome::AlreadyFinished
        );
        assert_eq!(session.progress(), 55);
    }

    #[test]
    fn failure_counter_resets_on_success() {
        let mut session = PollSession::new("job-f");
        session.observe_failure();
        session.observe_failure();
        session.observe(&status(JobStatus::Processing, 5));
        assert_eq!(session.observe_failure(), 1);
    }
}
