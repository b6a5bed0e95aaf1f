//! Shared job model and wire types.
//!
//! A `Job` is a server-tracked unit of asynchronous work (one video edit run)
//! identified by an opaque uuid. The backend owns the authoritative record;
//! the frontend holds a read-only cached copy refreshed via `GET /jobs` and
//! `GET /status/{job_id}`. The response shapes here are the contract both
//! sides compile against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod poll;

/// Lifecycle state of a job, serialized lowercase on the wire
/// (`"queued"`, `"processing"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Error | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A job record as returned by `GET /jobs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub filename: String,
    pub status: JobStatus,
    /// Bounded to 0..=100 by the producer.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /status/{job_id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Successful body of every job-creating endpoint (`POST /upload`, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Error body returned with any non-2xx status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::from_str::<JobStatus>("\"cancelled\"").unwrap(),
            JobStatus::Cancelled
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_response_omits_empty_fields() {
        let resp = StatusResponse {
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            output_url: None,
            preview_url: None,
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"status":"queued","progress":0}"#
        );
    }

    #[test]
    fn status_response_parses_completed_payload() {
        let resp: StatusResponse = serde_json::from_str(
            r#"{"status":"completed","progress":100,"output_url":"/download/abc"}"#,
        )
        .unwrap();
        assert_eq!(resp.status, JobStatus::Completed);
        assert_eq!(resp.output_url.as_deref(), Some("/download/abc"));
        assert!(resp.preview_url.is_none());
    }
}
