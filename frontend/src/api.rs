//! Thin typed wrappers over the backend HTTP API.
//!
//! Every call distinguishes transport failures from server-side rejections:
//! a non-2xx response is decoded into the backend's `{ "error": ... }` body
//! so callers can surface the exact message.

use gloo_net::http::Request;
use web_sys::FormData;

use common::jobs::{ErrorResponse, Job, StatusResponse, SubmitResponse};
use common::model::auth::{CurrentUserResponse, LoginRequest, MessageResponse, RegisterRequest};

pub enum ApiError {
    /// The server answered with an error status and (usually) a message.
    Rejected(String),
    /// The request never completed or the body did not parse.
    Transport(String),
}

impl ApiError {
    pub fn message(&self) -> String {
        match self {
            ApiError::Rejected(message) => message.clone(),
            ApiError::Transport(e) => format!("network error: {e}"),
        }
    }
}

async fn rejection(resp: gloo_net::http::Response) -> ApiError {
    let status = resp.status();
    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => format!("request failed with status {status}"),
    };
    ApiError::Rejected(message)
}

/// Submits a job as multipart form data. The endpoint is a parameter so
/// every job-producing form shares one submission path.
pub async fn submit_job(endpoint: &str, form: FormData) -> Result<SubmitResponse, ApiError> {
    let request = Request::post(endpoint)
        .body(form)
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    let resp = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    resp.json::<SubmitResponse>()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

pub async fn fetch_status(job_id: &str) -> Result<StatusResponse, ApiError> {
    let resp = Request::get(&format!("/status/{job_id}"))
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    resp.json::<StatusResponse>()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

pub async fn fetch_jobs() -> Result<Vec<Job>, ApiError> {
    let resp = Request::get("/jobs")
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    resp.json::<Vec<Job>>()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

pub async fn cancel_job(job_id: &str) -> Result<MessageResponse, ApiError> {
    let resp = Request::post(&format!("/cancel/{job_id}"))
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    resp.json::<MessageResponse>()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

pub async fn fetch_current_user() -> Result<CurrentUserResponse, ApiError> {
    let resp = Request::get("/current_user")
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    resp.json::<CurrentUserResponse>()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

async fn post_credentials(endpoint: &str, body: &impl serde::Serialize) -> Result<(), ApiError> {
    let request = Request::post(endpoint)
        .json(body)
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    let resp = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    Ok(())
}

pub async fn login(username: String, password: String) -> Result<(), ApiError> {
    post_credentials("/login", &LoginRequest { username, password }).await
}

pub async fn register(username: String, password: String) -> Result<(), ApiError> {
    let body = RegisterRequest {
        username,
        password,
        email: None,
    };
    post_credentials("/register", &body).await
}

pub async fn logout() -> Result<(), ApiError> {
    let resp = Request::get("/logout")
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(resp).await);
    }
    Ok(())
}
