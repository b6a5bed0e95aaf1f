use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::OnceLock;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::StreamExt;
use log::info;
use regex::Regex;
use uuid::Uuid;

use common::jobs::{ErrorResponse, SubmitResponse};
use common::model::options::EffectOptions;

use crate::config::{ALLOWED_EXTENSIONS, Config, MAX_UPLOAD_BYTES};
use crate::job_controller::state::JobsState;
use crate::services::auth::{AuthState, require_user};

use super::process as worker;

/// Keeps only characters that are safe in a stored filename.
pub(crate) fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9._-]").expect("hardcoded pattern")
    });
    let cleaned = re.replace_all(name.trim(), "_").to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}

pub(crate) fn has_allowed_extension(name: &str) -> bool {
    PathBuf::from(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

struct Submission {
    video_path: PathBuf,
    filename: String,
    music_path: Option<PathBuf>,
    fields: HashMap<String, String>,
}

enum UploadError {
    MissingFile,
    BadExtension,
    TooLarge,
    Malformed(String),
    Io(String),
}

impl UploadError {
    fn respond(&self) -> HttpResponse {
        let (builder, message) = match self {
            UploadError::MissingFile => (
                HttpResponse::BadRequest(),
                "no video file provided".to_string(),
            ),
            UploadError::BadExtension => (
                HttpResponse::BadRequest(),
                format!("unsupported file type, allowed: {}", ALLOWED_EXTENSIONS.join(", ")),
            ),
            UploadError::TooLarge => (
                HttpResponse::PayloadTooLarge(),
                "file exceeds the 500 MB upload limit".to_string(),
            ),
            UploadError::Malformed(e) => (HttpResponse::BadRequest(), e.clone()),
            UploadError::Io(e) => {
                log::error!("upload failed: {e}");
                (
                    HttpResponse::InternalServerError(),
                    "failed to store upload".to_string(),
                )
            }
        };
        let mut builder = builder;
        builder.json(ErrorResponse { error: message })
    }
}

/// Streams one multipart file field to disk under `dir`, enforcing the size cap.
async fn save_field(
    field: &mut actix_multipart::Field,
    dir: &std::path::Path,
    stored_name: &str,
) -> Result<PathBuf, UploadError> {
    let path = dir.join(stored_name);
    let file = File::create(&path).map_err(|e| UploadError::Io(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let mut written: u64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| UploadError::Malformed(e.to_string()))?;
        written += chunk.len() as u64;
        if written > MAX_UPLOAD_BYTES {
            drop(writer);
            let _ = std::fs::remove_file(&path);
            return Err(UploadError::TooLarge);
        }
        writer
            .write_all(&chunk)
            .map_err(|e| UploadError::Io(e.to_string()))?;
    }
    writer.flush().map_err(|e| UploadError::Io(e.to_string()))?;
    Ok(path)
}

async fn read_submission(
    mut payload: Multipart,
    config: &Config,
    job_id: &str,
) -> Result<Submission, UploadError> {
    let mut video: Option<(PathBuf, String)> = None;
    let mut music_path: Option<PathBuf> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| UploadError::Malformed(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()));

        match name.as_deref() {
            Some("video") => {
                let original = filename.unwrap_or_default();
                if original.is_empty() {
                    return Err(UploadError::MissingFile);
                }
                if !has_allowed_extension(&original) {
                    return Err(UploadError::BadExtension);
                }
                let safe = sanitize_filename(&original);
                let stored = format!("{job_id}_{safe}");
                let path = save_field(&mut field, &config.upload_dir, &stored).await?;
                video = Some((path, safe));
            }
            Some("music") => {
                // Optional background track, an empty part means none was picked.
                let original = filename.unwrap_or_default();
                if original.is_empty() {
                    continue;
                }
                let safe = sanitize_filename(&original);
                let stored = format!("{job_id}_music_{safe}");
                let path = save_field(&mut field, &config.upload_dir, &stored).await?;
                music_path = Some(path);
            }
            Some(other) => {
                let key = other.to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| UploadError::Malformed(e.to_string()))?;
                    bytes.extend_from_slice(&chunk);
                }
                let value = String::from_utf8_lossy(&bytes).to_string();
                fields.insert(key, value);
            }
            None => {}
        }
    }

    let (video_path, filename) = video.ok_or(UploadError::MissingFile)?;
    Ok(Submission {
        video_path,
        filename,
        music_path,
        fields,
    })
}

pub(crate) async fn process(
    auth: web::Data<AuthState>,
    state: web::Data<JobsState>,
    config: web::Data<Config>,
    req: HttpRequest,
    payload: Multipart,
) -> HttpResponse {
    let user = match require_user(&auth, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let job_id = Uuid::new_v4().to_string();
    let submission = match read_submission(payload, &config, &job_id).await {
        Ok(s) => s,
        Err(e) => return e.respond(),
    };

    let options = EffectOptions::from_fields(
        submission
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );
    let cancelled = state
        .register(
            &job_id,
            &submission.filename,
            user.user_id,
            submission.video_path.clone(),
        )
        .await;
    info!(
        "user {} queued job {job_id} for {}",
        user.username, submission.filename
    );

    worker::schedule(worker::RenderRequest {
        job_id: job_id.clone(),
        input: submission.video_path,
        music: submission.music_path,
        options,
        output_dir: config.output_dir.clone(),
        tx: state.tx.clone(),
        cancelled,
    });

    HttpResponse::Ok().json(SubmitResponse { job_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_tricks() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("my clip (1).mp4"), "my_clip__1_.mp4");
        assert_eq!(sanitize_filename("   "), "upload");
        assert_eq!(sanitize_filename(".."), "upload");
    }

    #[test]
    fn extension_guard_is_case_insensitive() {
        assert!(has_allowed_extension("clip.MP4"));
        assert!(has_allowed_extension("clip.mkv"));
        assert!(!has_allowed_extension("clip.exe"));
        assert!(!has_allowed_extension("noextension"));
    }
}
