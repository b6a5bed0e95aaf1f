use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, web};

use common::jobs::ErrorResponse;

use crate::job_controller::state::JobsState;
use crate::services::auth::{AuthState, require_user};

/// Serves the finished render as an attachment named after the source file.
pub(crate) async fn process(
    auth: web::Data<AuthState>,
    state: web::Data<JobsState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let user = match require_user(&auth, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let job_id = path.into_inner();
    let Some((output_path, filename)) = state.output_for(&job_id, user.user_id).await else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "no finished output for this job".to_string(),
        });
    };

    match NamedFile::open_async(&output_path).await {
        Ok(file) => {
            let attachment = file.set_content_disposition(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(format!("edited_{filename}"))],
            });
            attachment.into_response(&req)
        }
        Err(e) => {
            log::error!("output file missing for job {job_id}: {e}");
            HttpResponse::NotFound().json(ErrorResponse {
                error: "output file is no longer available".to_string(),
            })
        }
    }
}
