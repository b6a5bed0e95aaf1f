use actix_web::{HttpRequest, HttpResponse, web};
use log::info;

use common::jobs::ErrorResponse;
use common::model::auth::MessageResponse;

use crate::job_controller::state::{CancelError, JobsState};
use crate::services::auth::{AuthState, require_user};

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
    match state.cancel(&job_id, user.user_id).await {
        Ok(()) => {
            info!("user {} cancelled job {job_id}", user.username);
            HttpResponse::Ok().json(MessageResponse {
                message: "job cancelled".to_string(),
            })
        }
        Err(CancelError::NotFound) => HttpResponse::NotFound().json(ErrorResponse {
            error: "job not found".to_string(),
        }),
        Err(CancelError::AlreadyFinished(status)) => HttpResponse::Conflict().json(ErrorResponse {
            error: format!("job already {status}"),
        }),
    }
}
