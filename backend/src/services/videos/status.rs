use actix_web::{HttpRequest, HttpResponse, web};

use common::jobs::ErrorResponse;

use crate::job_controller::state::JobsState;
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
    match state.status_for(&job_id, user.user_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().json(ErrorResponse {
            error: "job not found".to_string(),
        }),
    }
}
