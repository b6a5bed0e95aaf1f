use actix_web::{HttpRequest, HttpResponse, web};

use crate::job_controller::state::JobsState;
use crate::services::auth::{AuthState, require_user};

/// Lists the caller's jobs, newest first.
pub(crate) async fn process(
    auth: web::Data<AuthState>,
    state: web::Data<JobsState>,
    req: HttpRequest,
) -> HttpResponse {
    let user = match require_user(&auth, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let jobs = state.jobs_for_user(user.user_id).await;
    HttpResponse::Ok().json(jobs)
}
