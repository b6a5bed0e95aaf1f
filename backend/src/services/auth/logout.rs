use actix_web::{HttpRequest, HttpResponse, web};

use common::model::auth::MessageResponse;

use super::{AuthState, SESSION_COOKIE};

pub(crate) async fn process(auth: web::Data<AuthState>, req: HttpRequest) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        auth.close_session(cookie.value()).await;
    }
    let mut expired = super::session_cookie(String::new());
    expired.make_removal();
    HttpResponse::Ok().cookie(expired).json(MessageResponse {
        message: "logged out".to_string(),
    })
}
