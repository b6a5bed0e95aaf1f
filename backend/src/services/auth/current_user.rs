use actix_web::{HttpRequest, HttpResponse, web};

use common::model::auth::CurrentUserResponse;

use super::AuthState;

pub(crate) async fn process(auth: web::Data<AuthState>, req: HttpRequest) -> HttpResponse {
    match auth.session_user(&req).await {
        Some(user) => HttpResponse::Ok().json(CurrentUserResponse {
            authenticated: true,
            username: Some(user.username),
        }),
        None => HttpResponse::Ok().json(CurrentUserResponse {
            authenticated: false,
            username: None,
        }),
    }
}
