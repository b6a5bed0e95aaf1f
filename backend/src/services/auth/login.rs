use actix_web::{HttpResponse, web};
use log::info;

use common::jobs::ErrorResponse;
use common::model::auth::{LoginRequest, MessageResponse};

use super::AuthState;
use super::store::StoreError;

pub(crate) async fn process(
    auth: web::Data<AuthState>,
    body: web::Json<LoginRequest>,
) -> HttpResponse {
    let users = auth.users.clone();
    let username = body.username.clone();
    let password = body.password.clone();
    let name = username.clone();
    let result = web::block(move || users.verify_user(&name, &password)).await;

    match result {
        Ok(Ok(user_id)) => {
            info!("user {username} logged in");
            let token = auth.open_session(user_id, username).await;
            HttpResponse::Ok()
                .cookie(super::session_cookie(token))
                .json(MessageResponse {
                    message: "logged in".to_string(),
                })
        }
        Ok(Err(StoreError::BadCredentials)) => HttpResponse::Unauthorized().json(ErrorResponse {
            error: "invalid username or password".to_string(),
        }),
        Ok(Err(e)) => {
            log::error!("login failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "login failed".to_string(),
            })
        }
        Err(e) => {
            log::error!("login task failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "login failed".to_string(),
            })
        }
    }
}
