use actix_web::{HttpResponse, web};
use log::info;

use common::jobs::ErrorResponse;
use common::model::auth::{MessageResponse, RegisterRequest};

use super::AuthState;
use super::store::StoreError;

pub(crate) async fn process(
    auth: web::Data<AuthState>,
    body: web::Json<RegisterRequest>,
) -> HttpResponse {
    let username = body.username.trim().to_string();
    if username.is_empty() || body.password.len() < 4 {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "username and a password of at least 4 characters are required".to_string(),
        });
    }

    let users = auth.users.clone();
    let password = body.password.clone();
    let name = username.clone();
    let result =
        web::block(move || users.create_user(&name, &password)).await;

    match result {
        Ok(Ok(user_id)) => {
            info!("registered user {username} ({user_id})");
            let token = auth.open_session(user_id, username).await;
            HttpResponse::Ok()
                .cookie(super::session_cookie(token))
                .json(MessageResponse {
                    message: "account created".to_string(),
                })
        }
        Ok(Err(StoreError::UsernameTaken)) => HttpResponse::Conflict().json(ErrorResponse {
            error: "username already exists".to_string(),
        }),
        Ok(Err(e)) => {
            log::error!("register failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "registration failed".to_string(),
            })
        }
        Err(e) => {
            log::error!("register task failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "registration failed".to_string(),
            })
        }
    }
}
