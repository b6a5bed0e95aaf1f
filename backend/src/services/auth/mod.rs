mod current_user;
mod login;
mod logout;
mod register;

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, Scope, web};
use tokio::sync::RwLock;

use common::jobs::ErrorResponse;

use store::UserStore;

pub const SESSION_COOKIE: &str = "clipstream_session";

#[derive(Clone, Debug)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
}

/// Logged-in sessions keyed by opaque cookie token.
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<UserStore>,
    sessions: Arc<RwLock<HashMap<String, SessionUser>>>,
}

impl AuthState {
    pub fn new(users: UserStore) -> Self {
        Self {
            users: Arc::new(users),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn open_session(&self, user_id: i64, username: String) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), SessionUser { user_id, username });
        token
    }

    pub async fn close_session(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    pub async fn session_user(&self, req: &HttpRequest) -> Option<SessionUser> {
        let token = req.cookie(SESSION_COOKIE)?;
        self.sessions.read().await.get(token.value()).cloned()
    }
}

/// Resolves the session cookie or produces the 401 the client expects.
pub async fn require_user(
    state: &AuthState,
    req: &HttpRequest,
) -> Result<SessionUser, HttpResponse> {
    match state.session_user(req).await {
        Some(user) => Ok(user),
        None => Err(HttpResponse::Unauthorized().json(ErrorResponse {
            error: "login required".to_string(),
        })),
    }
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn configure_routes() -> Scope {
    web::scope("")
        .route("/register", web::post().to(register::process))
        .route("/login", web::post().to(login::process))
        .route("/logout", web::get().to(logout::process))
        .route("/current_user", web::get().to(current_user::process))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};

    use common::model::auth::CurrentUserResponse;

    use super::*;

    fn test_state() -> AuthState {
        AuthState::new(UserStore::open_in_memory().expect("in-memory store"))
    }

    #[actix_web::test]
    async fn register_sets_session_cookie() {
        let auth = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(serde_json::json!({ "username": "dana", "password": "secret" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE);
        assert!(cookie.is_some());
    }

    #[actix_web::test]
    async fn current_user_without_cookie_is_anonymous() {
        let auth = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::get().uri("/current_user").to_request();
        let body: CurrentUserResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!body.authenticated);
        assert!(body.username.is_none());
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorized() {
        let auth = test_state();
        auth.users.create_user("erik", "right").expect("create");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(serde_json::json!({ "username": "erik", "password": "wrong" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
