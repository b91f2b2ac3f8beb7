#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test, web, App,
};
use serde_json::{json, Value};
use std::sync::Arc;
use taskdesk::{
    routes,
    store::{InMemoryCredentialStore, InMemoryTaskStore},
    AppState, Config,
};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Application state backed by the in-memory stores.
pub fn test_state() -> AppState {
    AppState::new(
        &test_config(),
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(InMemoryTaskStore::new()),
    )
}

/// The full application, routed exactly as in `main`.
pub async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let guard = state.auth_middleware();
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(routes::health::index)
            .service(routes::health::health)
            .configure(move |cfg| routes::config(cfg, guard))
            .default_service(web::to(routes::not_found)),
    )
    .await
}

/// Sends a request and returns the status and JSON body, whether the
/// response came from a handler or from a middleware rejection.
pub async fn call(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: Request,
) -> (StatusCode, Value) {
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .expect("error body");
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}

pub async fn register(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    email: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    call(app, req).await
}

pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    call(app, req).await
}

/// Registers and logs in, returning the user id and token.
pub async fn signed_in(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
) -> (i64, String) {
    let email = format!("{}@example.com", username);
    let (status, body) = register(app, username, &email, "password123").await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, body) = login(app, &email, "password123").await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    let id = body["user"]["id"].as_i64().expect("user id");
    let token = body["token"].as_str().expect("token").to_string();
    (id, token)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
