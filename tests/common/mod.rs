#![allow(dead_code)]

use actix_web::{http::header, test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use taskboard::config::Config;
use taskboard::drafting::CompletionProvider;
use taskboard::error::AppError;
use taskboard::routes;
use taskboard::state::AppState;
use taskboard::store::MemoryStore;

/// Lowest work factor bcrypt accepts; keeps hashing fast in tests.
pub const TEST_COST: u32 = 4;

/// Replies to every prompt with the same canned content.
pub struct StubProvider(pub Result<Option<String>, String>);

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete_json(&self, _prompt: &str) -> Result<Option<String>, AppError> {
        self.0.clone().map_err(AppError::GenerationError)
    }
}

pub fn test_config(ttl_minutes: &str) -> Config {
    let ttl = ttl_minutes.to_string();
    Config::from_lookup(move |key| match key {
        "SECRET_KEY" => Some("integration-secret".into()),
        "MONGODB_URL" => Some("mongodb://unused".into()),
        "DATABASE_NAME" => Some("unused".into()),
        "ACCESS_TOKEN_EXPIRE_MINUTES" => Some(ttl.clone()),
        "BCRYPT_COST" => Some(TEST_COST.to_string()),
        _ => None,
    })
    .expect("test configuration is valid")
}

pub fn state_with(ttl_minutes: &str, provider: StubProvider) -> web::Data<AppState> {
    let store = Arc::new(MemoryStore::new());
    web::Data::new(AppState::from_config(
        &test_config(ttl_minutes),
        store.clone(),
        store,
        Arc::new(provider),
    ))
}

pub fn default_state() -> web::Data<AppState> {
    state_with(
        "30",
        StubProvider(Ok(Some(
            r#"{"description": "Draft body", "priority": "Medium"}"#.to_string(),
        ))),
    )
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(App::new().app_data(state).configure(routes::config)).await
}

/// Registers and logs in a user, returning the access token.
pub async fn register_and_login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": email, "name": "Test User", "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registration failed");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["access_token"]
        .as_str()
        .expect("login returns an access token")
        .to_string()
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}
