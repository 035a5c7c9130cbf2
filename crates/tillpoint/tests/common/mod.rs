//! Test utilities and common setup.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tillpoint::api::{self, AppState};
use tillpoint::auth::{Role, TokenCodec};
use tillpoint::db::Database;
use tillpoint::user::CreateUserRequest;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";
pub const OWNER: (&str, &str) = ("owner", "owner123");
pub const CASHIER: (&str, &str) = ("cashier", "cashier123");

/// Router plus the state behind it, seeded with one owner and one cashier.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub owner_id: i64,
    pub cashier_id: i64,
}

pub async fn test_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let state = AppState::new(
        &db,
        TokenCodec::new(TEST_SECRET),
        Duration::from_secs(24 * 3600),
        Vec::new(),
    );

    let owner_id = seed(&state, OWNER, "Store Owner", Role::Owner).await;
    let cashier_id = seed(&state, CASHIER, "Front Cashier", Role::Cashier).await;

    TestApp {
        router: api::create_router(state.clone()),
        state,
        owner_id,
        cashier_id,
    }
}

async fn seed(state: &AppState, (username, password): (&str, &str), name: &str, role: Role) -> i64 {
    state
        .users
        .create_user(CreateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role,
        })
        .await
        .unwrap()
        .id
}

impl TestApp {
    /// Send a request and return the status and parsed JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    /// Log in and return the issued token.
    pub async fn login(&self, (username, password): (&str, &str)) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }
}
