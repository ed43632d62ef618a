//! Mock banking backend served by axum on an ephemeral port.
//!
//! Behaviour:
//! - `POST /register/` creates any user except `taken@example.com` (field
//!   error) and `ghost@example.com` (2xx without a user).
//! - `POST /login/` accepts password `correct-horse`, answers 401 otherwise.
//! - `GET /transactions/` returns two account blocks in no particular order.
//! - `POST /local-transfer/` returns transfer id 42, except for amount
//!   `999999` which is rejected with a field error.
//! - `POST /validate-local-transfer/42/` accepts OTP `1234` only.
//!
//! Every request is recorded so tests can assert on what went over the wire.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const ACCESS_TOKEN: &str = "access-abc";
pub const REFRESH_TOKEN: &str = "refresh-def";
pub const PASSWORD: &str = "correct-horse";
pub const VALID_OTP: &str = "1234";
pub const TAKEN_EMAIL: &str = "taken@example.com";
pub const GHOST_EMAIL: &str = "ghost@example.com";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct MockState {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockState {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().push(Recorded {
            method,
            path,
            authorization: header("authorization"),
            request_id: header("x-request-id"),
            body,
        });
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: MockState,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn() -> MockBackend {
    let state = MockState::default();
    let app = Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/profile/", get(profile))
        .route("/accounts/", get(accounts))
        .route("/transactions/", get(transactions))
        .route("/local-transfer/", post(local_transfer))
        .route("/validate-local-transfer/:id/", post(validate))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend");
    });

    MockBackend { addr, state }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

async fn register(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", "/register/".into(), &headers, body.clone());
    match body["email"].as_str() {
        Some(TAKEN_EMAIL) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["user with this email already exists."]})),
        )
            .into_response(),
        Some(GHOST_EMAIL) => (StatusCode::CREATED, Json(json!({"message": "queued"}))).into_response(),
        _ => (
            StatusCode::CREATED,
            Json(json!({
                "user": {
                    "id": 9,
                    "email": body["email"],
                    "first_name": body["first_name"],
                    "last_name": body["last_name"],
                }
            })),
        )
            .into_response(),
    }
}

async fn login(State(state): State<MockState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.record("POST", "/login/".into(), &headers, body.clone());
    if body["password"] == PASSWORD {
        Json(json!({"access": ACCESS_TOKEN, "refresh": REFRESH_TOKEN})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn profile(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("GET", "/profile/".into(), &headers, Value::Null);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 5,
        "email": "jane@example.com",
        "first_name": "Jane",
        "last_name": "Doe",
    }))
    .into_response()
}

async fn accounts(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("GET", "/accounts/".into(), &headers, Value::Null);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"id": 1, "name": "Checking", "balance": "100.50"},
        {"id": 2, "account_name": "Savings", "balance": 20},
        {"id": 3, "name": "Empty"},
    ]))
    .into_response()
}

async fn transactions(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("GET", "/transactions/".into(), &headers, Value::Null);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "account_id": 1,
            "account_name": "Checking",
            "data": [
                {"id": 101, "title": "Groceries", "payment_channel": "in store",
                 "transaction_type": "DEBIT", "amount": "54.20", "status": "completed",
                 "category": ["Food"], "date": "2024-06-01T10:00:00Z"},
            ],
        },
        {
            "account_id": 2,
            "account_name": "Savings",
            "data": [
                {"id": 201, "title": "Interest", "transaction_type": "CREDIT",
                 "amount": 1.5, "status": "completed", "date": "2024-06-03"},
                {"id": 202, "title": "Transfer in", "transaction_type": "CREDIT",
                 "amount": "100", "date": "2024-05-20T16:45:00Z"},
            ],
        },
    ]))
    .into_response()
}

async fn local_transfer(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", "/local-transfer/".into(), &headers, body.clone());
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["amount"].as_f64() == Some(999_999.0) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"amount": ["Insufficient funds."]})),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({"transfer_id": 42, "status": "pending"})),
    )
        .into_response()
}

async fn validate(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(
        "POST",
        format!("/validate-local-transfer/{id}/"),
        &headers,
        body.clone(),
    );
    if !authorized(&headers) {
        return unauthorized();
    }
    if id == "42" && body["otp"] == VALID_OTP {
        Json(json!({"message": "Transfer completed"})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid OTP code."})),
        )
            .into_response()
    }
}
