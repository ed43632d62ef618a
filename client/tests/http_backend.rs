//! `BankApiClient` against a mock backend over real HTTP.
//!
//! Checks paths, bearer auth, request bodies, and how error payloads are
//! turned into user-facing messages.

mod common;

use ledgerline_client::api::{ApiError, BankApiClient, CreateLocalTransferBody, SignUpRequest};
use ledgerline_client::config::ClientConfig;
use ledgerline_client::session::SessionCredentials;
use ledgerline_client::transfer::{TransferId, TransferRequest};
use serde_json::json;

fn client(base_url: &str) -> BankApiClient {
    BankApiClient::new(&ClientConfig::with_base_url(base_url)).expect("client")
}

fn creds() -> SessionCredentials {
    SessionCredentials::new(common::ACCESS_TOKEN, common::REFRESH_TOKEN)
}

fn transfer_body(amount: &str) -> CreateLocalTransferBody {
    let request = TransferRequest::builder()
        .source_account(1)
        .amount(amount)
        .note("groceries")
        .recipient_email("sam@example.com")
        .recipient_bank("Ally Bank")
        .recipient_account_number("0123456789")
        .recipient_routing_number("021000021")
        .build()
        .expect("valid request");
    CreateLocalTransferBody::from_request(&request)
}

// ---------------------------------------------------------------------------
// Session & Accounts
// ---------------------------------------------------------------------------

fn new_user(email: &str) -> SignUpRequest<'_> {
    SignUpRequest {
        email,
        password: common::PASSWORD,
        first_name: "Jane",
        last_name: "Doe",
        address: "1 Main St",
        city: "Austin",
        state: "TX",
        postal_code: "73301",
        dob: "1990-04-12",
        ssn: "1234",
    }
}

#[tokio::test]
async fn sign_up_sends_registration_fields() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let user = api.sign_up(&new_user("jane@example.com")).await.unwrap();
    assert_eq!(user.display_name(), "Jane Doe");
    assert_eq!(user.extra.get("id"), Some(&json!(9)));

    let sent = &backend.state.requests_to("/register/")[0];
    assert_eq!(
        sent.body,
        json!({
            "email": "jane@example.com",
            "password": common::PASSWORD,
            "first_name": "Jane",
            "last_name": "Doe",
            "address": "1 Main St",
            "city": "Austin",
            "state": "TX",
            "postal_code": "73301",
            "dob": "1990-04-12",
            "ssn": "1234",
        })
    );
    assert!(sent.authorization.is_none());
}

#[tokio::test]
async fn sign_up_without_user_is_an_error() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let err = api.sign_up(&new_user(common::GHOST_EMAIL)).await.unwrap_err();
    assert_eq!(err.user_message("fallback"), "Error creating user.");

    let err = api.sign_up(&new_user(common::TAKEN_EMAIL)).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert_eq!(
        err.user_message("fallback"),
        "email: user with this email already exists."
    );
}

#[tokio::test]
async fn sign_in_returns_token_pair() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let session = api
        .sign_in("jane@example.com", common::PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.access_token(), Some(common::ACCESS_TOKEN));
    assert_eq!(session.refresh_token(), Some(common::REFRESH_TOKEN));

    let login = &backend.state.requests_to("/login/")[0];
    assert_eq!(
        login.body,
        json!({"email": "jane@example.com", "password": common::PASSWORD})
    );
    assert!(login.authorization.is_none());
}

#[tokio::test]
async fn bad_password_surfaces_detail() {
    let backend = common::spawn().await;
    let err = client(&backend.base_url())
        .sign_in("jane@example.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert_eq!(
        err.user_message("fallback"),
        "No active account found with the given credentials"
    );
}

#[tokio::test]
async fn profile_and_accounts_use_bearer_token() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let profile = api.profile(&creds()).await.unwrap();
    assert_eq!(profile.display_name(), "Jane Doe");
    assert_eq!(profile.extra.get("id"), Some(&json!(5)));

    let summary = api.list_accounts(&creds()).await.unwrap();
    assert_eq!(summary.total_banks, 3);
    assert_eq!(summary.total_current_balance, 12_050);
    assert_eq!(summary.total_display(), "120.50");

    for request in backend.state.requests() {
        assert_eq!(
            request.authorization.as_deref(),
            Some("Bearer access-abc")
        );
        assert!(request.request_id.is_some());
    }
}

#[tokio::test]
async fn transactions_merge_accounts_newest_first() {
    let backend = common::spawn().await;
    let feed = client(&backend.base_url())
        .list_transactions(&creds())
        .await
        .unwrap();

    let ids: Vec<&str> = feed.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["201", "101", "202"]);
    assert_eq!(feed[0].amount, 150);
    assert_eq!(feed[0].account_name.as_deref(), Some("Savings"));
    assert_eq!(feed[1].name.as_deref(), Some("Groceries"));
    assert_eq!(feed[1].category, "Food");
    assert_eq!(feed[1].account_id, 1);
    assert_eq!(feed[2].category, "");

    let sent = backend.state.requests_to("/transactions/");
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer access-abc"));
}

#[tokio::test]
async fn cookie_header_credentials_work() {
    let backend = common::spawn().await;
    let creds = SessionCredentials::from_cookie_header(&format!(
        "theme=dark; access_token={}",
        common::ACCESS_TOKEN
    ));
    assert!(client(&backend.base_url()).profile(&creds).await.is_ok());
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_transfer_sends_contract_body() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let created = api
        .create_local_transfer(&creds(), &transfer_body("5"))
        .await
        .unwrap();
    assert_eq!(created.transfer_id, TransferId::new("42"));
    assert_eq!(created.extra.get("status"), Some(&json!("pending")));

    let sent = backend.state.requests_to("/local-transfer/");
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].body,
        json!({
            "account": 1,
            "transaction_type": "DEBIT",
            "amount": 5.0,
            "title": "local_transfer",
            "description": "groceries",
        })
    );
}

#[tokio::test]
async fn field_error_becomes_message() {
    let backend = common::spawn().await;
    let err = client(&backend.base_url())
        .create_local_transfer(&creds(), &transfer_body("999999"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message("fallback"), "amount: Insufficient funds.");
}

#[tokio::test]
async fn validate_posts_otp_to_transfer_path() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());
    let id = TransferId::new("42");

    api.validate_local_transfer(&creds(), &id, "1234").await.unwrap();

    let err = api
        .validate_local_transfer(&creds(), &id, "0000")
        .await
        .unwrap_err();
    assert_eq!(err.user_message("fallback"), "Invalid OTP code.");

    let sent = backend.state.requests_to("/validate-local-transfer/42/");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body, json!({"otp": "1234"}));
}

#[tokio::test]
async fn odd_transfer_id_cannot_leave_the_validation_route() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let err = api
        .validate_local_transfer(&creds(), &TransferId::new("../../login/?x="), "1234")
        .await
        .unwrap_err();
    assert_eq!(err.user_message("fallback"), "Invalid OTP code.");

    assert!(backend.state.requests_to("/login/").is_empty());
    let sent = backend.state.requests_to("/validate-local-transfer/../../login/?x=/");
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn anonymous_calls_never_leave_the_process() {
    let backend = common::spawn().await;
    let api = client(&backend.base_url());

    let err = api
        .validate_local_transfer(&SessionCredentials::anonymous(), &TransferId::new("42"), "1234")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(
        err.user_message("fallback"),
        "Unauthorized: No access token found"
    );
    assert!(backend.state.requests().is_empty());
}
