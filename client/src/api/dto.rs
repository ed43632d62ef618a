//! Wire types for the banking backend's REST endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::config::{LOCAL_TRANSFER_TITLE, LOCAL_TRANSFER_TRANSACTION_TYPE};
use crate::transfer::amount::{format_cents, parse_cents_rounded, Amount};
use crate::transfer::{TransferId, TransferRequest};

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Body of `POST /login/`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /login/`. Both fields are optional on the wire so that
/// a malformed success can be reported instead of failing to decode.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body of `POST /register/`. Deliberately not `Debug`: it carries the
/// password and the SSN.
#[derive(Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub address: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    /// Date of birth as `YYYY-MM-DD`.
    pub dob: &'a str,
    pub ssn: &'a str,
}

/// Response of `POST /register/`. A missing or null `user` means the
/// account was not created.
#[derive(Debug, Deserialize)]
pub struct SignUpResponse {
    #[serde(default)]
    pub user: Option<Value>,
}

/// Response of `GET /profile/`. Only the fields the client reads are typed;
/// everything else is preserved in `extra`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// "First Last", falling back to the email, then to "unknown user".
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            full
        } else {
            self.email.clone().unwrap_or_else(|| "unknown user".into())
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// One entry of `GET /accounts/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BankAccount {
    pub id: u64,
    #[serde(default, alias = "account_name")]
    pub name: Option<String>,
    /// Balance in cents. Missing or unreadable balances count as zero.
    #[serde(default, deserialize_with = "lenient_cents")]
    pub balance: i64,
}

/// Accounts plus the aggregates the dashboard shows.
#[derive(Debug, Clone)]
pub struct AccountsSummary {
    pub accounts: Vec<BankAccount>,
    pub total_banks: usize,
    /// Sum of all balances, in cents.
    pub total_current_balance: i64,
}

impl AccountsSummary {
    pub fn from_accounts(accounts: Vec<BankAccount>) -> Self {
        let total_current_balance = accounts.iter().map(|a| a.balance).sum();
        Self {
            total_banks: accounts.len(),
            accounts,
            total_current_balance,
        }
    }

    /// Total balance formatted as decimal text.
    pub fn total_display(&self) -> String {
        format_cents(self.total_current_balance)
    }
}

/// Balances are read the way a dashboard would: the leading number, rounded
/// to cents. Anything without one counts as zero.
fn lenient_cents<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    let cents = match &raw {
        Some(Value::String(s)) => parse_cents_rounded(s),
        Some(Value::Number(n)) => number_cents(n),
        _ => return Ok(0),
    };
    Ok(cents.unwrap_or_else(|| {
        tracing::warn!(raw = ?raw, "unreadable balance, counting as zero");
        0
    }))
}

fn number_cents(n: &Number) -> Option<i64> {
    if let Some(whole) = n.as_i64() {
        return whole.checked_mul(100);
    }
    let text = n.to_string();
    if text.contains(['e', 'E']) {
        // Exponent notation only shows up far outside any real balance.
        let scaled = (n.as_f64()? * 100.0).round();
        return (scaled.abs() < i64::MAX as f64).then_some(scaled as i64);
    }
    parse_cents_rounded(&text)
}

// ---------------------------------------------------------------------------
// Local Transfers
// ---------------------------------------------------------------------------

/// Body of `POST /local-transfer/`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLocalTransferBody {
    pub account: u64,
    pub transaction_type: &'static str,
    /// Sent as a JSON number, e.g. `5.0`.
    #[serde(serialize_with = "Amount::serialize_as_number")]
    pub amount: Amount,
    pub title: &'static str,
    pub description: String,
}

impl CreateLocalTransferBody {
    /// Maps a request onto the endpoint's contract. The recipient stays on
    /// the client; the note becomes the description.
    pub fn from_request(request: &TransferRequest) -> Self {
        Self {
            account: request.source_account_id(),
            transaction_type: LOCAL_TRANSFER_TRANSACTION_TYPE,
            amount: request.amount(),
            title: LOCAL_TRANSFER_TITLE,
            description: request.note().unwrap_or_default().to_string(),
        }
    }
}

/// Response of `POST /local-transfer/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalTransferCreated {
    pub transfer_id: TransferId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /validate-local-transfer/{id}/`.
#[derive(Debug, Serialize)]
pub struct ValidateOtpBody<'a> {
    pub otp: &'a str,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// One account's block of `GET /transactions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountTransactions {
    pub account_id: u64,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub data: Vec<TransactionRecord>,
}

/// A transaction as the backend reports it inside an account block.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub payment_channel: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub amount: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "first_category")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<DateTime<Utc>>,
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    /// The backend's `title`.
    pub name: Option<String>,
    pub payment_channel: Option<String>,
    pub transaction_type: Option<String>,
    pub account_id: u64,
    pub account_name: Option<String>,
    /// Amount in cents, signed as reported.
    pub amount: i64,
    pub status: Option<String>,
    /// First category, or empty.
    pub category: String,
    pub date: Option<DateTime<Utc>>,
}

/// Flattens per-account blocks into one feed, newest first. Undated
/// entries sink to the end; ties keep backend order.
pub fn flatten_transactions(groups: Vec<AccountTransactions>) -> Vec<Transaction> {
    let mut feed: Vec<Transaction> = groups
        .into_iter()
        .flat_map(|group| {
            let AccountTransactions {
                account_id,
                account_name,
                data,
            } = group;
            data.into_iter().map(move |record| Transaction {
                id: record.id,
                name: record.title,
                payment_channel: record.payment_channel,
                transaction_type: record.transaction_type,
                account_id,
                account_name: account_name.clone(),
                amount: record.amount,
                status: record.status,
                category: record.category,
                date: record.date,
            })
        })
        .collect();
    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed
}

/// Accepts RFC 3339 timestamps, naive timestamps (read as UTC) and bare
/// dates (midnight UTC).
pub fn parse_backend_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_backend_date))
}

fn first_category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .next()
            .and_then(|first| first.as_str().map(str::to_string))
            .unwrap_or_default(),
        Some(Value::String(category)) => category,
        _ => String::new(),
    })
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_body_matches_backend_contract() {
        let request = TransferRequest::builder()
            .source_account(11)
            .amount("5")
            .note("lunch")
            .recipient_email("a@b.co")
            .recipient_bank("TD Bank")
            .recipient_account_number("1234567890")
            .recipient_routing_number("123456789")
            .build()
            .unwrap();

        let body = serde_json::to_value(CreateLocalTransferBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "account": 11,
                "transaction_type": "DEBIT",
                "amount": 5.0,
                "title": "local_transfer",
                "description": "lunch",
            })
        );
    }

    #[test]
    fn created_response_keeps_unknown_fields() {
        let created: LocalTransferCreated =
            serde_json::from_value(json!({"transfer_id": 42, "status": "pending"})).unwrap();
        assert_eq!(created.transfer_id.as_str(), "42");
        assert_eq!(created.extra.get("status"), Some(&json!("pending")));
    }

    #[test]
    fn accounts_summary_sums_lenient_balances() {
        let accounts: Vec<BankAccount> = serde_json::from_value(json!([
            {"id": 1, "name": "Checking", "balance": "100.50"},
            {"id": 2, "account_name": "Savings", "balance": 20},
            {"id": 3, "balance": null},
            {"id": 4},
        ]))
        .unwrap();

        let summary = AccountsSummary::from_accounts(accounts);
        assert_eq!(summary.total_banks, 4);
        assert_eq!(summary.total_current_balance, 12_050);
        assert_eq!(summary.total_display(), "120.50");
        assert_eq!(summary.accounts[1].name.as_deref(), Some("Savings"));
    }

    #[test]
    fn balances_with_extra_precision_round_to_cents() {
        let accounts: Vec<BankAccount> = serde_json::from_value(json!([
            {"id": 1, "balance": "100.505"},
            {"id": 2, "balance": 12.345},
            {"id": 3, "balance": "7.5 USD"},
            {"id": 4, "balance": "n/a"},
        ]))
        .unwrap();

        let balances: Vec<i64> = accounts.iter().map(|a| a.balance).collect();
        assert_eq!(balances, vec![10_051, 1_235, 750, 0]);

        let summary = AccountsSummary::from_accounts(accounts);
        assert_eq!(summary.total_current_balance, 12_036);
        assert_eq!(summary.total_display(), "120.36");
    }

    #[test]
    fn transactions_flatten_newest_first() {
        let groups: Vec<AccountTransactions> = serde_json::from_value(json!([
            {
                "account_id": 1,
                "account_name": "Checking",
                "data": [
                    {"id": 10, "title": "Coffee", "payment_channel": "in store",
                     "transaction_type": "DEBIT", "amount": "4.50", "status": "completed",
                     "category": ["Food", "Cafe"], "date": "2024-05-01T08:00:00Z"},
                    {"id": 11, "title": "Rent", "amount": 1200, "date": "2024-05-03"},
                ],
            },
            {
                "account_id": 2,
                "data": [
                    {"id": "tx-7", "title": "Refund", "amount": "-3.2",
                     "category": null, "date": "2024-05-02T09:30:00"},
                    {"id": 12, "title": "Undated"},
                ],
            },
        ]))
        .unwrap();

        let feed = flatten_transactions(groups);
        let ids: Vec<&str> = feed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "tx-7", "10", "12"]);

        let coffee = &feed[2];
        assert_eq!(coffee.name.as_deref(), Some("Coffee"));
        assert_eq!(coffee.transaction_type.as_deref(), Some("DEBIT"));
        assert_eq!(coffee.account_id, 1);
        assert_eq!(coffee.account_name.as_deref(), Some("Checking"));
        assert_eq!(coffee.amount, 450);
        assert_eq!(coffee.category, "Food");

        let refund = &feed[1];
        assert_eq!(refund.account_id, 2);
        assert_eq!(refund.amount, -320);
        assert_eq!(refund.category, "");
        assert!(feed[3].date.is_none());
    }

    #[test]
    fn backend_dates_in_several_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();
        assert_eq!(parse_backend_date("2024-05-02T09:30:00Z"), Some(expected));
        assert_eq!(parse_backend_date("2024-05-02T11:30:00+02:00"), Some(expected));
        assert_eq!(parse_backend_date("2024-05-02T09:30:00"), Some(expected));
        assert_eq!(
            parse_backend_date("2024-05-02"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_backend_date("yesterday"), None);
    }

    #[test]
    fn profile_display_name_falls_back_to_email() {
        let profile: UserProfile =
            serde_json::from_value(json!({"email": "jo@example.com", "city": "Austin"})).unwrap();
        assert_eq!(profile.display_name(), "jo@example.com");
        assert!(profile.extra.contains_key("city"));

        let named: UserProfile =
            serde_json::from_value(json!({"first_name": "Jo", "last_name": "Park"})).unwrap();
        assert_eq!(named.display_name(), "Jo Park");
    }
}
