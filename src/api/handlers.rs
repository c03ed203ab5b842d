use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Cents, Wallet, WalletId, cents_to_units, parse_cents};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWalletRequest {
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmountRequest {
    pub amount: serde_json::Number,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub id: String,
    pub balance: f64,
    pub currency: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            id: wallet.id.to_string(),
            balance: cents_to_units(wallet.balance),
            currency: wallet.currency.to_string(),
            created_at: format_timestamp(wallet.created_at),
            updated_at: format_timestamp(wallet.updated_at),
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::bad_request("Invalid request body")
    })
}

/// Ids that are not UUIDs cannot name a wallet.
fn wallet_id(raw: &str) -> Result<WalletId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found())
}

fn parse_amount(request: &AmountRequest) -> Result<Cents, ApiError> {
    parse_cents(&request.amount.to_string())
        .map_err(|e| ApiError::bad_request(format!("Invalid amount: {}", e)))
}

pub async fn live() -> &'static str {
    "OK"
}

pub async fn create_wallet(
    State(state): State<AppState>,
    payload: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let request = body(payload)?;
    let currency = request.currency.trim().to_uppercase();

    let wallet = state.service.create_wallet(&currency).await?;
    Ok((StatusCode::CREATED, Json(wallet.into())))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WalletResponse>, ApiError> {
    let id = wallet_id(&id)?;
    let wallet = state.service.get_wallet(id).await?;
    Ok(Json(wallet.into()))
}

pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = wallet_id(&id)?;
    let amount = parse_amount(&body(payload)?)?;

    state.service.deposit(id, amount).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = wallet_id(&id)?;
    let amount = parse_amount(&body(payload)?)?;

    state.service.withdraw(id, amount).await?;
    Ok(StatusCode::NO_CONTENT)
}
