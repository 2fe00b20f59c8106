// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-gated token endpoints.
//!
//! Balances and transaction hashes are mocked. The gate in front of them is
//! real: every handler takes [`WalletAuth`].

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::WalletAuth, crypto::random_hex32, error::ApiError, models::WalletAddress};

const MOCK_SPACE_TIME_BALANCE: &str = "100.0";
const MOCK_SPACE_MONEY_BALANCE: &str = "50.0";

/// Token amount as sent by the browser: a JSON number or a numeric string.
///
/// Numbers keep their JSON form so the echo matches the request (`10` stays
/// `10`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Amount {
    #[schema(value_type = f64)]
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    /// The amount as a finite, strictly positive value.
    pub fn positive_value(&self) -> Option<f64> {
        let value = match self {
            Amount::Number(n) => n.as_f64()?,
            Amount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub space_time: String,
    pub space_money: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub success: bool,
    pub tx_hash: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub success: bool,
    pub tx_hash: String,
    pub to_address: String,
    pub amount: Amount,
}

fn validate_amount(amount: Option<Amount>) -> Result<Amount, ApiError> {
    amount
        .filter(|a| a.positive_value().is_some())
        .ok_or_else(|| ApiError::bad_request("Invalid amount"))
}

fn mock_tx_hash() -> Result<String, ApiError> {
    random_hex32().map_err(|e| {
        tracing::error!(error = %e, "Could not generate transaction hash");
        ApiError::internal("Internal server error")
    })
}

#[utoipa::path(
    get,
    path = "/api/tokens/balances",
    tag = "Tokens",
    responses(
        (status = 200, description = "Token balances for the linked wallet", body = BalancesResponse),
        (status = 401, description = "No session with a linked wallet")
    )
)]
pub async fn balances(WalletAuth(session): WalletAuth) -> Json<BalancesResponse> {
    tracing::debug!(wallet = %session.wallet_address, "Serving token balances");
    Json(BalancesResponse {
        space_time: MOCK_SPACE_TIME_BALANCE.to_string(),
        space_money: MOCK_SPACE_MONEY_BALANCE.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/tokens/purchase",
    request_body = PurchaseRequest,
    tag = "Tokens",
    responses(
        (status = 200, description = "Purchase submitted", body = PurchaseResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "No session with a linked wallet")
    )
)]
pub async fn purchase(
    WalletAuth(session): WalletAuth,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let Json(request) = body?;
    let amount = validate_amount(request.amount)?;
    let tx_hash = mock_tx_hash()?;

    tracing::info!(wallet = %session.wallet_address, tx_hash = %tx_hash, "Token purchase submitted");
    Ok(Json(PurchaseResponse {
        success: true,
        tx_hash,
        amount,
    }))
}

#[utoipa::path(
    post,
    path = "/api/tokens/transfer",
    request_body = TransferRequest,
    tag = "Tokens",
    responses(
        (status = 200, description = "Transfer submitted", body = TransferResponse),
        (status = 400, description = "Invalid recipient address or amount"),
        (status = 401, description = "No session with a linked wallet")
    )
)]
pub async fn transfer(
    WalletAuth(session): WalletAuth,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let Json(request) = body?;
    let to_address = request
        .to_address
        .filter(|addr| addr.starts_with(WalletAddress::PREFIX))
        .ok_or_else(|| ApiError::bad_request("Invalid recipient address"))?;
    let amount = validate_amount(request.amount)?;
    let tx_hash = mock_tx_hash()?;

    tracing::info!(
        wallet = %session.wallet_address,
        to_address = %to_address,
        tx_hash = %tx_hash,
        "Token transfer submitted"
    );
    Ok(Json(TransferResponse {
        success: true,
        tx_hash,
        to_address,
        amount,
    }))
}
