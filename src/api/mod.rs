// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{LogoutResponse, MeResponse, SessionUser, UserResponse, WalletClaimRequest},
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod tokens;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/wallet", post(auth::claim_wallet))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/discord", get(auth::discord_start))
        .route("/callback", get(auth::discord_callback));

    let token_routes = Router::new()
        .route("/balances", get(tokens::balances))
        .route("/purchase", post(tokens::purchase))
        .route("/transfer", post(tokens::transfer));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tokens", token_routes)
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    // Paths only: the callback query carries the OAuth code.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    });

    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::claim_wallet,
        auth::me,
        auth::logout,
        auth::discord_start,
        auth::discord_callback,
        tokens::balances,
        tokens::purchase,
        tokens::transfer,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            SessionUser,
            WalletClaimRequest,
            UserResponse,
            MeResponse,
            LogoutResponse,
            tokens::Amount,
            tokens::BalancesResponse,
            tokens::PurchaseRequest,
            tokens::PurchaseResponse,
            tokens::TransferRequest,
            tokens::TransferResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Wallet and Discord session linking"),
        (name = "Tokens", description = "Wallet-gated token operations"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
