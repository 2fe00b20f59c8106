// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end tests for the session endpoints, driving the router with
//! `oneshot` and a local fake Discord API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use athena_server::{
    api::router,
    oauth::{DiscordClient, DiscordConfig},
    server::{serve, shutdown_on, SHUTDOWN_GRACE},
    session::{InMemorySessionStore, SessionStore},
    state::AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_server::Handle;
use serde_json::{json, Value};
use tower::ServiceExt;

const GOOD_CODE: &str = "good-code";
const ACCESS_TOKEN: &str = "fake-access-token";
const DISCORD_ID: &str = "80351110224678912";

async fn fake_token(Form(form): Form<HashMap<String, String>>) -> Response {
    let valid = form.get("code").map(String::as_str) == Some(GOOD_CODE)
        && form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("client_secret").map(String::as_str) == Some("test-secret");
    if !valid {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))).into_response();
    }
    Json(json!({ "access_token": ACCESS_TOKEN, "token_type": "Bearer", "scope": "identify" })).into_response()
}

async fn fake_user(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {ACCESS_TOKEN}"))
        .unwrap_or(false);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": DISCORD_ID,
        "username": "nelly",
        "avatar": "8342729096ea3675442027381ff50dfe",
        "discriminator": "0"
    }))
    .into_response()
}

struct TestApp {
    app: Router,
    sessions: Arc<InMemorySessionStore>,
}

/// Discord endpoints that behave.
fn fake_discord() -> Router {
    Router::new()
        .route("/api/oauth2/token", post(fake_token))
        .route("/api/users/@me", get(fake_user))
}

async fn spawn_app() -> TestApp {
    spawn_app_with(fake_discord(), Duration::from_secs(5)).await
}

/// App wired to `fake_discord` served on a local port, with the given
/// outbound timeout.
async fn spawn_app_with(fake_discord: Router, timeout: Duration) -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake_discord).await.unwrap();
    });

    let base: url::Url = format!("http://{addr}/api/").parse().unwrap();
    let config = DiscordConfig::new(
        "test-client",
        "test-secret",
        "http://localhost:8080/api/auth/callback".parse().unwrap(),
    )
    .with_api_base(&base)
    .unwrap()
    .with_timeout(timeout);

    let sessions = Arc::new(InMemorySessionStore::new());
    let state = AppState::new(sessions.clone(), DiscordClient::new(config).unwrap());
    TestApp {
        app: router(state),
        sessions,
    }
}

/// Value of the `name` cookie set by the response, if any.
fn set_cookie(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix(&prefix).map(|rest| rest.split(';').next().unwrap_or("").to_string()))
}

fn location(response: &Response) -> String {
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_with_cookies(uri: &str, cookies: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        let header_value = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header(header::COOKIE, header_value);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header(header::COOKIE, format!("athena_session={id}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn claim_wallet(app: &Router, address: &str, session: Option<&str>) -> Response {
    app.clone()
        .oneshot(post_json("/api/auth/wallet", json!({ "walletAddress": address }), session))
        .await
        .unwrap()
}

#[tokio::test]
async fn wallet_claim_without_cookie_creates_session() {
    let TestApp { app, sessions } = spawn_app().await;

    let response = claim_wallet(&app, "0xABCD", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let session_id = set_cookie(&response, "athena_session").expect("session cookie");
    let cookie_header = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("athena_session="))
        .unwrap()
        .to_string();
    assert!(cookie_header.contains("HttpOnly"));
    assert!(cookie_header.contains("Secure"));
    assert!(cookie_header.contains("SameSite=Lax"));
    assert!(cookie_header.contains("Path=/"));
    assert!(cookie_header.contains("Max-Age=604800"));

    let body = body_json(response).await;
    assert_eq!(body, json!({ "user": { "walletAddress": "0xABCD" } }));
    assert_eq!(sessions.len(), 1);

    let me = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/me", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["user"]["walletAddress"], "0xABCD");
}

#[tokio::test]
async fn wallet_claim_rejects_addresses_without_hex_prefix() {
    let TestApp { app, sessions } = spawn_app().await;

    for bad in ["ABCD", "742d35Cc6634C0532925a3b844Bc9e7595f4aB12", "", "0X12"] {
        let response = claim_wallet(&app, bad, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "address {bad:?}");
        assert_eq!(body_json(response).await, json!({ "error": "Invalid wallet address" }));
    }

    let malformed = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/wallet")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn callback_without_code_redirects_with_no_code() {
    let TestApp { app, sessions } = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/callback?error=access_denied", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/?error=no_code");
    assert!(set_cookie(&response, "athena_session").is_none());
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn discord_login_merges_into_existing_wallet_session() {
    let TestApp { app, sessions } = spawn_app().await;

    let claimed = claim_wallet(&app, "0xABCD", None).await;
    let session_id = set_cookie(&claimed, "athena_session").unwrap();

    let start = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/discord", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::FOUND);
    let authorize: url::Url = location(&start).parse().unwrap();
    let query: HashMap<_, _> = authorize.query_pairs().into_owned().collect();
    assert_eq!(query["client_id"], "test-client");
    assert_eq!(query["scope"], "identify");
    let state = set_cookie(&start, "athena_oauth_state").expect("state cookie");
    assert_eq!(query["state"], state);

    let callback = app
        .clone()
        .oneshot(get_with_cookies(
            &format!("/api/auth/callback?code={GOOD_CODE}&state={state}"),
            &[("athena_session", &session_id), ("athena_oauth_state", &state)],
        ))
        .await
        .unwrap();
    assert_eq!(callback.status(), StatusCode::FOUND);
    assert_eq!(location(&callback), "/");
    assert_eq!(set_cookie(&callback, "athena_session").as_deref(), Some(session_id.as_str()));
    assert_eq!(set_cookie(&callback, "athena_oauth_state").as_deref(), Some(""));
    assert_eq!(sessions.len(), 1);

    let me = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/me", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(
        body_json(me).await,
        json!({
            "user": {
                "walletAddress": "0xABCD",
                "discordId": DISCORD_ID,
                "discordUsername": "nelly",
                "discordAvatar": "8342729096ea3675442027381ff50dfe"
            }
        })
    );

    // The state token is single-use.
    let replay = app
        .clone()
        .oneshot(get_with_cookies(
            &format!("/api/auth/callback?code={GOOD_CODE}&state={state}"),
            &[("athena_oauth_state", &state)],
        ))
        .await
        .unwrap();
    assert_eq!(location(&replay), "/?error=discord_auth_failed");
}

#[tokio::test]
async fn discord_login_without_session_creates_discord_only_session() {
    let TestApp { app, sessions } = spawn_app().await;

    let start = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/discord", &[]))
        .await
        .unwrap();
    let state = set_cookie(&start, "athena_oauth_state").unwrap();

    let callback = app
        .clone()
        .oneshot(get_with_cookies(
            &format!("/api/auth/callback?code={GOOD_CODE}&state={state}"),
            &[("athena_oauth_state", &state)],
        ))
        .await
        .unwrap();
    assert_eq!(location(&callback), "/");
    let session_id = set_cookie(&callback, "athena_session").expect("new session cookie");
    assert_eq!(sessions.len(), 1);

    // Discord alone does not pass the wallet gate.
    let balances = app
        .clone()
        .oneshot(get_with_cookies("/api/tokens/balances", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(balances.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_token_exchange_redirects_with_auth_failed() {
    let TestApp { app, sessions } = spawn_app().await;

    let start = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/discord", &[]))
        .await
        .unwrap();
    let state = set_cookie(&start, "athena_oauth_state").unwrap();

    let callback = app
        .clone()
        .oneshot(get_with_cookies(
            &format!("/api/auth/callback?code=expired-code&state={state}"),
            &[("athena_oauth_state", &state)],
        ))
        .await
        .unwrap();
    assert_eq!(location(&callback), "/?error=discord_auth_failed");
    assert!(set_cookie(&callback, "athena_session").is_none());
    assert!(sessions.is_empty());
}

/// Start the flow without a session and return the callback response for `code`.
async fn login_with_code(app: &Router, code: &str) -> Response {
    let start = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/discord", &[]))
        .await
        .unwrap();
    let state = set_cookie(&start, "athena_oauth_state").unwrap();

    app.clone()
        .oneshot(get_with_cookies(
            &format!("/api/auth/callback?code={code}&state={state}"),
            &[("athena_oauth_state", &state)],
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn stalled_token_endpoint_times_out_with_auth_failed() {
    async fn stalled_token() -> Response {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "access_token": ACCESS_TOKEN })).into_response()
    }
    let discord = Router::new()
        .route("/api/oauth2/token", post(stalled_token))
        .route("/api/users/@me", get(fake_user));
    let TestApp { app, sessions } = spawn_app_with(discord, Duration::from_secs(1)).await;

    let started = std::time::Instant::now();
    let callback = login_with_code(&app, GOOD_CODE).await;

    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    assert_eq!(callback.status(), StatusCode::FOUND);
    assert_eq!(location(&callback), "/?error=discord_auth_failed");
    assert!(set_cookie(&callback, "athena_session").is_none());
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn failed_profile_fetch_redirects_with_auth_failed() {
    let discord = Router::new()
        .route("/api/oauth2/token", post(fake_token))
        .route("/api/users/@me", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let TestApp { app, sessions } = spawn_app_with(discord, Duration::from_secs(5)).await;

    let callback = login_with_code(&app, GOOD_CODE).await;

    assert_eq!(callback.status(), StatusCode::FOUND);
    assert_eq!(location(&callback), "/?error=discord_auth_failed");
    assert!(set_cookie(&callback, "athena_session").is_none());
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn shutdown_lets_in_flight_callback_finish() {
    async fn slow_token(form: Form<HashMap<String, String>>) -> Response {
        tokio::time::sleep(Duration::from_secs(1)).await;
        fake_token(form).await
    }
    let discord = Router::new()
        .route("/api/oauth2/token", post(slow_token))
        .route("/api/users/@me", get(fake_user));
    let TestApp { app, sessions } = spawn_app_with(discord, Duration::from_secs(5)).await;

    let start = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/discord", &[]))
        .await
        .unwrap();
    let state = set_cookie(&start, "athena_oauth_state").unwrap();

    let handle = Handle::new();
    let server = tokio::spawn(serve(app, "127.0.0.1:0".parse().unwrap(), None, handle.clone()));
    let addr = handle.listening().await.expect("server bound");

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let callback = tokio::spawn(
        client
            .get(format!("http://{addr}/api/auth/callback?code={GOOD_CODE}&state={state}"))
            .header(reqwest::header::COOKIE, format!("athena_oauth_state={state}"))
            .send(),
    );

    // Shut down while the callback is still waiting on the token endpoint.
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown_on(handle, async {}, SHUTDOWN_GRACE).await.unwrap();

    let response = callback.await.unwrap().expect("callback answered");
    assert_eq!(response.status(), reqwest::StatusCode::FOUND);
    assert_eq!(response.headers()[reqwest::header::LOCATION].to_str().unwrap(), "/");
    server.await.unwrap().expect("server stopped cleanly");
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn logout_without_cookie_succeeds_without_store_mutation() {
    let TestApp { app, sessions } = spawn_app().await;
    claim_wallet(&app, "0x1", None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie(&response, "athena_session").as_deref(), Some(""));
    assert_eq!(body_json(response).await, json!({ "success": true }));
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn logout_deletes_session_and_me_returns_null_user() {
    let TestApp { app, sessions } = spawn_app().await;
    let claimed = claim_wallet(&app, "0x1", None).await;
    let session_id = set_cookie(&claimed, "athena_session").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, format!("athena_session={session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(sessions.is_empty());

    let me = app
        .clone()
        .oneshot(get_with_cookies("/api/auth/me", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(me).await, json!({ "user": null }));
}

#[tokio::test]
async fn token_endpoints_require_wallet_session() {
    let TestApp { app, sessions } = spawn_app().await;

    // No cookie.
    let response = app
        .clone()
        .oneshot(get_with_cookies("/api/tokens/balances", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));

    // Unknown session.
    let response = app
        .clone()
        .oneshot(post_json("/api/tokens/purchase", json!({ "amount": 10 }), Some("not-a-session")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Deleted session.
    let claimed = claim_wallet(&app, "0xABCD", None).await;
    let session_id = set_cookie(&claimed, "athena_session").unwrap();
    sessions.delete(&session_id.as_str().into()).unwrap();
    let response = app
        .clone()
        .oneshot(get_with_cookies("/api/tokens/balances", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_endpoints_serve_wallet_session() {
    let TestApp { app, .. } = spawn_app().await;
    let claimed = claim_wallet(&app, "0xABCD", None).await;
    let session_id = set_cookie(&claimed, "athena_session").unwrap();

    let balances = app
        .clone()
        .oneshot(get_with_cookies("/api/tokens/balances", &[("athena_session", &session_id)]))
        .await
        .unwrap();
    assert_eq!(balances.status(), StatusCode::OK);
    assert_eq!(
        body_json(balances).await,
        json!({ "spaceTime": "100.0", "spaceMoney": "50.0" })
    );

    let purchase = app
        .clone()
        .oneshot(post_json("/api/tokens/purchase", json!({ "amount": "10" }), Some(&session_id)))
        .await
        .unwrap();
    assert_eq!(purchase.status(), StatusCode::OK);
    let body = body_json(purchase).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["amount"], "10");
    assert_eq!(body["txHash"].as_str().unwrap().len(), 66);

    // Integer amounts come back as integers, not `10.0`.
    let purchase = app
        .clone()
        .oneshot(post_json("/api/tokens/purchase", json!({ "amount": 10 }), Some(&session_id)))
        .await
        .unwrap();
    assert_eq!(purchase.status(), StatusCode::OK);
    let bytes = to_bytes(purchase.into_body(), usize::MAX).await.unwrap();
    assert!(std::str::from_utf8(&bytes).unwrap().ends_with(r#""amount":10}"#));

    let invalid = app
        .clone()
        .oneshot(post_json("/api/tokens/purchase", json!({ "amount": 0 }), Some(&session_id)))
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(invalid).await, json!({ "error": "Invalid amount" }));

    let transfer = app
        .clone()
        .oneshot(post_json(
            "/api/tokens/transfer",
            json!({ "toAddress": "nope", "amount": 1 }),
            Some(&session_id),
        ))
        .await
        .unwrap();
    assert_eq!(transfer.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(transfer).await, json!({ "error": "Invalid recipient address" }));

    let transfer = app
        .clone()
        .oneshot(post_json(
            "/api/tokens/transfer",
            json!({ "toAddress": "0x1234", "amount": 2.5 }),
            Some(&session_id),
        ))
        .await
        .unwrap();
    assert_eq!(transfer.status(), StatusCode::OK);
    let body = body_json(transfer).await;
    assert_eq!(body["toAddress"], "0x1234");
    assert_eq!(body["amount"], 2.5);
}
