// ABOUTME: HTTP-level tests driving the assembled router with in-process requests
// ABOUTME: Checks status codes, redirects, and JSON error bodies for each endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{
    memory_resources, obtain_token, query_param, CLIENT_ID, CLIENT_SECRET, EMAIL, PASSWORD,
    REDIRECT_URI, SCOPE,
};
use serde_json::{json, Value};
use taskgate::{resources::ServerResources, routes};
use tower::ServiceExt;

fn app() -> (Router, Arc<ServerResources>) {
    let (_store, resources) = memory_resources();
    (routes::router(&resources), resources)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form_post(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
        .unwrap()
}

fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn authorize_uri(client_id: &str) -> String {
    format!(
        "/oauth/authorize?{}",
        serde_urlencoded::to_string([
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", REDIRECT_URI),
            ("scope", SCOPE),
            ("state", "xyz"),
        ])
        .unwrap()
    )
}

fn login_fields<'a>(scope: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("email", EMAIL),
        ("password", PASSWORD),
        ("client_id", CLIENT_ID),
        ("redirect_uri", REDIRECT_URI),
        ("scope", scope),
        ("state", "xyz"),
    ]
}

#[tokio::test]
async fn test_health() {
    let (app, _resources) = app();
    let (status, _, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "taskgate");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_authorize_renders_form() {
    let (app, _resources) = app();
    let (status, headers, body) = send(&app, get(&authorize_uri(CLIENT_ID))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"name="state" value="xyz""#));
    assert!(html.contains(r#"action="/oauth/login""#));
}

#[tokio::test]
async fn test_authorize_rejects_unknown_client() {
    let (app, _resources) = app();
    let (status, _, body) = send(&app, get(&authorize_uri("other-client"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_without_parameters_is_json_error() {
    let (app, _resources) = app();
    let (status, headers, body) = send(&app, get("/oauth/authorize")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(json_body(&body)["error"], "invalid_request");
}

#[tokio::test]
async fn test_unreadable_form_bodies_are_json_errors() {
    let (app, _resources) = app();

    for uri in ["/oauth/login", "/oauth/token"] {
        // Wrong content type
        let (status, headers, body) =
            send(&app, json_post(uri, &json!({ "grant_type": "authorization_code" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        assert_eq!(json_body(&body)["error"], "invalid_request", "{uri}");

        // Required fields absent
        let fields = [("grant_type", "authorization_code"), ("state", "xyz")];
        let (status, _, body) = send(&app, form_post(uri, &fields)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json_body(&body)["error"], "invalid_request", "{uri}");
    }
}

#[tokio::test]
async fn test_register_endpoint() {
    let (app, _resources) = app();
    let request = json!({ "email": EMAIL, "password": PASSWORD });

    let (status, _, body) = send(&app, json_post("/oauth/register", &request)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = json_body(&body);
    assert_eq!(body["email"], EMAIL);
    assert!(body.get("password_hash").is_none());

    let (status, _, body) = send(&app, json_post("/oauth/register", &request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json_body(&body)["error"], "resource_already_exists");

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/oauth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "invalid_request");
}

#[tokio::test]
async fn test_login_token_and_protected_resource() {
    let (app, _resources) = app();
    send(
        &app,
        json_post("/oauth/register", &json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;

    let (status, headers, _) = send(&app, form_post("/oauth/login", &login_fields(SCOPE))).await;
    assert_eq!(status, StatusCode::FOUND);
    let location = headers[header::LOCATION].to_str().unwrap().to_owned();
    assert!(location.starts_with(REDIRECT_URI));
    assert_eq!(query_param(&location, "state").as_deref(), Some("xyz"));
    let code = query_param(&location, "code").unwrap();

    let (status, _, body) = send(
        &app,
        form_post(
            "/oauth/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", REDIRECT_URI),
                ("client_id", CLIENT_ID),
                ("client_secret", CLIENT_SECRET),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = json_body(&body);
    assert_eq!(token["token_type"], "Bearer");
    assert_eq!(token["expires_in"], 86_400);
    assert_eq!(token["scope"], SCOPE);
    let access_token = token["access_token"].as_str().unwrap();

    let me = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["user"]["email"], EMAIL);
    assert_eq!(body["scope"], SCOPE);

    // Replaying the code is rejected
    let (status, _, body) = send(
        &app,
        form_post(
            "/oauth/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("client_id", CLIENT_ID),
                ("client_secret", CLIENT_SECRET),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"], "invalid_grant");
}

#[tokio::test]
async fn test_login_with_bad_password() {
    let (app, _resources) = app();
    send(
        &app,
        json_post("/oauth/register", &json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;

    let mut fields = login_fields(SCOPE);
    fields[1] = ("password", "wrong-password");
    let (status, headers, body) = send(&app, form_post("/oauth/login", &fields)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get(header::LOCATION).is_none());
    assert_eq!(json_body(&body)["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_token_endpoint_rejects_other_grants() {
    let (app, _resources) = app();
    let (status, _, body) = send(
        &app,
        form_post(
            "/oauth/token",
            &[
                ("grant_type", "password"),
                ("client_id", CLIENT_ID),
                ("client_secret", CLIENT_SECRET),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn test_protected_route_auth_errors() {
    let (app, resources) = app();

    let (status, _, body) = send(&app, get("/api/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"], "missing_auth");

    let blank = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, "")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, blank).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"], "missing_auth");

    let basic = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, basic).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"], "malformed_auth");

    let write_only = obtain_token(&resources, "tasks:write").await;
    let request = Request::builder()
        .uri("/api/me")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", write_only.access_token),
        )
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json_body(&body)["error"], "insufficient_scope");
}

#[tokio::test]
async fn test_callback_echoes_code() {
    let (app, _resources) = app();

    let (status, _, body) = send(&app, get("/oauth/callback?code=abc&state=xyz")).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["code"], "abc");
    assert_eq!(body["state"], "xyz");

    let (status, _, body) = send(&app, get("/oauth/callback")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "invalid_request");
}

#[tokio::test]
async fn test_cleanup_endpoint() {
    let (app, _resources) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/oauth/cleanup")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["auth_codes_removed"], 0);
    assert_eq!(body["access_tokens_removed"], 0);
}
