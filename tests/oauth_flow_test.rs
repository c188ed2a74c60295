// ABOUTME: Integration tests for the authorization-code flow from registration to token
// ABOUTME: Covers single-use codes, expiry, client authentication, and concurrent exchange
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, Utc};
use common::{
    file_sqlite_resources, login_for_code, login_request, memory_resources, obtain_token,
    query_param, register_default_user, token_request, CLIENT_ID, CLIENT_SECRET, EMAIL, PASSWORD,
    REDIRECT_URI, SCOPE,
};
use taskgate::{
    auth::CredentialIssuer,
    errors::ErrorCode,
    middleware::RequestAuthorizer,
    oauth2_server::{AuthorizeRequest, LoginRequest, RegisterRequest, TokenRequest},
    resources::ServerResources,
};

#[tokio::test]
async fn test_register_login_exchange_authorize() {
    let (_store, resources) = memory_resources();

    let user = register_default_user(&resources).await;
    assert_eq!(user.email, EMAIL);

    let redirect = resources
        .oauth_server
        .login(login_request(SCOPE, Some("xyz")))
        .await
        .unwrap();
    assert!(redirect.starts_with(REDIRECT_URI));
    assert_eq!(query_param(&redirect, "state").as_deref(), Some("xyz"));
    let code = query_param(&redirect, "code").unwrap();
    assert!(code.len() >= 43, "code carries at least 256 bits");

    let token = resources
        .oauth_server
        .exchange_token(token_request(&code))
        .await
        .unwrap();
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, 86_400);
    assert_eq!(token.scope, SCOPE);

    let context = resources
        .authorizer
        .authorize_request(Some(&format!("Bearer {}", token.access_token)))
        .await
        .unwrap();
    assert_eq!(context.user.id, user.id);
    assert_eq!(context.claims.principal_id, user.id);
    assert_eq!(context.claims.scope, SCOPE);
    assert!(RequestAuthorizer::check_scope(&context.claims, "tasks:read"));
    assert!(RequestAuthorizer::check_scope(&context.claims, "tasks:write"));
    assert!(!RequestAuthorizer::check_scope(&context.claims, "tasks:admin"));
}

#[tokio::test]
async fn test_token_claims_match_persisted_record() {
    let (_store, resources) = memory_resources();
    let token = obtain_token(&resources, "tasks:read").await;

    let context = resources
        .authorizer
        .authorize_request(Some(&format!("Bearer {}", token.access_token)))
        .await
        .unwrap();

    assert_eq!(context.token.token, token.access_token);
    assert_eq!(context.token.user_id, context.claims.principal_id);
    assert_eq!(context.token.scope, context.claims.scope);
    assert_eq!(context.token.client_id, CLIENT_ID);
    assert_eq!(
        context.token.expires_at - context.token.created_at,
        Duration::hours(24)
    );
}

#[tokio::test]
async fn test_code_is_single_use() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    resources
        .oauth_server
        .exchange(&code, CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap();

    let err = resources
        .oauth_server
        .exchange(&code, CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_expired_code_fails_like_consumed_code() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;

    let consumed = login_for_code(&resources, SCOPE).await;
    resources
        .oauth_server
        .exchange(&consumed, CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap();
    let consumed_err = resources
        .oauth_server
        .exchange(&consumed, CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap_err();

    let expired = login_for_code(&resources, SCOPE).await;
    let expired_err = resources
        .oauth_server
        .exchange_at(
            &expired,
            CLIENT_ID,
            CLIENT_SECRET,
            Utc::now() + Duration::minutes(11),
        )
        .await
        .unwrap_err();

    assert_eq!(expired_err.code, ErrorCode::InvalidGrant);
    assert_eq!(expired_err.code, consumed_err.code);
    assert_eq!(expired_err.message, consumed_err.message);
}

#[tokio::test]
async fn test_code_still_valid_just_before_expiry() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    resources
        .oauth_server
        .exchange_at(
            &code,
            CLIENT_ID,
            CLIENT_SECRET,
            Utc::now() + Duration::minutes(9),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_wrong_client_secret_is_invalid_client_and_keeps_code() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    let err = resources
        .oauth_server
        .exchange(&code, CLIENT_ID, "not-the-secret")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidClient);

    // The legitimate client can still redeem it
    resources
        .oauth_server
        .exchange(&code, CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_code_and_other_client() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    let unknown = resources
        .oauth_server
        .exchange("no-such-code", CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap_err();
    assert_eq!(unknown.code, ErrorCode::InvalidGrant);

    let other_client = resources
        .oauth_server
        .exchange(&code, "other-client", CLIENT_SECRET)
        .await
        .unwrap_err();
    assert_eq!(other_client.code, ErrorCode::InvalidGrant);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exchange_has_exactly_one_winner() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let server = Arc::clone(&resources.oauth_server);
            let code = code.clone();
            tokio::spawn(async move { server.exchange(&code, CLIENT_ID, CLIENT_SECRET).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.code, ErrorCode::InvalidGrant),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exchange_on_sqlite_file_has_exactly_one_winner() {
    let (store, resources, path) = file_sqlite_resources().await;
    assert!(store.pool().options().get_max_connections() > 1);
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let server = Arc::clone(&resources.oauth_server);
            let code = code.clone();
            tokio::spawn(async move { server.exchange(&code, CLIENT_ID, CLIENT_SECRET).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.code, ErrorCode::InvalidGrant, "{e}"),
        }
    }
    assert_eq!(successes, 1);

    store.pool().close().await;
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_token_endpoint_parameter_checks() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;
    let code = login_for_code(&resources, SCOPE).await;

    let wrong_grant = resources
        .oauth_server
        .exchange_token(TokenRequest {
            grant_type: "client_credentials".to_owned(),
            ..token_request(&code)
        })
        .await
        .unwrap_err();
    assert_eq!(wrong_grant.code, ErrorCode::UnsupportedGrantType);

    let missing_code = resources
        .oauth_server
        .exchange_token(TokenRequest {
            code: None,
            ..token_request(&code)
        })
        .await
        .unwrap_err();
    assert_eq!(missing_code.code, ErrorCode::InvalidRequest);

    let wrong_redirect = resources
        .oauth_server
        .exchange_token(TokenRequest {
            redirect_uri: Some("http://evil.example/cb".to_owned()),
            ..token_request(&code)
        })
        .await
        .unwrap_err();
    assert_eq!(wrong_redirect.code, ErrorCode::InvalidGrant);

    // None of the rejected requests consumed the code
    let token = resources
        .oauth_server
        .exchange_token(TokenRequest {
            redirect_uri: None,
            ..token_request(&code)
        })
        .await
        .unwrap();
    assert_eq!(token.scope, SCOPE);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;

    let wrong_password = resources
        .oauth_server
        .login(LoginRequest {
            password: "wrong-password".to_owned(),
            ..login_request(SCOPE, None)
        })
        .await
        .unwrap_err();

    let unknown_email = resources
        .oauth_server
        .login(LoginRequest {
            email: "nobody@example.com".to_owned(),
            ..login_request(SCOPE, None)
        })
        .await
        .unwrap_err();

    assert_eq!(wrong_password.code, ErrorCode::InvalidCredentials);
    assert_eq!(wrong_password.code, unknown_email.code);
    assert_eq!(wrong_password.message, unknown_email.message);
}

async fn average_failed_login(resources: &ServerResources, email: &str) -> StdDuration {
    const ROUNDS: u32 = 5;
    let mut total = StdDuration::ZERO;
    for _ in 0..ROUNDS {
        let request = LoginRequest {
            email: email.to_owned(),
            password: "wrong-password".to_owned(),
            ..login_request(SCOPE, None)
        };
        let started = Instant::now();
        let err = resources.oauth_server.login(request).await.unwrap_err();
        total += started.elapsed();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }
    total / ROUNDS
}

#[tokio::test]
async fn test_unknown_email_costs_the_same_as_wrong_password() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;

    // Warm the blocking pool so neither side pays thread start-up
    average_failed_login(&resources, EMAIL).await;

    let known = average_failed_login(&resources, EMAIL).await;
    let unknown = average_failed_login(&resources, "nobody@example.com").await;

    // At cost 4 both sides take about a millisecond; a stronger fixed-cost
    // equalizer hash would put the unknown side hundreds of times higher
    let ceiling = known * 10 + StdDuration::from_millis(25);
    assert!(
        unknown < ceiling,
        "unknown email averaged {unknown:?}, known email averaged {known:?}"
    );
}

#[tokio::test]
async fn test_login_validates_before_issuing() {
    let (store, resources) = memory_resources();
    register_default_user(&resources).await;

    let missing = resources
        .oauth_server
        .login(LoginRequest {
            password: String::new(),
            ..login_request(SCOPE, None)
        })
        .await
        .unwrap_err();
    assert_eq!(missing.code, ErrorCode::InvalidRequest);

    let bad_client = resources
        .oauth_server
        .login(LoginRequest {
            client_id: "other-client".to_owned(),
            ..login_request(SCOPE, None)
        })
        .await
        .unwrap_err();
    assert_eq!(bad_client.code, ErrorCode::InvalidRequest);

    let bad_redirect = resources
        .oauth_server
        .login(LoginRequest {
            redirect_uri: "http://evil.example/cb".to_owned(),
            ..login_request(SCOPE, None)
        })
        .await
        .unwrap_err();
    assert_eq!(bad_redirect.code, ErrorCode::InvalidRequest);

    assert_eq!(store.auth_code_count(), 0);
}

#[tokio::test]
async fn test_authenticate_and_issue_code_binds_scope() {
    let (_store, resources) = memory_resources();
    let user = register_default_user(&resources).await;

    let code = resources
        .oauth_server
        .authenticate_and_issue_code(EMAIL, PASSWORD, CLIENT_ID, "tasks:read")
        .await
        .unwrap();
    assert_eq!(code.user_id, user.id);
    assert_eq!(code.client_id, CLIENT_ID);
    assert_eq!(code.scope, "tasks:read");
    assert_eq!(code.expires_at - code.created_at, Duration::minutes(10));

    let token = resources
        .oauth_server
        .exchange(&code.code, CLIENT_ID, CLIENT_SECRET)
        .await
        .unwrap();
    assert_eq!(token.scope, "tasks:read");

    let issuer = resources.oauth_server.issuer();
    let claims = issuer.verify(&token.token).unwrap();
    assert!(CredentialIssuer::has_scope(&claims, "tasks:read"));
    assert!(!CredentialIssuer::has_scope(&claims, "tasks:write"));
}

#[tokio::test]
async fn test_begin_authorization_validation() {
    let (_store, resources) = memory_resources();
    let valid = AuthorizeRequest {
        response_type: "code".to_owned(),
        client_id: CLIENT_ID.to_owned(),
        redirect_uri: REDIRECT_URI.to_owned(),
        scope: Some(SCOPE.to_owned()),
        state: Some("abc".to_owned()),
    };

    let prompt = resources
        .oauth_server
        .begin_authorization(valid.clone())
        .unwrap();
    assert_eq!(prompt.scope.as_deref(), Some(SCOPE));
    assert_eq!(prompt.state.as_deref(), Some("abc"));

    for request in [
        AuthorizeRequest {
            response_type: "token".to_owned(),
            ..valid.clone()
        },
        AuthorizeRequest {
            client_id: "other-client".to_owned(),
            ..valid.clone()
        },
        AuthorizeRequest {
            redirect_uri: format!("{REDIRECT_URI}/"),
            ..valid.clone()
        },
    ] {
        let err = resources
            .oauth_server
            .begin_authorization(request)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }
}

#[tokio::test]
async fn test_registration_rules() {
    let (_store, resources) = memory_resources();
    register_default_user(&resources).await;

    let duplicate = resources
        .oauth_server
        .register(RegisterRequest {
            email: EMAIL.to_owned(),
            password: "another-password".to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!(duplicate.code, ErrorCode::ResourceAlreadyExists);

    let short = resources
        .oauth_server
        .register(RegisterRequest {
            email: "short@example.com".to_owned(),
            password: "12345".to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!(short.code, ErrorCode::InvalidRequest);

    let bad_email = resources
        .oauth_server
        .register(RegisterRequest {
            email: "not-an-email".to_owned(),
            password: PASSWORD.to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!(bad_email.code, ErrorCode::InvalidRequest);
}
