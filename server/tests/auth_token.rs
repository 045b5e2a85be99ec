use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use axum::{Extension, Router};
use chrono::{Duration, Utc};
use clap::Parser;
use jsonwebtoken::{Header, encode};
use server::auth::{self, Claims, Keys};
use server::{AppContext, Config, db};
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "test-signing-secret";

fn test_keys() -> Keys {
    Keys::new(TEST_SECRET.as_bytes())
}

/// An `AppContext` with a lazy pool that never connects; enough for routes
/// that only touch the token service.
async fn test_app_context() -> anyhow::Result<AppContext> {
    let config = Config::try_parse_from([
        "server",
        "--jwt-secret",
        TEST_SECRET,
        "--pg-host",
        "localhost",
        "--pg-port",
        "5432",
        "--pg-user",
        "postgres",
        "--pg-password",
        "postgres",
        "--pg-database",
        "postgres",
        "--pg-max-connections",
        "2",
        "--spa-dist",
        "/tmp",
    ])?;
    let pool = db::get_pool(config.pg.clone()).await?;
    let (tx_sync_feeds, _rx) = tokio::sync::watch::channel(());
    Ok(AppContext {
        pool,
        config: Arc::new(config),
        keys: Arc::new(test_keys()),
        tx_sync_feeds,
    })
}

async fn whoami(claims: Claims) -> String {
    claims.sub
}

fn protected_router(app_context: AppContext) -> Router {
    Router::new()
        .route("/protected", get(whoami))
        .layer(Extension(app_context))
}

#[test]
fn token_round_trip_returns_original_identity() -> anyhow::Result<()> {
    let keys = test_keys();
    let user_id = Uuid::new_v4();

    let token = auth::issue_token(&keys, user_id, "alice")?;
    let claims = auth::verify_token(&keys, &token)?;

    assert_eq!(claims.user_id, user_id);
    assert_eq!(claims.sub, "alice");
    Ok(())
}

#[test]
fn expired_token_is_rejected() -> anyhow::Result<()> {
    let keys = test_keys();
    let claims = Claims {
        sub: "alice".to_owned(),
        exp: (Utc::now() - Duration::hours(1)).timestamp(),
        user_id: Uuid::new_v4(),
    };
    let token = encode(&Header::default(), &claims, &keys.encoding)?;

    assert!(auth::verify_token(&keys, &token).is_err());
    Ok(())
}

#[test]
fn tampered_signature_is_rejected() -> anyhow::Result<()> {
    let keys = test_keys();
    let token = auth::issue_token(&keys, Uuid::new_v4(), "alice")?;

    let (head, signature) = token
        .rsplit_once('.')
        .expect("JWT should have three segments");

    // Flip every character of the signature segment one at a time; every
    // variant must fail verification.
    for (i, c) in signature.char_indices() {
        let replacement = if c == 'A' { 'B' } else { 'A' };
        if c == replacement {
            continue;
        }
        let mut tampered_signature = String::with_capacity(signature.len());
        tampered_signature.push_str(&signature[..i]);
        tampered_signature.push(replacement);
        tampered_signature.push_str(&signature[i + c.len_utf8()..]);

        let tampered = format!("{head}.{tampered_signature}");
        assert!(
            auth::verify_token(&keys, &tampered).is_err(),
            "tampered token accepted at position {i}"
        );
    }
    Ok(())
}

#[test]
fn token_from_other_secret_is_rejected() -> anyhow::Result<()> {
    let other_keys = Keys::new(b"other-secret");
    let token = auth::issue_token(&other_keys, Uuid::new_v4(), "alice")?;

    assert!(auth::verify_token(&test_keys(), &token).is_err());
    Ok(())
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> anyhow::Result<()> {
    let app = protected_router(test_app_context().await?);

    let response = app
        .oneshot(Request::builder().uri("/protected").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_token_is_forbidden() -> anyhow::Result<()> {
    let app = protected_router(test_app_context().await?);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_forbidden() -> anyhow::Result<()> {
    let app = protected_router(test_app_context().await?);

    let keys = test_keys();
    let claims = Claims {
        sub: "alice".to_owned(),
        exp: (Utc::now() - Duration::days(8)).timestamp(),
        user_id: Uuid::new_v4(),
    };
    let token = encode(&Header::default(), &claims, &keys.encoding)?;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_handler_with_identity() -> anyhow::Result<()> {
    let app = protected_router(test_app_context().await?);

    let token = auth::issue_token(&test_keys(), Uuid::new_v4(), "alice")?;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"alice");
    Ok(())
}
