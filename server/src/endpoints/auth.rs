use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_macros::debug_handler;
use secrecy::ExposeSecret;
use shared::{
    MeResponse, SessionUser, SignInRequest, SignInResponse, SignUpRequest, SignUpResponse,
};
use tracing::{debug, error, info, warn};

use crate::AppContext;
use crate::auth::{self, Claims};
use crate::db::user;
use crate::error::{Error, Result};

fn validate_signup(payload: &SignUpRequest) -> Result<()> {
    let mut errors: Vec<(&'static str, &'static str)> = Vec::new();
    if payload.username.trim().is_empty() {
        errors.push(("username", "username must not be empty"));
    }
    if payload.email.trim().is_empty() {
        errors.push(("email", "email must not be empty"));
    } else if !payload.email.contains('@') {
        errors.push(("email", "email must be a valid address"));
    }
    if payload.password.expose_secret().trim().is_empty() {
        errors.push(("password", "password must not be empty"));
    }
    if payload
        .password
        .expose_secret()
        .ne(payload.password_confirmation.expose_secret())
    {
        errors.push(("password", "password confirmation should match"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::unprocessable_entity(errors))
    }
}

fn validate_signin(payload: &SignInRequest) -> Result<()> {
    let mut errors: Vec<(&'static str, &'static str)> = Vec::new();
    if payload.username.trim().is_empty() {
        errors.push(("username", "username must not be empty"));
    }
    if payload.password.expose_secret().trim().is_empty() {
        errors.push(("password", "password must not be empty"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::unprocessable_entity(errors))
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

/// Identity check behind the bearer token. The SPA calls this on every page
/// load to reconcile its persisted session before trusting it.
#[debug_handler]
async fn me(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
) -> Result<Json<MeResponse>> {
    debug!(
        user_id = %claims.user_id,
        username = %claims.sub,
        "Verifying session identity"
    );
    match user::get_by_id(&app_context.pool, &claims.user_id).await {
        Ok(Some(user)) => {
            debug!(user_id = %user.user_id, "Session identity confirmed");
            Ok(Json(MeResponse {
                user: SessionUser {
                    id: user.user_id,
                    username: user.username,
                },
            }))
        }
        Ok(None) => {
            warn!(
                user_id = %claims.user_id,
                username = %claims.sub,
                "Valid token for a user that no longer exists"
            );
            Err(Error::InvalidToken)
        }
        Err(error) => {
            error!(
                user_id = %claims.user_id,
                error = %error,
                "Database error verifying session identity"
            );
            Err(error)
        }
    }
}

/// Tokens are stateless, so there is nothing to revoke server-side; the
/// endpoint exists so clients can announce the logout and it shows up in the
/// request log.
#[debug_handler]
async fn logout(claims: Claims) -> Result<StatusCode> {
    info!(
        user_id = %claims.user_id,
        username = %claims.sub,
        "User logged out"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
async fn sign_up(
    Extension(app_context): Extension<AppContext>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    info!(username = %payload.username, "User signup attempt");
    validate_signup(&payload)?;
    debug!(username = %payload.username, "Signup validation passed");

    let hashed_password = auth::hash_password(payload.password.expose_secret().to_owned()).await?;
    let try_user = user::create(
        &app_context.pool,
        payload.username.clone(),
        payload.email.clone(),
        hashed_password,
    )
    .await;
    match try_user {
        Ok(user) => {
            info!(
                user_id = %user.user_id,
                username = %user.username,
                "User successfully created"
            );
            Ok((
                StatusCode::CREATED,
                Json(SignUpResponse {
                    id: user.user_id,
                    username: user.username,
                }),
            ))
        }
        Err(Error::ConstraintViolation {
            constraint,
            message: _,
        }) if constraint.eq("unique_username") => {
            warn!(
                username = %payload.username,
                "Signup failed - username already exists"
            );
            Err(Error::bad_request([(
                "username",
                "username already created",
            )]))
        }
        Err(Error::ConstraintViolation {
            constraint,
            message: _,
        }) if constraint.eq("unique_email") => {
            warn!(
                username = %payload.username,
                "Signup failed - email already registered"
            );
            Err(Error::bad_request([("email", "email already registered")]))
        }
        Err(error) => {
            error!(username = %payload.username, error = %error, "Signup failed");
            Err(error)
        }
    }
}

#[debug_handler]
async fn sign_in(
    Extension(app_context): Extension<AppContext>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    info!(username = %payload.username, "User signin attempt");
    validate_signin(&payload)?;
    debug!(username = %payload.username, "Signin validation passed");

    let maybe_user = user::get_by_username(&app_context.pool, payload.username.clone()).await?;
    if let Some(user) = maybe_user {
        debug!(username = %user.username, "User found for signin");
        auth::verify_password(
            payload.password.expose_secret().to_owned(),
            user.password_hash.clone(),
        )
        .await?;
        debug!(
            username = %user.username,
            "Password verification successful"
        );

        let token = auth::issue_token(&app_context.keys, user.user_id, &user.username)?;
        info!(
            user_id = %user.user_id,
            username = %user.username,
            "User successfully authenticated"
        );

        let login_response = SignInResponse {
            user_id: user.user_id,
            username: user.username,
            access_token: token,
            token_type: "Bearer".to_owned(),
        };
        return Ok(Json(login_response));
    }

    warn!(
        username = %payload.username,
        "Signin failed - user not found or wrong credentials"
    );
    Err(Error::WrongCredentials)
}
