// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login, and logout routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AUTH_COOKIE};
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::services::password;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
}

/// Successful authentication response. The token also rides in a session
/// cookie; the body copy is for clients that prefer a Bearer header.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub username: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub message: String,
}

/// Session cookie holding the JWT. No explicit expiry: the cookie lives for
/// the browser session and the token inside it carries its own expiry.
fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn session_response(
    jar: CookieJar,
    token: String,
    username: String,
    message: &str,
) -> (CookieJar, Json<AuthResponse>) {
    let jar = jar.add(session_cookie(token.clone()));
    (
        jar,
        Json(AuthResponse {
            message: message.to_string(),
            token,
            username,
        }),
    )
}

/// Create a new account and log the user in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    payload.validate()?;

    if state.db.get_user(&payload.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let now = format_utc_rfc3339(chrono::Utc::now());
    let user = User {
        username: payload.username,
        email: payload.email,
        password_hash: password::hash_password(&payload.password)?,
        created_at: now.clone(),
        last_active: now,
    };
    state.db.upsert_user(&user).await?;

    let token = create_jwt(&user.username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(username = %user.username, "New account registered");

    Ok(session_response(
        jar,
        token,
        user.username,
        "Account created successfully!",
    ))
}

/// Verify credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    // Unknown username and wrong password produce the same response so
    // account names cannot be probed.
    let Some(mut user) = state.db.get_user(&payload.username).await? else {
        return Err(AppError::Unauthorized);
    };

    if !password::verify_password(&payload.password, &user.password_hash) {
        tracing::info!(username = %payload.username, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    user.last_active = format_utc_rfc3339(chrono::Utc::now());
    state.db.upsert_user(&user).await?;

    let token = create_jwt(&user.username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(username = %user.username, "User logged in");

    Ok(session_response(
        jar,
        token,
        user.username,
        "Logged in successfully!",
    ))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    // Removal must match the path the cookie was set with.
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));

    (
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully!".to_string(),
        }),
    )
}
