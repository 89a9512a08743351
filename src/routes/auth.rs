// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: signup, login, logout, refresh, current user.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::{Identity, UserView};
use crate::routes::extract::ValidJson;
use crate::routes::MessageResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 72))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: Identity,
}

/// Create an account and start a session.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(body): ValidJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<SignupResponse>)> {
    let (jar, user) = state
        .sessions
        .signup(jar, &body.email, &body.password, &body.full_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 320))]
    pub email: String,
    #[validate(length(min = 1, max = 72))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserView,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let (jar, outcome) = state
        .sessions
        .login(jar, &body.email, &body.password)
        .await?;

    Ok((
        jar,
        Json(LoginResponse {
            access_token: outcome.session.access_token,
            refresh_token: outcome.session.refresh_token,
            user: outcome.user,
        }),
    ))
}

/// Always succeeds, with or without a session.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = state.sessions.logout(jar).await;
    (jar, MessageResponse::new("Logged out successfully"))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    let (jar, _session) = state.sessions.refresh(jar).await?;
    Ok((jar, MessageResponse::new("Token refreshed")))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserView,
}

async fn me(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Json<MeResponse>> {
    let user = state.sessions.current_session(&jar).await?;
    Ok(Json(MeResponse { user }))
}
