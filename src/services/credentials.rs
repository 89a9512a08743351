// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: identities, password checks and session tokens.
//!
//! The hosted implementation talks to the platform's GoTrue auth API:
//! - `POST /admin/users` and `DELETE /admin/users/{id}` (service key)
//! - `POST /token?grant_type=password|refresh_token`
//! - `GET /user` and `POST /logout` (user access token)

use crate::db::StoreResult;
use crate::error::StoreError;
use crate::models::{Identity, Session};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata stored on the identity at creation.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityMetadata {
    pub full_name: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with [`StoreError::DUPLICATE_IDENTITY`] if the email is taken.
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        metadata: &IdentityMetadata,
    ) -> StoreResult<Identity>;

    /// Remove an identity. Missing identities are not an error.
    async fn delete_identity(&self, id: &str) -> StoreResult<()>;

    /// Fails with [`StoreError::INVALID_CREDENTIALS`] on mismatch.
    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Session>;

    /// `None` when the token is unknown, expired or revoked.
    async fn resolve(&self, access_token: &str) -> StoreResult<Option<Identity>>;

    /// Fails with [`StoreError::INVALID_GRANT`] if the refresh token is
    /// expired, revoked or already used.
    async fn refresh(&self, refresh_token: &str) -> StoreResult<Session>;

    /// Revoke this session only. The user's other sessions stay valid.
    async fn invalidate(&self, access_token: &str) -> StoreResult<()>;
}

/// GoTrue auth API client.
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl GoTrueClient {
    /// Create a client for `{platform_url}/auth/v1`.
    pub fn new(platform_url: &str, service_key: String, timeout: Duration) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::new(StoreError::TRANSPORT, e.to_string()))?;

        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", platform_url.trim_end_matches('/')),
            service_key,
        })
    }

    /// Request with service-role credentials (admin endpoints).
    fn admin(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Request acting as the holder of `access_token`.
    fn as_user(&self, builder: reqwest::RequestBuilder, access_token: &str) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(access_token)
    }

    async fn token_grant<B: Serialize + ?Sized>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> StoreResult<reqwest::Response> {
        self.http
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.service_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl CredentialStore for GoTrueClient {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        metadata: &IdentityMetadata,
    ) -> StoreResult<Identity> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": metadata,
        });

        let response = self
            .admin(self.http.post(format!("{}/admin/users", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (status, body) = read_error(response).await;
            return Err(classify_create_error(status, &body));
        }

        decode(response).await
    }

    async fn delete_identity(&self, id: &str) -> StoreResult<()> {
        let url = format!("{}/admin/users/{}", self.base_url, urlencoding::encode(id));
        let response = self
            .admin(self.http.delete(url))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if response.status().is_success() || status == 404 {
            return Ok(());
        }

        let (status, body) = read_error(response).await;
        Err(platform_error(status, &body))
    }

    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Session> {
        let response = self
            .token_grant(
                "password",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        if !response.status().is_success() {
            let (status, body) = read_error(response).await;
            return Err(match status {
                400 | 401 => StoreError::new(StoreError::INVALID_CREDENTIALS, body.message()),
                _ => platform_error(status, &body),
            });
        }

        decode::<TokenResponse>(response).await.map(Session::from)
    }

    async fn resolve(&self, access_token: &str) -> StoreResult<Option<Identity>> {
        let response = self
            .as_user(self.http.get(format!("{}/user", self.base_url)), access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            200..=299 => decode(response).await.map(Some),
            401 | 403 | 404 => Ok(None),
            _ => {
                let (status, body) = read_error(response).await;
                Err(platform_error(status, &body))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> StoreResult<Session> {
        let response = self
            .token_grant(
                "refresh_token",
                &serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;

        if !response.status().is_success() {
            let (status, body) = read_error(response).await;
            return Err(match status {
                400 | 401 | 403 => StoreError::new(StoreError::INVALID_GRANT, body.message()),
                _ => platform_error(status, &body),
            });
        }

        decode::<TokenResponse>(response).await.map(Session::from)
    }

    async fn invalidate(&self, access_token: &str) -> StoreResult<()> {
        let response = self
            .as_user(
                self.http.post(format!("{}/logout", self.base_url)),
                access_token,
            )
            // Only this session; the default scope signs out every device.
            .query(&[("scope", "local")])
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            200..=299 | 401 | 403 | 404 => Ok(()),
            _ => {
                let (status, body) = read_error(response).await;
                Err(platform_error(status, &body))
            }
        }
    }
}

/// Token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: Identity,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            identity: token.user,
        }
    }
}

/// The auth API has used several error shapes over time.
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl GoTrueErrorBody {
    fn message(&self) -> String {
        self.error_description
            .as_ref()
            .or(self.msg.as_ref())
            .or(self.message.as_ref())
            .or(self.error.as_ref())
            .cloned()
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

async fn read_error(response: reqwest::Response) -> (u16, GoTrueErrorBody) {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or_else(|_| GoTrueErrorBody {
        message: Some(text),
        ..GoTrueErrorBody::default()
    });
    (status, body)
}

fn classify_create_error(status: u16, body: &GoTrueErrorBody) -> StoreError {
    let duplicate_code = matches!(
        body.error_code.as_deref(),
        Some("email_exists" | "user_already_exists")
    );
    let duplicate_message = status == 422 && body.message().to_lowercase().contains("already");

    if duplicate_code || duplicate_message {
        StoreError::new(StoreError::DUPLICATE_IDENTITY, body.message())
    } else {
        platform_error(status, body)
    }
}

fn platform_error(status: u16, body: &GoTrueErrorBody) -> StoreError {
    let code = body
        .error_code
        .clone()
        .unwrap_or_else(|| format!("http_{}", status));
    StoreError::new(code, body.message())
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::new(StoreError::TIMEOUT, err.to_string())
    } else {
        StoreError::new(StoreError::TRANSPORT, err.to_string())
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> StoreResult<T> {
    response
        .json()
        .await
        .map_err(|e| StoreError::new(StoreError::DECODE, format!("JSON parse error: {}", e)))
}
