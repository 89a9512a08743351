// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: signup, login, refresh, logout, current session.
//!
//! Sessions are not stored server-side. The access/refresh token pair is
//! handed to the client as two `HttpOnly` cookies, which are always set
//! and cleared together.

use crate::config::CookiePolicy;
use crate::db::{bounded, ProfileStore, StoreResult};
use crate::error::{AppError, Result, StoreError};
use crate::models::{Identity, NewProfile, Session, UserStats, UserView};
use crate::services::credentials::{CredentialStore, IdentityMetadata};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "auth_token";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub user: UserView,
}

/// Translates session requests into credential store calls and maps the
/// resulting tokens onto cookies.
#[derive(Clone)]
pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    profiles: Arc<dyn ProfileStore>,
    cookies: CookiePolicy,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileStore>,
        cookies: CookiePolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            profiles,
            cookies,
            timeout,
        }
    }

    async fn call<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        bounded(self.timeout, call).await
    }

    /// Create an identity and its profile, then log the new user in.
    ///
    /// If the profile insert or the first login fails, the identity is
    /// deleted again so no orphaned account is left behind.
    pub async fn signup(
        &self,
        jar: CookieJar,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(CookieJar, Identity)> {
        let metadata = IdentityMetadata {
            full_name: full_name.to_string(),
        };

        let identity = self
            .call(self.credentials.create_identity(email, password, &metadata))
            .await
            .map_err(|err| {
                if err.is(StoreError::DUPLICATE_IDENTITY) {
                    AppError::DuplicateIdentity
                } else {
                    signup_failed(err)
                }
            })?;

        let profile = NewProfile::for_signup(&identity, full_name);
        if let Err(err) = self.call(self.profiles.insert_profile(&profile)).await {
            tracing::error!(
                user_id = %identity.id,
                code = %err.code,
                error = %err.message,
                "Profile creation failed, removing identity"
            );
            self.remove_identity(&identity).await;
            return Err(AppError::ProfileCreationFailed);
        }

        if let Err(err) = self
            .call(self.profiles.insert_user_stats(&UserStats::empty(&identity.id)))
            .await
        {
            tracing::warn!(user_id = %identity.id, error = %err, "Failed to create user stats");
        }

        let session = match self.call(self.credentials.authenticate(email, password)).await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(
                    user_id = %identity.id,
                    code = %err.code,
                    error = %err.message,
                    "Login after signup failed, removing identity"
                );
                self.remove_identity(&identity).await;
                return Err(AppError::SignupFailed);
            }
        };

        tracing::info!(user_id = %identity.id, "User signed up");

        Ok((self.set_cookies(jar, &session), identity))
    }

    /// Undo a half-finished signup. Rows keyed by the identity go with it
    /// (the store cascades the delete).
    async fn remove_identity(&self, identity: &Identity) {
        if let Err(err) = self.call(self.credentials.delete_identity(&identity.id)).await {
            tracing::error!(
                user_id = %identity.id,
                error = %err,
                "Failed to remove identity after incomplete signup"
            );
        }
    }

    /// Authenticate and attach the session cookies.
    pub async fn login(
        &self,
        jar: CookieJar,
        email: &str,
        password: &str,
    ) -> Result<(CookieJar, LoginOutcome)> {
        let session = self
            .call(self.credentials.authenticate(email, password))
            .await
            .map_err(|err| {
                if err.is(StoreError::INVALID_CREDENTIALS) {
                    AppError::InvalidCredentials
                } else {
                    AppError::Store(err)
                }
            })?;

        // A missing profile is tolerated.
        let profile = match self.call(self.profiles.get_profile(&session.identity.id)).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(
                    user_id = %session.identity.id,
                    error = %err,
                    "Profile lookup failed during login"
                );
                None
            }
        };

        tracing::info!(user_id = %session.identity.id, "User logged in");

        let user = UserView::merge(&session.identity, profile);
        let jar = self.set_cookies(jar, &session);
        Ok((jar, LoginOutcome { session, user }))
    }

    /// Clear the session cookies. Never fails.
    pub async fn logout(&self, jar: CookieJar) -> CookieJar {
        if let Some(token) = cookie_value(&jar, ACCESS_COOKIE) {
            if let Err(err) = self.call(self.credentials.invalidate(&token)).await {
                tracing::warn!(error = %err, "Failed to invalidate session, clearing cookies anyway");
            }
        }

        self.clear_cookies(jar)
    }

    /// Exchange the refresh cookie for a new session and rotate both cookies.
    pub async fn refresh(&self, jar: CookieJar) -> Result<(CookieJar, Session)> {
        let refresh_token = cookie_value(&jar, REFRESH_COOKIE).ok_or(AppError::NoRefreshToken)?;

        let session = self
            .call(self.credentials.refresh(&refresh_token))
            .await
            .map_err(|err| {
                if err.is(StoreError::INVALID_GRANT) {
                    AppError::RefreshRejected
                } else {
                    AppError::Store(err)
                }
            })?;

        tracing::debug!(user_id = %session.identity.id, "Session refreshed");

        Ok((self.set_cookies(jar, &session), session))
    }

    /// Identity behind the access cookie, merged with its profile.
    pub async fn current_session(&self, jar: &CookieJar) -> Result<UserView> {
        let token = cookie_value(jar, ACCESS_COOKIE).ok_or(AppError::NotAuthenticated)?;
        let identity = self.resolve(&token).await?;

        let profile = self
            .call(self.profiles.get_profile(&identity.id))
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(user_id = %identity.id, error = %err, "Profile lookup failed");
                None
            });

        Ok(UserView::merge(&identity, profile))
    }

    /// Resolve an access token. Every failure collapses to
    /// [`AppError::NotAuthenticated`]; the cause is only logged.
    pub async fn resolve(&self, access_token: &str) -> Result<Identity> {
        match self.call(self.credentials.resolve(access_token)).await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => Err(AppError::NotAuthenticated),
            Err(err) => {
                tracing::warn!(code = %err.code, error = %err.message, "Token resolution failed");
                Err(AppError::NotAuthenticated)
            }
        }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.cookies.secure)
            .same_site(self.cookies.same_site)
            .max_age(self.cookies.max_age)
            .path("/")
            .build()
    }

    /// Add both session cookies.
    pub fn set_cookies(&self, jar: CookieJar, session: &Session) -> CookieJar {
        jar.add(self.cookie(ACCESS_COOKIE, session.access_token.clone()))
            .add(self.cookie(REFRESH_COOKIE, session.refresh_token.clone()))
    }

    /// Expire both session cookies, with the attributes they were set with.
    /// Removal cookies are sent even if the request carried no session.
    pub fn clear_cookies(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal_cookie(ACCESS_COOKIE))
            .add(self.removal_cookie(REFRESH_COOKIE))
    }

    fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.cookie(name, String::new());
        cookie.make_removal();
        cookie
    }
}

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn signup_failed(err: StoreError) -> AppError {
    tracing::warn!(code = %err.code, error = %err.message, "Signup failed");
    AppError::SignupFailed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::MemoryBackend;
    use async_trait::async_trait;

    fn manager(backend: Arc<MemoryBackend>) -> SessionManager {
        SessionManager::new(
            backend.clone(),
            backend,
            Config::test_default().cookie_policy(),
            Duration::from_secs(1),
        )
    }

    fn jar_with(cookies: &[(&'static str, &str)]) -> CookieJar {
        cookies.iter().fold(CookieJar::new(), |jar, (name, value)| {
            jar.add(Cookie::new(*name, value.to_string()))
        })
    }

    #[tokio::test]
    async fn test_signup_sets_both_cookies() {
        let backend = Arc::new(MemoryBackend::new());
        let sessions = manager(backend.clone());

        let (jar, identity) = sessions
            .signup(CookieJar::new(), "a@x.com", "pw123456", "Ann")
            .await
            .unwrap();

        assert_eq!(identity.email, "a@x.com");
        assert!(jar.get(ACCESS_COOKIE).is_some());
        assert!(jar.get(REFRESH_COOKIE).is_some());

        let profile = backend.get_profile(&identity.id).await.unwrap().unwrap();
        assert_eq!(profile.skill_level.as_deref(), Some("beginner"));
        assert_eq!(profile.username.as_deref(), Some("a"));
        assert!(backend.get_user_stats(&identity.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_signup_removes_identity_when_profile_fails() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_profile_inserts(true);
        let sessions = manager(backend.clone());

        let err = sessions
            .signup(CookieJar::new(), "a@x.com", "pw123456", "Ann")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProfileCreationFailed));
        assert_eq!(backend.identity_count(), 0);
    }

    /// Memory backend whose password grant is down.
    struct LoginOutage(Arc<MemoryBackend>);

    #[async_trait]
    impl CredentialStore for LoginOutage {
        async fn create_identity(
            &self,
            email: &str,
            password: &str,
            metadata: &IdentityMetadata,
        ) -> StoreResult<Identity> {
            self.0.create_identity(email, password, metadata).await
        }

        async fn delete_identity(&self, id: &str) -> StoreResult<()> {
            self.0.delete_identity(id).await
        }

        async fn authenticate(&self, _: &str, _: &str) -> StoreResult<Session> {
            Err(StoreError::new("http_503", "auth service unavailable"))
        }

        async fn resolve(&self, access_token: &str) -> StoreResult<Option<Identity>> {
            self.0.resolve(access_token).await
        }

        async fn refresh(&self, refresh_token: &str) -> StoreResult<Session> {
            self.0.refresh(refresh_token).await
        }

        async fn invalidate(&self, access_token: &str) -> StoreResult<()> {
            self.0.invalidate(access_token).await
        }
    }

    #[tokio::test]
    async fn test_signup_removes_identity_when_first_login_fails() {
        let backend = Arc::new(MemoryBackend::new());
        let failing = SessionManager::new(
            Arc::new(LoginOutage(backend.clone())),
            backend.clone(),
            Config::test_default().cookie_policy(),
            Duration::from_secs(1),
        );

        let err = failing
            .signup(CookieJar::new(), "a@x.com", "pw123456", "Ann")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SignupFailed));
        assert_eq!(err.to_string(), "Signup failed");
        assert_eq!(backend.identity_count(), 0);
        assert!(!backend.has_identity("a@x.com"));

        // Once the outage is over the same email can sign up.
        let (jar, identity) = manager(backend.clone())
            .signup(CookieJar::new(), "a@x.com", "pw123456", "Ann")
            .await
            .unwrap();
        assert!(jar.get(ACCESS_COOKIE).is_some());
        assert_eq!(backend.identity_count(), 1);
        assert!(backend.get_profile(&identity.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_tolerates_missing_profile() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .create_identity(
                "a@x.com",
                "pw123456",
                &IdentityMetadata {
                    full_name: "Ann".to_string(),
                },
            )
            .await
            .unwrap();
        let sessions = manager(backend);

        let (jar, outcome) = sessions
            .login(CookieJar::new(), "a@x.com", "pw123456")
            .await
            .unwrap();

        assert_eq!(outcome.user.email, "a@x.com");
        assert_eq!(outcome.user.full_name, None);
        assert_eq!(
            jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()),
            Some(outcome.session.access_token)
        );
    }

    #[tokio::test]
    async fn test_refresh_requires_cookie() {
        let sessions = manager(Arc::new(MemoryBackend::new()));

        let err = sessions.refresh(CookieJar::new()).await.unwrap_err();
        assert!(matches!(err, AppError::NoRefreshToken));

        let err = sessions
            .refresh(jar_with(&[(REFRESH_COOKIE, "")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_token() {
        let sessions = manager(Arc::new(MemoryBackend::new()));

        let err = sessions
            .refresh(jar_with(&[(REFRESH_COOKIE, "rt-unknown")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RefreshRejected));
    }

    #[tokio::test]
    async fn test_current_session_requires_cookie() {
        let sessions = manager(Arc::new(MemoryBackend::new()));

        let err = sessions.current_session(&CookieJar::new()).await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));

        let err = sessions
            .current_session(&jar_with(&[(ACCESS_COOKIE, "at-bogus")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_logout_without_session_clears_cookies() {
        let sessions = manager(Arc::new(MemoryBackend::new()));

        let jar = sessions.logout(CookieJar::new()).await;
        let jar = sessions.logout(jar).await;

        for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
            let cookie = jar.get(name).expect("removal cookie");
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        }
    }

    /// Credential store whose calls never complete.
    struct StalledCredentials;

    #[async_trait]
    impl CredentialStore for StalledCredentials {
        async fn create_identity(
            &self,
            _: &str,
            _: &str,
            _: &IdentityMetadata,
        ) -> StoreResult<Identity> {
            std::future::pending().await
        }

        async fn delete_identity(&self, _: &str) -> StoreResult<()> {
            std::future::pending().await
        }

        async fn authenticate(&self, _: &str, _: &str) -> StoreResult<Session> {
            std::future::pending().await
        }

        async fn resolve(&self, _: &str) -> StoreResult<Option<Identity>> {
            std::future::pending().await
        }

        async fn refresh(&self, _: &str) -> StoreResult<Session> {
            std::future::pending().await
        }

        async fn invalidate(&self, _: &str) -> StoreResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_store_is_bounded() {
        let sessions = SessionManager::new(
            Arc::new(StalledCredentials),
            Arc::new(MemoryBackend::new()),
            Config::test_default().cookie_policy(),
            Duration::from_millis(50),
        );

        let err = sessions
            .login(CookieJar::new(), "a@x.com", "pw123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(ref e) if e.is(StoreError::TIMEOUT)));

        // Logout still succeeds when invalidation hangs.
        let jar = sessions
            .logout(jar_with(&[(ACCESS_COOKIE, "at-1"), (REFRESH_COOKIE, "rt-1")]))
            .await;
        assert_eq!(cookie_value(&jar, ACCESS_COOKIE), None);
        assert_eq!(cookie_value(&jar, REFRESH_COOKIE), None);
    }
}
