// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session lifecycle and the credential store.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, GoTrueClient, IdentityMetadata};
pub use session::{LoginOutcome, SessionManager, ACCESS_COOKIE, REFRESH_COOKIE};
