// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coffer: authenticated HTTP client for the banking web app.
//!
//! Attaches the right session's bearer token to every call, renews expired
//! tokens once per session domain no matter how many requests fail at the
//! same time, adopts tokens another context already renewed, and tears the
//! session down (without redirect loops) when renewal is impossible.

pub mod classify;
pub mod client;
pub mod config;
pub mod cookie;
pub mod decorate;
pub mod domain;
pub mod error;
pub mod kv;
pub mod loader;
pub mod refresh;
pub mod store;
pub mod terminate;

use std::sync::Once;

pub use crate::client::{ApiResponse, AuthClient, AuthClientBuilder};
pub use crate::config::ClientConfig;
pub use crate::decorate::RequestConfig;
pub use crate::domain::SessionDomain;
pub use crate::error::{ClientError, RefreshError};
pub use crate::store::{CredentialStore, TokenPair};
pub use reqwest::Method;

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
