// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the authenticated API client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the banking API.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "COFFER_BASE_URL")]
    pub base_url: String,

    /// Client-side timeout for every request, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "COFFER_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Path of the token refresh endpoint.
    #[arg(long, default_value = crate::domain::REFRESH_PATH, env = "COFFER_REFRESH_PATH")]
    pub refresh_path: String,

    /// How recent another context's refresh must be for its token to be adopted,
    /// in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "COFFER_RECENCY_WINDOW_MS")]
    pub recency_window_ms: u64,

    /// Upper bound on how long the loading indicator stays up per request,
    /// in milliseconds.
    #[arg(long, default_value_t = 8_000, env = "COFFER_LOADER_TIMEOUT_MS")]
    pub loader_timeout_ms: u64,

    /// Lifetime of the access-token cookie, in seconds.
    #[arg(long, default_value_t = 604_800, env = "COFFER_COOKIE_MAX_AGE_SECS")]
    pub cookie_max_age_secs: u64,

    /// Maximum characters of the `reason` carried to the login page.
    #[arg(long, default_value_t = 120, env = "COFFER_REASON_MAX_LEN")]
    pub reason_max_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8080")
    }
}

impl ClientConfig {
    /// Config with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: 30_000,
            refresh_path: crate::domain::REFRESH_PATH.to_owned(),
            recency_window_ms: 10_000,
            loader_timeout_ms: 8_000,
            cookie_max_age_secs: 604_800,
            reason_max_len: 120,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn recency_window(&self) -> Duration {
        Duration::from_millis(self.recency_window_ms)
    }

    pub fn loader_timeout(&self) -> Duration {
        Duration::from_millis(self.loader_timeout_ms)
    }

    pub fn cookie_max_age(&self) -> Duration {
        Duration::from_secs(self.cookie_max_age_secs)
    }

    /// Join the base URL and an API path.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
