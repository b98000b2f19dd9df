// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session domains: the ordinary user session and the admin session.
//!
//! Each domain owns its own token pair, storage keys, cookie and login
//! route. A request's domain is decided by its path prefix alone.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Path prefix that marks a request (or UI location) as admin-scoped.
const ADMIN_PREFIX: &str = "/admin";

/// Refresh endpoint shared by both domains.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Persisted composite session object (user domain only).
pub const COMPOSITE_SESSION_KEY: &str = "auth-storage";

/// An isolated credential scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionDomain {
    User,
    Admin,
}

impl SessionDomain {
    /// Classify a request path or UI location.
    ///
    /// Query strings, fragments and scheme/host are ignored: only the path
    /// decides. `/admin` and anything under `/admin/` is admin; everything
    /// else (including `/administrator`) is user.
    pub fn resolve(path: &str) -> Self {
        let path = path_only(path);
        match path.strip_prefix(ADMIN_PREFIX) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// The other domain.
    pub fn other(&self) -> Self {
        match self {
            Self::User => Self::Admin,
            Self::Admin => Self::User,
        }
    }

    fn key_prefix(&self) -> &'static str {
        match self {
            Self::User => "",
            Self::Admin => "admin_",
        }
    }

    /// Storage key for `name` in this domain (e.g. `admin_access_token`).
    pub fn storage_key(&self, name: &str) -> String {
        format!("{}{name}", self.key_prefix())
    }

    pub fn access_token_key(&self) -> String {
        self.storage_key("access_token")
    }

    pub fn refresh_token_key(&self) -> String {
        self.storage_key("refresh_token")
    }

    pub fn updated_at_key(&self) -> String {
        self.storage_key("access_token_updated_at")
    }

    /// Cookie carrying this domain's access token.
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Self::User => "accessToken",
            Self::Admin => "admin_token",
        }
    }

    /// UI route of this domain's login page.
    pub fn login_route(&self) -> &'static str {
        match self {
            Self::User => "/auth/login",
            Self::Admin => "/admin/login",
        }
    }

    /// Whether the UI location is one of this domain's authentication pages.
    pub fn is_auth_page(&self, location: &str) -> bool {
        let path = path_only(location);
        match self {
            Self::User => path == "/auth" || path.starts_with("/auth/"),
            Self::Admin => path == "/admin/login" || path.starts_with("/admin/login/"),
        }
    }

    /// Whether a request path targets this domain's authentication endpoints:
    /// anything ending in its login suffix or `/auth/refresh`, or the
    /// configured `refresh_path`.
    pub fn is_auth_endpoint(&self, path: &str, refresh_path: &str) -> bool {
        let path = path_only(path);
        let login = match self {
            Self::User => "/auth/login",
            Self::Admin => "/admin/auth/login",
        };
        path.ends_with(login)
            || path.ends_with("/auth/refresh")
            || path == path_only(refresh_path)
    }

    pub const ALL: [SessionDomain; 2] = [Self::User, Self::Admin];
}

impl fmt::Display for SessionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip scheme/host, query and fragment, leaving the path.
pub(crate) fn path_only(target: &str) -> &str {
    let scheme_end = target.find("://").filter(|&idx| !target[..idx].contains(['/', '?', '#']));
    let rest = match scheme_end {
        Some(idx) => {
            let after = &target[idx + 3..];
            match after.find('/') {
                Some(slash) => &after[slash..],
                None => "/",
            }
        }
        None => target,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod tests;
