// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-lived access-token cookies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A cookie as written by the credential store: always `path=/`, `secure`,
/// `samesite=strict`, with a bounded `max-age`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age: Duration,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age: Duration) -> Self {
        Self { name: name.into(), value: value.into(), max_age }
    }

    /// A cookie that deletes `name` when written.
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, "", Duration::ZERO)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; path=/; max-age={}; secure; samesite=strict",
            self.name,
            self.value,
            self.max_age.as_secs()
        )
    }
}

/// Where cookies live.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    /// Write a cookie. A zero `max_age` deletes it.
    fn set(&self, cookie: Cookie);
}

/// In-process jar that honours `max-age`. Clones share state.
///
/// A `max-age` too large to add to the current instant never expires.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    inner: Arc<Mutex<HashMap<String, (String, Option<Instant>)>>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let mut jar = self.inner.lock();
        match jar.get(name) {
            Some((value, expires)) if expires.is_none_or(|at| at > Instant::now()) => {
                Some(value.clone())
            }
            Some(_) => {
                jar.remove(name);
                None
            }
            None => None,
        }
    }

    fn set(&self, cookie: Cookie) {
        let mut jar = self.inner.lock();
        if cookie.max_age.is_zero() {
            jar.remove(&cookie.name);
            return;
        }
        let expires = Instant::now().checked_add(cookie.max_age);
        jar.insert(cookie.name, (cookie.value, expires));
    }
}

#[cfg(test)]
#[path = "cookie_tests.rs"]
mod tests;
