// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use crate::cookie::MemoryCookieJar;
use crate::kv::MemoryStore;
use crate::store::TokenPair;

use super::*;

fn store() -> CredentialStore {
    CredentialStore::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCookieJar::new()),
        Duration::from_secs(60),
    )
}

fn auth(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

#[test]
fn attaches_stored_bearer_for_domain() -> anyhow::Result<()> {
    let store = store();
    store.set(SessionDomain::User, &TokenPair::new("user-acc", "r"));
    store.set(SessionDomain::Admin, &TokenPair::new("admin-acc", "r"));
    let defaults = DefaultCredentials::new();

    let user = decorate(&RequestConfig::new(), SessionDomain::User, &store, &defaults, None)?;
    assert_eq!(auth(&user.headers), Some("Bearer user-acc"));
    assert_eq!(user.token.as_deref(), Some("user-acc"));

    let admin = decorate(&RequestConfig::new(), SessionDomain::Admin, &store, &defaults, None)?;
    assert_eq!(auth(&admin.headers), Some("Bearer admin-acc"));
    Ok(())
}

#[test]
fn explicit_authorization_wins() -> anyhow::Result<()> {
    let store = store();
    store.set(SessionDomain::User, &TokenPair::new("stored", "r"));
    let config = RequestConfig::new().header("authorization", "Bearer explicit");

    let out = decorate(&config, SessionDomain::User, &store, &DefaultCredentials::new(), None)?;
    assert_eq!(auth(&out.headers), Some("Bearer explicit"));
    assert_eq!(out.token, None);
    Ok(())
}

#[test]
fn no_credential_sends_unauthenticated() -> anyhow::Result<()> {
    let out =
        decorate(&RequestConfig::new(), SessionDomain::User, &store(), &DefaultCredentials::new(), None)?;
    assert!(out.headers.get(AUTHORIZATION).is_none());
    assert_eq!(out.token, None);
    Ok(())
}

#[test]
fn default_credential_used_when_store_is_empty() -> anyhow::Result<()> {
    let defaults = DefaultCredentials::new();
    defaults.set(SessionDomain::Admin, "propagated".into());
    let store = store();

    let admin = decorate(&RequestConfig::new(), SessionDomain::Admin, &store, &defaults, None)?;
    assert_eq!(auth(&admin.headers), Some("Bearer propagated"));
    let user = decorate(&RequestConfig::new(), SessionDomain::User, &store, &defaults, None)?;
    assert!(user.headers.get(AUTHORIZATION).is_none());
    Ok(())
}

#[test]
fn override_token_replaces_stored() -> anyhow::Result<()> {
    let store = store();
    store.set(SessionDomain::User, &TokenPair::new("stale", "r"));
    let out = decorate(
        &RequestConfig::new(),
        SessionDomain::User,
        &store,
        &DefaultCredentials::new(),
        Some("fresh"),
    )?;
    assert_eq!(auth(&out.headers), Some("Bearer fresh"));
    assert_eq!(out.token.as_deref(), Some("fresh"));
    Ok(())
}

#[test]
fn override_token_replaces_explicit_header() -> anyhow::Result<()> {
    let config = RequestConfig::new().header("Authorization", "Bearer expired");
    let out = decorate(
        &config,
        SessionDomain::User,
        &store(),
        &DefaultCredentials::new(),
        Some("renewed"),
    )?;
    assert_eq!(out.headers.get_all(AUTHORIZATION).iter().count(), 1);
    assert_eq!(auth(&out.headers), Some("Bearer renewed"));
    Ok(())
}

#[test]
fn loader_opt_in_by_flag_or_header() -> anyhow::Result<()> {
    let store = store();
    let defaults = DefaultCredentials::new();

    let flagged = RequestConfig::new().with_loader();
    assert!(flagged.wants_loader());
    let out = decorate(&flagged, SessionDomain::User, &store, &defaults, None)?;
    assert_eq!(out.headers.get(SHOW_LOADER_HEADER).and_then(|v| v.to_str().ok()), Some("1"));

    let by_header = RequestConfig::new().header("X-Show-Loader", "1");
    assert!(by_header.wants_loader());
    let out = decorate(&by_header, SessionDomain::User, &store, &defaults, None)?;
    assert_eq!(out.headers.get_all(SHOW_LOADER_HEADER).iter().count(), 1);

    assert!(!RequestConfig::new().header("X-Show-Loader", "0").wants_loader());
    Ok(())
}

#[test]
fn invalid_header_is_rejected() {
    let config = RequestConfig::new().header("bad header", "x");
    let result =
        decorate(&config, SessionDomain::User, &store(), &DefaultCredentials::new(), None);
    assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
}
