// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const FRESH: Attempt = Attempt { refreshed: false, adopted: false };
const REFRESHED: Attempt = Attempt { refreshed: true, adopted: false };
const ADOPTED: Attempt = Attempt { refreshed: false, adopted: true };
const BOTH: Attempt = Attempt { refreshed: true, adopted: true };

fn outcome<'a>(status: Option<u16>, path: &'a str, ui: &str, attempt: Attempt) -> Outcome<'a> {
    Outcome {
        status,
        path,
        refresh_path: crate::domain::REFRESH_PATH,
        domain: SessionDomain::resolve(path),
        ui_domain: SessionDomain::resolve(ui),
        attempt,
        fresher_token: None,
    }
}

#[yare::parameterized(
    no_response = { None },
    server_error = { Some(500) },
    bad_gateway = { Some(502) },
    not_found = { Some(404) },
    bad_request = { Some(400) },
    conflict = { Some(409) },
)]
fn non_auth_failures_pass_through(status: Option<u16>) {
    let o = outcome(status, "/api/v1/accounts", "/dashboard", FRESH);
    assert_eq!(classify(&o), Decision::PassThrough);
}

#[yare::parameterized(
    unauthorized = { 401 },
    forbidden = { 403 },
)]
fn first_auth_failure_refreshes(status: u16) {
    let o = outcome(Some(status), "/api/v1/accounts", "/dashboard", FRESH);
    assert_eq!(classify(&o), Decision::Refresh);
}

#[test]
fn second_failure_after_refresh_terminates() {
    let o = outcome(Some(401), "/api/v1/accounts", "/dashboard", REFRESHED);
    assert_eq!(classify(&o), Decision::Terminate);
    let o = outcome(Some(401), "/api/v1/accounts", "/dashboard", BOTH);
    assert_eq!(classify(&o), Decision::Terminate);
}

#[yare::parameterized(
    admin_from_user_page = { "/admin/users", "/dashboard" },
    user_from_admin_page = { "/api/v1/accounts", "/admin/users" },
)]
fn cross_domain_failures_are_rejected(path: &str, ui: &str) {
    let o = outcome(Some(401), path, ui, FRESH);
    assert_eq!(classify(&o), Decision::Reject(RejectReason::CrossDomain));
}

#[yare::parameterized(
    user_login = { "/api/v1/auth/login", "/auth/login" },
    user_login_route = { "/auth/login", "/auth/login" },
    user_refresh = { "/api/v1/auth/refresh", "/dashboard" },
    admin_login = { "/admin/auth/login", "/admin/login" },
)]
fn auth_endpoint_failures_never_refresh(path: &str, ui: &str) {
    let o = outcome(Some(401), path, ui, FRESH);
    assert_eq!(classify(&o), Decision::Terminate);
}

#[test]
fn fresher_token_is_adopted_before_refreshing() {
    let mut o = outcome(Some(401), "/api/v1/accounts", "/dashboard", FRESH);
    o.fresher_token = Some("from-other-tab".into());
    assert_eq!(classify(&o), Decision::Adopt("from-other-tab".into()));
}

#[test]
fn adoption_happens_at_most_once() {
    let mut o = outcome(Some(401), "/api/v1/accounts", "/dashboard", ADOPTED);
    o.fresher_token = Some("from-other-tab".into());
    assert_eq!(classify(&o), Decision::Refresh);

    o.attempt = BOTH;
    assert_eq!(classify(&o), Decision::Terminate);
}

#[test]
fn refresh_failure_adopts_when_possible() {
    let mut o = outcome(Some(401), "/api/v1/accounts", "/dashboard", REFRESHED);
    o.fresher_token = Some("from-other-tab".into());
    let rejected = RefreshError::Rejected { status: 401 };
    assert_eq!(after_refresh_failure(&o, &rejected), Decision::Adopt("from-other-tab".into()));

    o.attempt = BOTH;
    assert_eq!(after_refresh_failure(&o, &rejected), Decision::Terminate);
}

#[yare::parameterized(
    unavailable = { RefreshError::Unavailable, Decision::Terminate },
    rejected = { RefreshError::Rejected { status: 403 }, Decision::Terminate },
    transport = { RefreshError::Transport("connection reset".into()), Decision::PassThrough },
)]
fn refresh_failure_without_fresher_token(error: RefreshError, expected: Decision) {
    let o = outcome(Some(401), "/api/v1/accounts", "/dashboard", REFRESHED);
    assert_eq!(after_refresh_failure(&o, &error), expected);
}

#[test]
fn attempt_counts_retries() {
    assert_eq!(FRESH.retries(), 0);
    assert_eq!(REFRESHED.retries(), 1);
    assert_eq!(BOTH.retries(), 2);
}
