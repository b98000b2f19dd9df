// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use coffer_client::{ClientConfig, SessionDomain};

/// Authenticated client for the banking API.
#[derive(Debug, Parser)]
#[command(name = "coffer", version, about)]
pub struct Config {
    #[command(flatten)]
    pub client: ClientConfig,

    /// Session file shared by every coffer invocation.
    #[arg(long, env = "COFFER_STORE", default_value = "coffer-session.json")]
    pub store: PathBuf,

    /// UI location the request is issued from; decides the active domain.
    #[arg(long, env = "COFFER_LOCATION", default_value = "/")]
    pub location: String,

    /// Log format (json or text).
    #[arg(long, env = "COFFER_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "COFFER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a token pair for a session domain.
    Login {
        #[arg(value_parser = parse_domain)]
        domain: SessionDomain,
        /// Access token issued by the login endpoint.
        access_token: String,
        /// Refresh token (omit for access-only sessions).
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// Forget a session domain's credentials.
    Logout {
        #[arg(value_parser = parse_domain)]
        domain: SessionDomain,
    },
    /// Issue one authenticated request and print the response body.
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: String,
        /// API path, e.g. /api/v1/accounts.
        path: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
        /// Query parameter as key=value (repeatable).
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
        /// Extra header as name=value (repeatable).
        #[arg(long = "header", value_parser = parse_pair)]
        headers: Vec<(String, String)>,
        /// Tag the request for the loading indicator.
        #[arg(long)]
        loader: bool,
    },
    /// Show what is stored for each session domain.
    Status,
}

fn parse_domain(s: &str) -> Result<SessionDomain, String> {
    match s.to_lowercase().as_str() {
        "user" => Ok(SessionDomain::User),
        "admin" => Ok(SessionDomain::Admin),
        other => Err(format!("invalid session domain: {other} (expected user or admin)")),
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_owned(), v.to_owned())),
        _ => Err(format!("expected key=value, got {s:?}")),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
