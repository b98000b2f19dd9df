// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand dispatch.

use std::sync::Arc;
use std::time::SystemTime;

use coffer_client::kv::FileStore;
use coffer_client::terminate::MemoryNavigator;
use coffer_client::{
    ApiResponse, AuthClient, ClientError, Method, RequestConfig, SessionDomain, TokenPair,
};
use tracing::info;

use crate::config::{Command, Config};

/// Build a client over the session file and the simulated location.
pub fn build_client(config: &Config) -> anyhow::Result<(AuthClient, MemoryNavigator)> {
    let navigator = MemoryNavigator::new(config.location.clone());
    let client = AuthClient::builder(config.client.clone())
        .kv_store(Arc::new(FileStore::new(&config.store)))
        .navigator(Arc::new(navigator.clone()))
        .build()?;
    Ok((client, navigator))
}

/// Run the parsed command. Returns the process exit code.
pub async fn run(config: Config) -> anyhow::Result<i32> {
    let (client, navigator) = build_client(&config)?;

    match config.command {
        Command::Login { domain, access_token, refresh_token } => {
            let pair = TokenPair { access_token, refresh_token };
            client.login(domain, &pair);
            info!(%domain, store = %config.store.display(), "credentials stored");
            println!("{domain}: signed in");
            Ok(0)
        }

        Command::Logout { domain } => {
            client.logout(domain);
            println!("{domain}: signed out");
            Ok(0)
        }

        Command::Status => {
            for domain in SessionDomain::ALL {
                println!("{}", describe(&client, domain));
            }
            Ok(0)
        }

        Command::Request { method, path, data, query, headers, loader } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid method {method:?}: {e}"))?;
            let body = match data {
                Some(raw) => {
                    let value: serde_json::Value = serde_json::from_str(&raw)
                        .map_err(|e| anyhow::anyhow!("--data is not valid JSON: {e}"))?;
                    Some(serde_json::to_vec(&value)?.into())
                }
                None => None,
            };
            let request = RequestConfig { headers, query, show_loader: loader };
            let result = client.request(method, &path, body, request).await;
            Ok(report(result, &navigator))
        }
    }
}

fn describe(client: &AuthClient, domain: SessionDomain) -> String {
    let store = client.store();
    let Some(pair) = store.get(domain) else {
        return format!("{domain}: signed out");
    };
    let refresh = if pair.refresh_token.is_some() { "yes" } else { "no" };
    let updated = store
        .last_refreshed(domain)
        .and_then(|t| SystemTime::now().duration_since(t).ok())
        .map(|age| format!("{}s ago", age.as_secs()))
        .unwrap_or_else(|| "unknown".to_owned());
    format!("{domain}: signed in (refresh token: {refresh}, updated {updated})")
}

/// Print the outcome of a request and map it to an exit code.
fn report(
    result: Result<ApiResponse, ClientError>,
    navigator: &MemoryNavigator,
) -> i32 {
    match result {
        Ok(resp) => {
            match resp.json::<serde_json::Value>() {
                Ok(value) if !resp.body.is_empty() => {
                    let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| resp.text());
                    println!("{pretty}");
                }
                _ => println!("{}", resp.text()),
            }
            0
        }
        Err(e) => {
            eprintln!("error [{}]: {e}", e.as_str());
            if let ClientError::Status { body, .. } = &e {
                if !body.is_empty() {
                    eprintln!("{body}");
                }
            }
            for target in navigator.history() {
                eprintln!("redirect: {target}");
            }
            match e {
                ClientError::SessionExpired { .. } | ClientError::LoopGuard { .. } => 3,
                ClientError::CrossDomain { .. } => 4,
                _ => 1,
            }
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
