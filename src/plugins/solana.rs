//! Solana plugin - wallet balances over JSON-RPC and a watch-list kept in
//! the data directory

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandSpec, Message, Reply};
use crate::infrastructure::config::SolanaConfig;
use crate::infrastructure::http;
use crate::infrastructure::storage;
use crate::plugins::trait_def::Plugin;

pub const WATCHLIST_FILE: &str = "solana_wallets.json";

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const MAX_WATCHED: usize = 20;

const RPC_TIMEOUT: Duration = Duration::from_secs(15);

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Deserialize)]
struct BalanceResult {
    value: u64,
}

pub struct SolanaPlugin {
    rpc_url: String,
    watchlist_path: PathBuf,
    http: Client,
}

impl SolanaPlugin {
    pub fn new(config: &SolanaConfig) -> Result<Self, PluginError> {
        Ok(Self {
            rpc_url: config.rpc_url.clone(),
            watchlist_path: config.data_path.join(WATCHLIST_FILE),
            http: http::client(RPC_TIMEOUT).map_err(|e| PluginError::Upstream(e.to_string()))?,
        })
    }

    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, PluginError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let resp: RpcResponse<T> = self.http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PluginError::Upstream(format!("solana rpc: {}", e)))?
            .json()
            .await
            .map_err(|e| PluginError::Upstream(format!("parse RPC: {}", e)))?;

        if let Some(err) = resp.error {
            return Err(PluginError::Upstream(format!("solana rpc: {}", err.message)));
        }
        resp.result
            .ok_or_else(|| PluginError::Upstream("RPC response missing result".to_string()))
    }

    async fn balance(&self, address: &str) -> Result<u64, PluginError> {
        let result: BalanceResult = self
            .rpc_call("getBalance", serde_json::json!([address, {"commitment": "confirmed"}]))
            .await?;
        Ok(result.value)
    }

    async fn watchlist(&self) -> Result<Vec<String>, PluginError> {
        Ok(storage::read_json(&self.watchlist_path).await?.unwrap_or_default())
    }

    /// Add an address, returning `false` when it was already watched
    async fn watch(&self, address: &str) -> Result<bool, PluginError> {
        let mut wallets = self.watchlist().await?;
        if wallets.iter().any(|w| w == address) {
            return Ok(false);
        }
        if wallets.len() >= MAX_WATCHED {
            return Err(PluginError::InvalidArgs(format!(
                "Watch-list is full ({} wallets)",
                MAX_WATCHED
            )));
        }
        wallets.push(address.to_string());
        storage::write_json(&self.watchlist_path, &wallets).await?;
        Ok(true)
    }

    async fn wallets_report(&self) -> Result<String, PluginError> {
        let wallets = self.watchlist().await?;
        if wallets.is_empty() {
            return Ok("No wallets watched yet. Use /watch <address>.".to_string());
        }

        let mut lines = Vec::with_capacity(wallets.len());
        for wallet in &wallets {
            let line = match self.balance(wallet).await {
                Ok(lamports) => format!("{}: {}", short_address(wallet), format_sol(lamports)),
                Err(e) => {
                    tracing::warn!("Balance lookup failed for {}: {}", wallet, e);
                    format!("{}: unavailable", short_address(wallet))
                }
            };
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// Base58, 32 to 44 characters: the shape of an ed25519 public key
pub fn is_valid_address(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Exact lamport amount in SOL without trailing zeros
pub fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        format!("{} SOL", whole)
    } else {
        let frac = format!("{:09}", frac);
        format!("{}.{} SOL", whole, frac.trim_end_matches('0'))
    }
}

fn short_address(address: &str) -> String {
    if address.len() <= 12 {
        return address.to_string();
    }
    format!("{}…{}", &address[..4], &address[address.len() - 4..])
}

fn address_arg(args: &[String], usage: &str) -> Result<String, PluginError> {
    let address = args
        .first()
        .ok_or_else(|| PluginError::InvalidArgs(format!("Usage: {}", usage)))?;
    if !is_valid_address(address) {
        return Err(PluginError::InvalidArgs(format!("'{}' is not a Solana address", address)));
    }
    Ok(address.clone())
}

#[async_trait]
impl Plugin for SolanaPlugin {
    fn name(&self) -> &str {
        "solana"
    }

    fn description(&self) -> &str {
        "Solana wallet balances and watch-list"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("balance", "Show the SOL balance of a wallet").with_usage("<address>"),
            CommandSpec::new("watch", "Add a wallet to the watch-list").with_usage("<address>"),
            CommandSpec::new("wallets", "Show balances of watched wallets"),
        ]
    }

    async fn handle_command(
        &self,
        command: &str,
        args: &[String],
        _message: &Message,
    ) -> Result<Reply, PluginError> {
        match command.to_ascii_lowercase().as_str() {
            "balance" => {
                let address = address_arg(args, "/balance <address>")?;
                let lamports = self.balance(&address).await?;
                Ok(Reply::text(format!("{}: {}", short_address(&address), format_sol(lamports))))
            }
            "watch" => {
                let address = address_arg(args, "/watch <address>")?;
                let reply = if self.watch(&address).await? {
                    format!("Watching {}", short_address(&address))
                } else {
                    format!("{} is already watched", short_address(&address))
                };
                Ok(Reply::text(reply))
            }
            "wallets" => Ok(Reply::text(self.wallets_report().await?)),
            other => Err(PluginError::InvalidArgs(format!("solana does not handle /{}", other))),
        }
    }
}
