//! Configuration Module - TOML-based Chain Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides via `.env` files.
//! Every chain the client can talk to is declared here; only the public
//! hub deployments have built-in defaults.

pub mod loader;

use std::time::Duration;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::adapters::api::GatewayClientConfig;
use crate::domain::chain::{ChainContext, ContractAddresses, Flavor, GasPricePolicy};

/// Top-level client configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any chain is contacted.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins.
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Chain used when `--chain` is not given.
  pub default_chain: String,
  /// Order-book gateway client settings.
  #[serde(default)]
  pub gateway: GatewayConfig,
  /// Declared chains.
  pub chains: Vec<ChainConfig>,
}

impl AppConfig {
  /// Chain named `name`, or the default chain.
  pub fn chain(&self, name: Option<&str>) -> Option<&ChainConfig> {
    let name = name.unwrap_or(&self.default_chain);
    self.chains.iter().find(|chain| chain.name == name)
  }
}

/// One chain connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// Name used on the command line (`--chain`).
  pub name: String,
  /// EVM chain id, checked against the node on connect.
  pub id: u64,
  /// JSON-RPC endpoint.
  pub rpc_url: String,
  /// The native coin is the marketplace token.
  #[serde(default)]
  pub is_native: bool,
  #[serde(default)]
  pub flavor: Flavor,
  /// Hub address; the public deployment is used when absent.
  pub hub: Option<Address>,
  /// Marketplace token; read from the hub when absent.
  pub token: Option<Address>,
  /// RLC token wrapped by the enterprise eRLC.
  pub rlc: Option<Address>,
  pub bridge: Option<BridgeConfig>,
  pub ens_registry: Option<Address>,
  /// Blocks to wait after inclusion.
  #[serde(default = "default_confirms")]
  pub confirms: u64,
  /// Fixed gas price in wei; absent means ask the node.
  pub gas_price: Option<u128>,
  /// Receipt and event polling interval (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
  /// Widest block range per `eth_getLogs`.
  #[serde(default = "default_log_block_range")]
  pub log_block_range: u64,
  /// Order-book gateway serving this chain.
  pub gateway_url: Option<String>,
}

/// Bridge contract and the chain it pairs with.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
  pub contract: Address,
  /// Name of the chain on the other side.
  pub bridged_chain: String,
}

/// Gateway client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Maximum concurrent requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Sustained requests per second.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Retries on 429 and 5xx.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self {
      timeout_seconds: default_timeout(),
      max_concurrent: default_max_concurrent(),
      requests_per_second: default_requests_per_second(),
      max_retries: default_max_retries(),
    }
  }
}

impl GatewayConfig {
  /// Client settings for the gateway at `base_url`.
  pub fn client_config(&self, base_url: &str) -> GatewayClientConfig {
    GatewayClientConfig {
      base_url: base_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_secs(self.timeout_seconds),
      max_concurrent: self.max_concurrent,
      requests_per_second: self.requests_per_second,
      max_retries: self.max_retries,
      ..GatewayClientConfig::default()
    }
  }
}

impl ChainConfig {
  /// Immutable context handed to every component of this chain.
  pub fn to_context(&self) -> ChainContext {
    let mut ctx = ChainContext::new(self.name.clone(), self.id, self.is_native, self.flavor);
    ctx.contracts = ContractAddresses {
      hub: self.hub,
      token: self.token,
      rlc: self.rlc,
      bridge: self.bridge.as_ref().map(|bridge| bridge.contract),
      ens_registry: self.ens_registry,
    };
    ctx.confirms = self.confirms;
    ctx.gas_price = self.gas_price.map_or(GasPricePolicy::Network, GasPricePolicy::Fixed);
    ctx.poll_interval = Duration::from_millis(self.poll_interval_ms);
    ctx.log_block_range = self.log_block_range;
    ctx.bridged_chain = self.bridge.as_ref().map(|bridge| bridge.bridged_chain.clone());
    ctx.gateway_url = self.gateway_url.clone();
    ctx
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_confirms() -> u64 {
  1
}

fn default_poll_interval() -> u64 {
  5_000
}

fn default_log_block_range() -> u64 {
  10_000
}

fn default_timeout() -> u64 {
  30
}

fn default_max_concurrent() -> usize {
  4
}

fn default_requests_per_second() -> u32 {
  5
}

fn default_max_retries() -> u32 {
  3
}
