//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! reading the signing key from the environment and providing clear
//! error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::{debug, info};

use super::AppConfig;

/// Environment variable holding the hex private key.
pub const PRIVATE_KEY_ENV: &str = "IEXEC_PRIVATE_KEY";

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    chains = config.chains.len(),
    default_chain = %config.default_chain,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty, uniquely named chain definitions
/// - A default chain that exists
/// - Positive polling interval and log range
/// - Bridges pointing at a declared chain
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.chains.is_empty(), "At least one chain must be configured");

  let mut names = HashSet::new();
  for chain in &config.chains {
    anyhow::ensure!(!chain.name.is_empty(), "Chain {} has an empty name", chain.id);
    anyhow::ensure!(names.insert(chain.name.as_str()), "Chain name {} is declared twice", chain.name);
    anyhow::ensure!(!chain.rpc_url.is_empty(), "Chain {} has an empty rpc_url", chain.name);
    anyhow::ensure!(
      chain.poll_interval_ms > 0,
      "Chain {} poll_interval_ms must be positive",
      chain.name
    );
    anyhow::ensure!(
      chain.log_block_range > 0,
      "Chain {} log_block_range must be positive",
      chain.name
    );
    if chain.is_native {
      anyhow::ensure!(
        chain.token.is_none(),
        "Chain {} is native and cannot declare a token",
        chain.name
      );
    }
  }

  anyhow::ensure!(
    names.contains(config.default_chain.as_str()),
    "default_chain {} is not a declared chain",
    config.default_chain
  );

  for chain in &config.chains {
    if let Some(bridge) = &chain.bridge {
      anyhow::ensure!(
        names.contains(bridge.bridged_chain.as_str()) && bridge.bridged_chain != chain.name,
        "Chain {} bridges to unknown chain {}",
        chain.name,
        bridge.bridged_chain
      );
    }
  }

  anyhow::ensure!(
    config.gateway.requests_per_second > 0,
    "gateway requests_per_second must be positive"
  );

  Ok(())
}

/// Signing key from `IEXEC_PRIVATE_KEY` (after `.env` loading), if set.
pub fn load_signer() -> Result<Option<PrivateKeySigner>> {
  match std::env::var(PRIVATE_KEY_ENV) {
    Ok(key) if !key.trim().is_empty() => {
      let signer: PrivateKeySigner = key
        .trim()
        .parse()
        .with_context(|| format!("{PRIVATE_KEY_ENV} is not a valid private key"))?;
      debug!(address = %signer.address(), "Signing key loaded");
      Ok(Some(signer))
    }
    _ => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::chain::{Flavor, GasPricePolicy};

  const SAMPLE: &str = r#"
default_chain = "bellecour"

[[chains]]
name = "mainnet"
id = 1
rpc_url = "https://mainnet.example"
bridge = { contract = "0x4e9e1d3b1d9b4fb4c36bbd1d1e3e9b2a0bd6a7c1", bridged_chain = "bellecour" }

[[chains]]
name = "bellecour"
id = 134
rpc_url = "https://bellecour.example"
is_native = true
gas_price = 0
poll_interval_ms = 1000
"#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_parse_sample_and_build_context() {
    let config = parse_config(SAMPLE).unwrap();
    let bellecour = config.chain(None).unwrap();
    let ctx = bellecour.to_context();
    assert!(ctx.is_native);
    assert_eq!(ctx.flavor, Flavor::Standard);
    assert_eq!(ctx.gas_price, GasPricePolicy::Fixed(0));
    assert_eq!(ctx.confirms, 1);
    assert_eq!(ctx.poll_interval.as_millis(), 1000);

    let mainnet = config.chain(Some("mainnet")).unwrap().to_context();
    assert_eq!(mainnet.bridged_chain.as_deref(), Some("bellecour"));
    assert!(mainnet.contracts.bridge.is_some());
    assert_eq!(mainnet.gas_price, GasPricePolicy::Network);
  }

  #[test]
  fn test_rejects_unknown_default_and_duplicates() {
    let unknown = SAMPLE.replace("default_chain = \"bellecour\"", "default_chain = \"goerli\"");
    assert!(parse_config(&unknown).is_err());

    let duplicate = SAMPLE.replace("name = \"mainnet\"", "name = \"bellecour\"");
    assert!(parse_config(&duplicate).is_err());
  }

  #[test]
  fn test_rejects_dangling_bridge() {
    let dangling = SAMPLE.replace("bridged_chain = \"bellecour\"", "bridged_chain = \"nowhere\"");
    let err = parse_config(&dangling).unwrap_err();
    assert!(err.to_string().contains("unknown chain"));
  }
}
