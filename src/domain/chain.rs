//! Chain Context - Immutable Per-Connection Record
//!
//! Every component receives the [`ChainContext`] explicitly; there is no
//! process-wide "current chain". It carries the chain id, the token mode
//! (native vs ERC20), the flavor and the resolved contract addresses.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

use super::errors::{SdkError, SdkResult};

/// Hub of the standard (open token) marketplace.
pub const STANDARD_HUB: Address = address!("3eca1B216A7DF1C7689aEb259fFB83ADFB894E7f");
/// Hub of the enterprise (KYC token) marketplace.
pub const ENTERPRISE_HUB: Address = address!("0bf375A6238359CE14987C2285B8B099eE8e8709");

/// Operating mode of the marketplace on a given chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Standard,
    /// Every token holder must pass the `isKYC` whitelist.
    Enterprise,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Where transaction gas prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPricePolicy {
    /// Ask the node (`eth_gasPrice`).
    Network,
    /// Fixed price in wei, typical of sidechains with free gas.
    Fixed(u128),
}

/// Well-known contracts the client may need to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractName {
    Hub,
    Token,
    Rlc,
    Bridge,
    EnsRegistry,
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hub => "hub",
            Self::Token => "token",
            Self::Rlc => "rlc",
            Self::Bridge => "bridge",
            Self::EnsRegistry => "ens registry",
        };
        f.write_str(name)
    }
}

/// Addresses configured (or defaulted) for one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAddresses {
    pub hub: Option<Address>,
    /// Marketplace token; read from the hub when absent.
    pub token: Option<Address>,
    /// Plain RLC token wrapped into eRLC on enterprise chains.
    pub rlc: Option<Address>,
    pub bridge: Option<Address>,
    pub ens_registry: Option<Address>,
}

/// Registered marketplace resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    App,
    Dataset,
    Workerpool,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => write!(f, "app"),
            Self::Dataset => write!(f, "dataset"),
            Self::Workerpool => write!(f, "workerpool"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "app" => Ok(Self::App),
            "dataset" => Ok(Self::Dataset),
            "workerpool" => Ok(Self::Workerpool),
            other => Err(SdkError::validation(format!("unknown resource kind {other}"))),
        }
    }
}

/// Per-transaction overrides from the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Gas price in wei, wins over the chain policy.
    pub gas_price: Option<u128>,
    pub gas_limit: Option<u64>,
}

/// Immutable description of one chain connection.
#[derive(Debug, Clone)]
pub struct ChainContext {
    pub name: String,
    pub chain_id: u64,
    /// The native coin is the marketplace token (sidechain mode).
    pub is_native: bool,
    pub flavor: Flavor,
    pub contracts: ContractAddresses,
    /// Blocks to wait after inclusion before a transaction is final.
    pub confirms: u64,
    pub gas_price: GasPricePolicy,
    pub poll_interval: Duration,
    /// Widest block range requested per `eth_getLogs`.
    pub log_block_range: u64,
    /// Name of the chain on the other side of the bridge, if any.
    pub bridged_chain: Option<String>,
    pub gateway_url: Option<String>,
}

impl ChainContext {
    /// Minimal context with defaults, mostly useful for tests and tooling.
    pub fn new(name: impl Into<String>, chain_id: u64, is_native: bool, flavor: Flavor) -> Self {
        Self {
            name: name.into(),
            chain_id,
            is_native,
            flavor,
            contracts: ContractAddresses::default(),
            confirms: 1,
            gas_price: GasPricePolicy::Network,
            poll_interval: Duration::from_secs(5),
            log_block_range: 10_000,
            bridged_chain: None,
            gateway_url: None,
        }
    }

    /// Short unit label for amounts held by wallets on this chain.
    pub const fn token_unit(&self) -> &'static str {
        if self.is_native { "wei" } else { "nRLC" }
    }

    /// Look up a contract address for this chain.
    ///
    /// The hub falls back to the well-known deployment for the chain
    /// id and flavor. With `strict` a miss is a `ConfigurationError`.
    pub fn resolve_address(&self, name: ContractName, strict: bool) -> SdkResult<Option<Address>> {
        let found = match name {
            ContractName::Hub => self
                .contracts
                .hub
                .or_else(|| well_known_hub(self.chain_id, self.flavor)),
            ContractName::Token => self.contracts.token,
            ContractName::Rlc => self.contracts.rlc,
            ContractName::Bridge => self.contracts.bridge,
            ContractName::EnsRegistry => self.contracts.ens_registry,
        };
        match found {
            Some(address) => Ok(Some(address)),
            None if strict => Err(SdkError::configuration(format!(
                "no {name} address configured for chain {} ({})",
                self.name, self.chain_id
            ))),
            None => Ok(None),
        }
    }

    /// Same as [`Self::resolve_address`] with `strict = true`.
    pub fn require_address(&self, name: ContractName) -> SdkResult<Address> {
        self.resolve_address(name, true)?.ok_or_else(|| {
            SdkError::configuration(format!("no {name} address configured for chain {}", self.name))
        })
    }
}

/// Public hub deployments keyed by chain id and flavor.
pub fn well_known_hub(chain_id: u64, flavor: Flavor) -> Option<Address> {
    match (chain_id, flavor) {
        (1 | 134, Flavor::Standard) => Some(STANDARD_HUB),
        (1, Flavor::Enterprise) => Some(ENTERPRISE_HUB),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_falls_back_to_well_known() {
        let ctx = ChainContext::new("bellecour", 134, true, Flavor::Standard);
        assert_eq!(ctx.resolve_address(ContractName::Hub, true).unwrap(), Some(STANDARD_HUB));

        let enterprise = ChainContext::new("mainnet", 1, false, Flavor::Enterprise);
        assert_eq!(enterprise.require_address(ContractName::Hub).unwrap(), ENTERPRISE_HUB);
    }

    #[test]
    fn test_strict_miss_is_configuration_error() {
        let ctx = ChainContext::new("dev", 65535, false, Flavor::Standard);
        assert_eq!(ctx.resolve_address(ContractName::Bridge, false).unwrap(), None);
        let err = ctx.resolve_address(ContractName::Bridge, true).unwrap_err();
        assert_eq!(err.name(), "ConfigurationError");
        assert!(ctx.require_address(ContractName::Hub).is_err());
    }

    #[test]
    fn test_configured_address_wins() {
        let mut ctx = ChainContext::new("mainnet", 1, false, Flavor::Standard);
        let custom = Address::repeat_byte(0x11);
        ctx.contracts.hub = Some(custom);
        assert_eq!(ctx.require_address(ContractName::Hub).unwrap(), custom);
    }

    #[test]
    fn test_resource_kind_parse() {
        assert_eq!("Workerpool".parse::<ResourceKind>().unwrap(), ResourceKind::Workerpool);
        assert!("task".parse::<ResourceKind>().is_err());
    }
}
