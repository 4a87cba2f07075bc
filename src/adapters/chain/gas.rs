//! Gas Oracle - Transaction Gas Price Selection
//!
//! Resolves the gas price of every transaction the client sends:
//! a per-call override wins, then the chain's fixed price (sidechains
//! with free gas), then the node's `eth_gasPrice`.

use alloy::providers::{DynProvider, Provider};
use tracing::{debug, instrument};

use crate::domain::chain::{GasPricePolicy, TxOptions};
use crate::domain::errors::{SdkError, SdkResult};

/// Price to use without asking the node, if any.
pub fn static_price(policy: GasPricePolicy, opts: TxOptions) -> Option<u128> {
    match (opts.gas_price, policy) {
        (Some(price), _) => Some(price),
        (None, GasPricePolicy::Fixed(price)) => Some(price),
        (None, GasPricePolicy::Network) => None,
    }
}

/// Gas price oracle for one chain connection.
pub struct GasOracle {
    provider: DynProvider,
    policy: GasPricePolicy,
}

impl GasOracle {
    pub fn new(provider: DynProvider, policy: GasPricePolicy) -> Self {
        Self { provider, policy }
    }

    /// Gas price in wei for a transaction sent with `opts`.
    #[instrument(skip(self))]
    pub async fn price(&self, opts: TxOptions) -> SdkResult<u128> {
        if let Some(price) = static_price(self.policy, opts) {
            return Ok(price);
        }

        let price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| SdkError::rpc("eth_gasPrice", e))?;

        debug!(gas_gwei = price / 1_000_000_000, "Node gas price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_beats_fixed() {
        let opts = TxOptions { gas_price: Some(7), gas_limit: None };
        assert_eq!(static_price(GasPricePolicy::Fixed(0), opts), Some(7));
        assert_eq!(static_price(GasPricePolicy::Network, opts), Some(7));
    }

    #[test]
    fn test_fixed_then_network() {
        let opts = TxOptions::default();
        assert_eq!(static_price(GasPricePolicy::Fixed(0), opts), Some(0));
        assert_eq!(static_price(GasPricePolicy::Network, opts), None);
    }
}
