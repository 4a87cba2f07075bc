//! Contract Validator - Deployed Code Check
//!
//! Verifies that every contract address resolved for a chain points to
//! deployed code. A typo in the configuration otherwise shows up as
//! calls returning empty data much later.

use alloy::primitives::Address;
use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::chain::{ChainContext, ContractName};
use crate::domain::errors::{SdkError, SdkResult};
use crate::ports::chain_client::ChainClient;

/// Result of checking one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCheck {
    pub name: String,
    pub address: Address,
    pub has_code: bool,
}

/// Check every contract the context resolves.
///
/// Contracts that are not configured are skipped; the hub is resolved
/// with its well-known fallback. Code reads run concurrently.
#[instrument(skip_all, fields(chain = %ctx.name))]
pub async fn validate_contracts(chain: &dyn ChainClient, ctx: &ChainContext) -> SdkResult<Vec<ContractCheck>> {
    let mut targets = Vec::new();
    for name in [
        ContractName::Hub,
        ContractName::Token,
        ContractName::Rlc,
        ContractName::Bridge,
        ContractName::EnsRegistry,
    ] {
        if let Some(address) = ctx.resolve_address(name, false)? {
            targets.push((name, address));
        }
    }

    let results = try_join_all(targets.into_iter().map(|(name, address)| async move {
        let has_code = !chain.code_at(address).await?.is_empty();
        if has_code {
            info!(contract = %name, %address, "Contract validated: code exists on-chain");
        } else {
            warn!(contract = %name, %address, "Contract has no code, possible misconfiguration");
        }
        Ok::<_, SdkError>(ContractCheck {
            name: name.to_string(),
            address,
            has_code,
        })
    }))
    .await?;

    info!(validated = results.len(), "All contract validations complete");
    Ok(results)
}
