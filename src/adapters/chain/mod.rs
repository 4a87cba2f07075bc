//! Chain Adapters - EVM Interaction Layer
//!
//! Provides on-chain access via alloy-rs for:
//! - RPC connection with chain id check and receipt polling
//! - Hub, token and bridge contract bindings
//! - Gas price selection
//! - Deployed-code validation of configured contracts
//!
//! [`connect_client`] wires all of them into a `ContractClient`.

pub mod contracts;
pub mod gas;
pub mod provider;
pub mod validator;

use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::instrument;

use crate::domain::chain::{ChainContext, ContractName};
use crate::ports::contract_client::ContractClient;
use crate::ports::contracts::HubContract;

pub use contracts::{BridgeAdapter, HubAdapter, TokenAdapter};
pub use gas::GasOracle;
pub use provider::ChainProvider;
pub use validator::{ContractCheck, validate_contracts};

/// Connect to a chain and bind every contract its context resolves.
///
/// On a token chain without a configured token address, the token is
/// read from the hub.
#[instrument(skip_all, fields(chain = %ctx.name))]
pub async fn connect_client(
    ctx: ChainContext,
    rpc_url: &str,
    signer: Option<PrivateKeySigner>,
) -> Result<ContractClient> {
    let ctx = Arc::new(ctx);
    let provider = Arc::new(ChainProvider::connect(Arc::clone(&ctx), rpc_url, signer.clone()).await?);

    let hub_address = ctx.require_address(ContractName::Hub)?;
    let hub = Arc::new(HubAdapter::new(Arc::clone(&provider), hub_address));

    let token_address = if ctx.is_native {
        None
    } else {
        match ctx.resolve_address(ContractName::Token, false)? {
            Some(address) => Some(address),
            None => Some(
                hub.token_address()
                    .await
                    .context("Failed to read the token address from the hub")?,
            ),
        }
    };

    let mut client = ContractClient::new(Arc::clone(&ctx), provider.clone(), hub);

    if let Some(token) = token_address {
        client = client.with_token(Arc::new(TokenAdapter::new(Arc::clone(&provider), token)));
    }
    if let Some(rlc) = ctx.resolve_address(ContractName::Rlc, false)? {
        client = client.with_rlc(Arc::new(TokenAdapter::new(Arc::clone(&provider), rlc)));
    }
    if let Some(bridge) = ctx.resolve_address(ContractName::Bridge, false)? {
        client = client.with_bridge(Arc::new(BridgeAdapter::new(Arc::clone(&provider), bridge, token_address)));
    }
    if let Some(signer) = signer {
        client = client.with_signer(signer);
    }

    Ok(client)
}
