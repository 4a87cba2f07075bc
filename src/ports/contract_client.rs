//! Contract Client - Chain-Aware Facade over the Contract Ports
//!
//! Bundles the ports of one chain connection with its immutable
//! [`ChainContext`] and the optional signing key. Use cases receive this
//! value instead of individual ports; missing contracts surface as
//! `ConfigurationError`, a missing key as `MissingSignerError`.

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use tracing::{debug, instrument};

use crate::domain::chain::{ChainContext, ContractName, ResourceKind};
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::receipt::TxReceipt;

use super::chain_client::ChainClient;
use super::contracts::{BridgeContract, HubContract, TokenContract};

#[derive(Clone)]
pub struct ContractClient {
  ctx: Arc<ChainContext>,
  signer: Option<PrivateKeySigner>,
  chain: Arc<dyn ChainClient>,
  hub: Arc<dyn HubContract>,
  token: Option<Arc<dyn TokenContract>>,
  rlc: Option<Arc<dyn TokenContract>>,
  bridge: Option<Arc<dyn BridgeContract>>,
}

impl ContractClient {
  /// Read-only client; attach the optional parts with the `with_*` methods.
  pub fn new(ctx: Arc<ChainContext>, chain: Arc<dyn ChainClient>, hub: Arc<dyn HubContract>) -> Self {
    Self {
      ctx,
      signer: None,
      chain,
      hub,
      token: None,
      rlc: None,
      bridge: None,
    }
  }

  #[must_use]
  pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
    self.signer = Some(signer);
    self
  }

  #[must_use]
  pub fn with_token(mut self, token: Arc<dyn TokenContract>) -> Self {
    self.token = Some(token);
    self
  }

  #[must_use]
  pub fn with_rlc(mut self, rlc: Arc<dyn TokenContract>) -> Self {
    self.rlc = Some(rlc);
    self
  }

  #[must_use]
  pub fn with_bridge(mut self, bridge: Arc<dyn BridgeContract>) -> Self {
    self.bridge = Some(bridge);
    self
  }

  pub fn context(&self) -> &ChainContext {
    &self.ctx
  }

  pub fn chain(&self) -> &dyn ChainClient {
    self.chain.as_ref()
  }

  pub fn hub(&self) -> &dyn HubContract {
    self.hub.as_ref()
  }

  /// The attached key, or `MissingSignerError` naming `operation`.
  pub fn signer(&self, operation: &'static str) -> SdkResult<&PrivateKeySigner> {
    self.signer.as_ref().ok_or(SdkError::MissingSigner { operation })
  }

  pub fn signer_address(&self, operation: &'static str) -> SdkResult<Address> {
    self.signer(operation).map(PrivateKeySigner::address)
  }

  /// Marketplace ERC20 token; absent on native chains.
  pub fn token(&self) -> SdkResult<&dyn TokenContract> {
    self.token.as_deref().ok_or_else(|| {
      SdkError::configuration(format!(
        "chain {} has no marketplace token contract{}",
        self.ctx.name,
        if self.ctx.is_native { " (native chain)" } else { "" }
      ))
    })
  }

  /// Underlying RLC token wrapped into eRLC.
  pub fn rlc(&self) -> SdkResult<&dyn TokenContract> {
    self.rlc.as_deref().ok_or_else(|| {
      SdkError::configuration(format!("no {} address configured for chain {}", ContractName::Rlc, self.ctx.name))
    })
  }

  pub fn bridge(&self) -> SdkResult<&dyn BridgeContract> {
    self.bridge.as_deref().ok_or_else(|| {
      SdkError::configuration(format!("no {} address configured for chain {}", ContractName::Bridge, self.ctx.name))
    })
  }

  pub fn resolve_address(&self, name: ContractName, strict: bool) -> SdkResult<Option<Address>> {
    self.ctx.resolve_address(name, strict)
  }

  /// Whether `address` is a registered app, dataset or workerpool.
  pub async fn is_deployed(&self, kind: ResourceKind, address: Address) -> SdkResult<bool> {
    self.hub.is_registered(kind, address).await
  }

  /// Wait for the configured confirmations; a failed receipt is `TransactionRevertedError`.
  #[instrument(skip(self), fields(chain = %self.ctx.name, confirms = self.ctx.confirms))]
  pub async fn await_confirmation(&self, tx_hash: B256) -> SdkResult<TxReceipt> {
    let receipt = self.chain.wait_receipt(tx_hash, self.ctx.confirms).await?;
    if !receipt.success {
      return Err(SdkError::TransactionReverted { tx_hash });
    }
    debug!(%tx_hash, block = receipt.block_number, "Transaction confirmed");
    Ok(receipt)
  }
}
