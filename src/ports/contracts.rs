//! Contract Ports - Typed Capabilities per Remote Contract
//!
//! One trait per contract kind (hub, token, bridge). Methods return
//! transaction hashes for writes; confirmation and expected-event checks
//! are done by the caller through `ContractClient::await_confirmation`.

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::Eip712Domain;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::bridge::{BridgeDirection, BridgeLimits, BridgeTransferLog};
use crate::domain::chain::{ResourceKind, TxOptions};
use crate::domain::errors::SdkResult;
use crate::domain::order::{AppOrder, DatasetOrder, Order, RequestOrder, WorkerpoolOrder};
use crate::domain::units::TokenAmount;

/// Escrow account held by the hub, in nRLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
  pub stake: TokenAmount,
  pub locked: TokenAmount,
}

/// Work category registered on the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: u64,
  pub name: String,
  pub description: String,
  /// Reference duration of one task, in seconds.
  pub work_clock_time_ref: u64,
}

/// `manage*Order` operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderOperation {
  /// Record an on-chain pre-signature.
  Sign = 0,
  /// Mark the order consumed.
  Close = 1,
}

/// The marketplace hub (escrow, orders, registries).
#[async_trait]
pub trait HubContract: Send + Sync + 'static {
  fn address(&self) -> Address;

  /// Typed-data domain the hub hashes orders under.
  async fn eip712_domain(&self) -> SdkResult<Eip712Domain>;

  /// Marketplace token the escrow accounts in.
  async fn token_address(&self) -> SdkResult<Address>;

  async fn view_account(&self, owner: Address) -> SdkResult<AccountBalance>;

  /// Volume already consumed from the order with this hash.
  async fn view_consumed(&self, order_hash: B256) -> SdkResult<u64>;

  async fn verify_signature(&self, identity: Address, hash: B256, sign: Bytes) -> SdkResult<bool>;

  async fn verify_presignature(&self, identity: Address, hash: B256) -> SdkResult<bool>;

  /// Whether `address` is registered in the registry of `kind`.
  async fn is_registered(&self, kind: ResourceKind, address: Address) -> SdkResult<bool>;

  /// Owner of a registered app, dataset or workerpool.
  async fn resource_owner(&self, address: Address) -> SdkResult<Address>;

  /// Category `id`, or `None` when it does not exist.
  async fn category(&self, id: u64) -> SdkResult<Option<Category>>;

  /// Native-chain deposit: the value sent becomes stake.
  async fn deposit_native(&self, value: U256, opts: TxOptions) -> SdkResult<B256>;

  async fn withdraw(&self, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256>;

  async fn match_orders(
    &self,
    app: &AppOrder,
    dataset: &DatasetOrder,
    workerpool: &WorkerpoolOrder,
    request: &RequestOrder,
    opts: TxOptions,
  ) -> SdkResult<B256>;

  async fn manage_order(&self, order: &Order, operation: OrderOperation, opts: TxOptions) -> SdkResult<B256>;
}

/// ERC20-like marketplace token (RLC, or eRLC on enterprise chains).
#[async_trait]
pub trait TokenContract: Send + Sync + 'static {
  fn address(&self) -> Address;

  async fn balance_of(&self, owner: Address) -> SdkResult<U256>;

  async fn transfer(&self, to: Address, amount: U256, opts: TxOptions) -> SdkResult<B256>;

  /// Approve `spender` and notify it in the same transaction.
  async fn approve_and_call(&self, spender: Address, amount: U256, extra: Bytes, opts: TxOptions) -> SdkResult<B256>;

  /// Enterprise whitelist lookup.
  async fn is_kyc(&self, account: Address) -> SdkResult<bool>;

  /// Burn wrapped tokens back into the underlying token.
  async fn withdraw(&self, amount: U256, opts: TxOptions) -> SdkResult<B256>;
}

/// One side of the mainchain/sidechain bridge.
#[async_trait]
pub trait BridgeContract: Send + Sync + 'static {
  fn address(&self) -> Address;

  /// Bounds in this chain's units (wei on a native chain, nRLC otherwise).
  async fn limits(&self) -> SdkResult<BridgeLimits>;

  /// The bridge's own day index.
  async fn current_day(&self) -> SdkResult<u64>;

  /// Transfers into the bridge within `[from_block, to_block]`.
  async fn transfer_logs(&self, from_block: u64, to_block: u64) -> SdkResult<Vec<BridgeTransferLog>>;

  /// Destination transaction completing `source_tx_hash`, if seen in the range.
  async fn find_completion(
    &self,
    direction: BridgeDirection,
    source_tx_hash: B256,
    from_block: u64,
    to_block: u64,
  ) -> SdkResult<Option<B256>>;
}
