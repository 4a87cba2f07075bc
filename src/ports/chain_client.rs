//! Chain Client Port - Raw Chain Access
//!
//! Balance, block and gas reads plus plain value transfers and receipt
//! waiting. Everything contract-specific goes through the ports in
//! `ports::contracts`.

use alloy::primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

use crate::domain::chain::TxOptions;
use crate::domain::errors::SdkResult;
use crate::domain::receipt::TxReceipt;

/// Trait for one JSON-RPC connection.
///
/// Writes use the wallet the connection was built with; a read-only
/// connection fails them with `MissingSignerError`.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// Native coin balance in wei.
  async fn native_balance(&self, owner: Address) -> SdkResult<U256>;

  /// Gas price in wei a send with `opts` would pay: override, else the
  /// chain's fixed price, else the node's `eth_gasPrice`.
  async fn gas_price(&self, opts: TxOptions) -> SdkResult<u128>;

  /// Latest block number.
  async fn block_number(&self) -> SdkResult<u64>;

  /// Timestamp (unix seconds) of block `number`.
  async fn block_timestamp(&self, number: u64) -> SdkResult<u64>;

  /// Deployed bytecode at `address`; empty when nothing is deployed.
  async fn code_at(&self, address: Address) -> SdkResult<Bytes>;

  /// Send `value` wei to `to`; returns the transaction hash once accepted by the node.
  async fn send_native(&self, to: Address, value: U256, opts: TxOptions) -> SdkResult<B256>;

  /// Suspend until `tx_hash` is mined and `confirmations` blocks deep.
  ///
  /// Returns the receipt whatever its status; no internal timeout.
  async fn wait_receipt(&self, tx_hash: B256, confirmations: u64) -> SdkResult<TxReceipt>;
}
