//! JSON-RPC Provider - alloy-rs Connection Management
//!
//! Connects to one chain, checks the chain id against the configuration
//! and implements the [`ChainClient`] port. Contract adapters share the
//! same connection through `Arc<ChainProvider>` and go through
//! [`ChainProvider::view`] / [`ChainProvider::transact`] for ABI calls.

use std::sync::Arc;

use alloy::eips::BlockNumberOrTag;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::domain::chain::{ChainContext, TxOptions};
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::receipt::{ReceiptLog, TxReceipt};
use crate::ports::chain_client::ChainClient;

use super::gas::GasOracle;

/// Shared RPC connection backed by alloy.
///
/// The provider is type-erased into a [`DynProvider`]; with a signer it
/// carries the wallet filler, so writes are signed locally.
pub struct ChainProvider {
    provider: DynProvider,
    ctx: Arc<ChainContext>,
    gas: GasOracle,
    /// Whether a wallet is attached (writes allowed).
    can_sign: bool,
}

impl ChainProvider {
    /// Connect to `rpc_url` and validate the chain id.
    #[instrument(skip_all, fields(chain = %ctx.name, chain_id = ctx.chain_id))]
    pub async fn connect(
        ctx: Arc<ChainContext>,
        rpc_url: &str,
        signer: Option<PrivateKeySigner>,
    ) -> Result<Self> {
        let url = rpc_url.parse().context("Invalid RPC URL")?;
        let can_sign = signer.is_some();

        let provider = match signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url)
                .erased(),
            None => ProviderBuilder::new().connect_http(url).erased(),
        };

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if chain_id != ctx.chain_id {
            anyhow::bail!(
                "Chain {} expects chain_id={}, RPC reports {chain_id}",
                ctx.name,
                ctx.chain_id
            );
        }

        info!(chain_id, can_sign, "Connected to RPC");

        let gas = GasOracle::new(provider.clone(), ctx.gas_price);
        Ok(Self {
            provider,
            ctx,
            gas,
            can_sign,
        })
    }

    pub fn context(&self) -> &ChainContext {
        &self.ctx
    }

    /// Read-only ABI call.
    pub async fn view<C: SolCall + Send>(&self, to: Address, call: C) -> SdkResult<C::Return> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(call.abi_encode());
        let output = self
            .provider
            .call(tx)
            .await
            .map_err(|e| SdkError::rpc(C::SIGNATURE, e))?;
        C::abi_decode_returns(&output).map_err(|e| SdkError::rpc(C::SIGNATURE, e))
    }

    /// State-changing ABI call; returns the transaction hash.
    pub async fn transact<C: SolCall + Send>(
        &self,
        to: Address,
        call: C,
        value: U256,
        opts: TxOptions,
    ) -> SdkResult<B256> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(call.abi_encode())
            .with_value(value);
        self.submit(tx, C::SIGNATURE, opts).await
    }

    /// Logs matching `filter`.
    pub async fn logs(&self, filter: &Filter) -> SdkResult<Vec<Log>> {
        self.provider
            .get_logs(filter)
            .await
            .map_err(|e| SdkError::rpc("eth_getLogs", e))
    }

    async fn submit(
        &self,
        tx: TransactionRequest,
        operation: &'static str,
        opts: TxOptions,
    ) -> SdkResult<B256> {
        if !self.can_sign {
            return Err(SdkError::MissingSigner { operation });
        }

        let mut tx = tx.with_gas_price(self.gas.price(opts).await?);
        if let Some(limit) = opts.gas_limit {
            tx = tx.with_gas_limit(limit);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| SdkError::rpc(operation, e))?;
        let tx_hash = *pending.tx_hash();

        info!(%tx_hash, operation, chain = %self.ctx.name, "Transaction submitted");
        Ok(tx_hash)
    }
}

fn to_receipt_log(log: &Log) -> ReceiptLog {
    ReceiptLog {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
    }
}

#[async_trait]
impl ChainClient for ChainProvider {
    async fn native_balance(&self, owner: Address) -> SdkResult<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| SdkError::rpc("eth_getBalance", e))
    }

    async fn gas_price(&self, opts: TxOptions) -> SdkResult<u128> {
        self.gas.price(opts).await
    }

    async fn block_number(&self) -> SdkResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| SdkError::rpc("eth_blockNumber", e))
    }

    async fn block_timestamp(&self, number: u64) -> SdkResult<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(|e| SdkError::rpc("eth_getBlockByNumber", e))?
            .ok_or_else(|| SdkError::Rpc(format!("block {number} not found")))?;
        Ok(block.header.timestamp)
    }

    async fn code_at(&self, address: Address) -> SdkResult<Bytes> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| SdkError::rpc("eth_getCode", e))
    }

    #[instrument(skip(self), fields(chain = %self.ctx.name))]
    async fn send_native(&self, to: Address, value: U256, opts: TxOptions) -> SdkResult<B256> {
        let tx = TransactionRequest::default().with_to(to).with_value(value);
        self.submit(tx, "sendNative", opts).await
    }

    #[instrument(skip(self), fields(chain = %self.ctx.name))]
    async fn wait_receipt(&self, tx_hash: B256, confirmations: u64) -> SdkResult<TxReceipt> {
        let confirmations = confirmations.max(1);
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| SdkError::rpc("eth_getTransactionReceipt", e))?;

            if let Some(receipt) = receipt {
                let mined = receipt.block_number.unwrap_or_default();
                let head = self.block_number().await?;
                let depth = head.saturating_sub(mined) + 1;
                if depth >= confirmations {
                    return Ok(TxReceipt {
                        tx_hash,
                        block_number: mined,
                        success: receipt.status(),
                        logs: receipt.inner.logs().iter().map(to_receipt_log).collect(),
                    });
                }
                debug!(%tx_hash, depth, confirmations, "Waiting for confirmations");
            }

            sleep(self.ctx.poll_interval).await;
        }
    }
}
