//! Wallet Manager Use Case - Value Transfers out of the Wallet
//!
//! Native and token sends, the sweep (wallet drain) and the enterprise
//! wrap/unwrap between RLC and eRLC. Every debit runs the balance guard
//! and, on enterprise chains, the whitelist gate before the first write.

use alloy::primitives::{Address, B256, Bytes, U256};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::chain::{Flavor, TxOptions};
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::units::{NativeAmount, TokenAmount, to_native_unit};
use crate::ports::abi::IexecToken;
use crate::ports::contract_client::ContractClient;

use super::balance::{
  WalletBalance, ensure_positive, ensure_sufficient, ensure_token_funds, ensure_whitelisted, wallet_balance,
};

/// Gas used by a plain value transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Outcome of [`WalletManager::sweep`]; partial success is a normal result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepResult {
  #[serde(rename = "sendERC20TxHash", skip_serializing_if = "Option::is_none")]
  pub send_token_tx_hash: Option<B256>,
  #[serde(rename = "sendNativeTxHash", skip_serializing_if = "Option::is_none")]
  pub send_native_tx_hash: Option<B256>,
  /// Recoverable failures of the native drain.
  pub errors: Vec<String>,
}

fn ensure_recipient(to: Address) -> SdkResult<()> {
  if to.is_zero() {
    return Err(SdkError::validation("recipient must not be the zero address"));
  }
  Ok(())
}

/// Wallet operations for one chain connection.
pub struct WalletManager {
  client: ContractClient,
}

impl WalletManager {
  pub fn new(client: ContractClient) -> Self {
    Self { client }
  }

  pub async fn show(&self, owner: Address) -> SdkResult<WalletBalance> {
    wallet_balance(&self.client, owner).await
  }

  /// Send native coin on a token chain.
  ///
  /// Refused on native chains, where the native coin is the marketplace
  /// token and [`Self::send_token`] applies.
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn send_native(&self, to: Address, amount: NativeAmount, opts: TxOptions) -> SdkResult<B256> {
    let from = self.client.signer_address("sendNative")?;
    if self.client.context().is_native {
      return Err(SdkError::validation(
        "cannot send ether on a native chain, send the token instead",
      ));
    }
    ensure_recipient(to)?;
    ensure_positive(amount.raw(), "amount")?;

    let available = self.client.chain().native_balance(from).await?;
    ensure_sufficient(amount.raw(), available, "wei")?;

    let tx_hash = self.client.chain().send_native(to, amount.raw(), opts).await?;
    self.client.await_confirmation(tx_hash).await?;
    info!(%tx_hash, %to, %amount, "Native coin sent");
    Ok(tx_hash)
  }

  /// Send marketplace tokens (native value on a native chain).
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn send_token(&self, to: Address, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
    let from = self.client.signer_address("sendToken")?;
    ensure_recipient(to)?;
    ensure_positive(amount.raw(), "amount")?;
    ensure_whitelisted(&self.client, &[from, to]).await?;
    ensure_token_funds(&self.client, from, amount).await?;

    let tx_hash = self.transfer_token(to, amount, opts).await?;
    info!(%tx_hash, %to, %amount, "Token sent");
    Ok(tx_hash)
  }

  /// Unguarded token transfer with confirmation and event check.
  async fn transfer_token(&self, to: Address, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
    if self.client.context().is_native {
      let value = to_native_unit(amount)?;
      let tx_hash = self.client.chain().send_native(to, value.raw(), opts).await?;
      self.client.await_confirmation(tx_hash).await?;
      return Ok(tx_hash);
    }

    let token = self.client.token()?;
    let tx_hash = token.transfer(to, amount.raw(), opts).await?;
    let receipt = self.client.await_confirmation(tx_hash).await?;
    receipt.expect_event::<IexecToken::Transfer>(token.address())?;
    Ok(tx_hash)
  }

  /// Drain the wallet into `to`.
  ///
  /// The token balance goes first (token chains only). The native balance
  /// is then re-read and sent minus the transfer's own fee
  /// (`gas price * 21000`). A native drain that cannot cover its fee, or
  /// fails, is recorded in `errors` instead of failing the sweep.
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn sweep(&self, to: Address, opts: TxOptions) -> SdkResult<SweepResult> {
    let from = self.client.signer_address("sweep")?;
    ensure_recipient(to)?;
    let mut result = SweepResult::default();

    if !self.client.context().is_native {
      ensure_whitelisted(&self.client, &[from, to]).await?;
      let token_balance = TokenAmount(self.client.token()?.balance_of(from).await?);
      if !token_balance.is_zero() {
        let tx_hash = self.transfer_token(to, token_balance, opts).await?;
        info!(%tx_hash, amount = %token_balance, "Token balance swept");
        result.send_token_tx_hash = Some(tx_hash);
      }
    }

    let native = self.client.chain().native_balance(from).await?;
    let gas_price = self.client.chain().gas_price(opts).await?;
    let fee = U256::from(gas_price) * U256::from(NATIVE_TRANSFER_GAS);

    if native <= fee {
      let message = format!("native balance {native} wei does not cover the transfer fee {fee} wei");
      warn!(%native, %fee, "Native sweep skipped");
      result.errors.push(message);
      return Ok(result);
    }

    let native_opts = TxOptions {
      gas_price: Some(gas_price),
      gas_limit: Some(NATIVE_TRANSFER_GAS),
    };
    let sent = async {
      let tx_hash = self.client.chain().send_native(to, native - fee, native_opts).await?;
      self.client.await_confirmation(tx_hash).await?;
      Ok::<_, SdkError>(tx_hash)
    }
    .await;

    match sent {
      Ok(tx_hash) => {
        info!(%tx_hash, amount = %(native - fee), "Native balance swept");
        result.send_native_tx_hash = Some(tx_hash);
      }
      Err(e) => {
        warn!(error = %e, "Native sweep failed");
        result.errors.push(format!("failed to sweep native balance: {e}"));
      }
    }
    Ok(result)
  }

  /// Enterprise only: convert RLC into eRLC.
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn wrap(&self, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
    let from = self.client.signer_address("wrap")?;
    self.ensure_enterprise("wrap")?;
    ensure_positive(amount.raw(), "amount")?;
    ensure_whitelisted(&self.client, &[from]).await?;

    let rlc = self.client.rlc()?;
    let erlc = self.client.token()?.address();
    ensure_sufficient(amount.raw(), rlc.balance_of(from).await?, "nRLC")?;

    let tx_hash = rlc.approve_and_call(erlc, amount.raw(), Bytes::new(), opts).await?;
    let receipt = self.client.await_confirmation(tx_hash).await?;
    receipt.expect_event::<IexecToken::Approval>(rlc.address())?;
    info!(%tx_hash, %amount, "RLC wrapped into eRLC");
    Ok(tx_hash)
  }

  /// Enterprise only: burn eRLC back into RLC.
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn unwrap(&self, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
    let from = self.client.signer_address("unwrap")?;
    self.ensure_enterprise("unwrap")?;
    ensure_positive(amount.raw(), "amount")?;
    ensure_whitelisted(&self.client, &[from]).await?;

    let erlc = self.client.token()?;
    ensure_sufficient(amount.raw(), erlc.balance_of(from).await?, "nRLC")?;

    let tx_hash = erlc.withdraw(amount.raw(), opts).await?;
    let receipt = self.client.await_confirmation(tx_hash).await?;
    receipt.expect_event::<IexecToken::Transfer>(erlc.address())?;
    info!(%tx_hash, %amount, "eRLC unwrapped into RLC");
    Ok(tx_hash)
  }

  fn ensure_enterprise(&self, operation: &str) -> SdkResult<()> {
    if self.client.context().flavor != Flavor::Enterprise {
      return Err(SdkError::validation(format!("{operation} is only available on enterprise chains")));
    }
    Ok(())
  }
}
