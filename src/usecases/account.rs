//! Account Use Case - Escrow Deposit and Withdrawal
//!
//! Moves value between the wallet and the hub escrow. A deposit on a
//! native chain sends value to `deposit()`; on a token chain it goes
//! through `approveAndCall(hub, amount)` on the token.

use alloy::primitives::{Address, B256, Bytes};
use tracing::{info, instrument};

use crate::domain::chain::TxOptions;
use crate::domain::errors::SdkResult;
use crate::domain::units::{TokenAmount, to_native_unit};
use crate::ports::abi::{IexecPoco, IexecToken};
use crate::ports::contract_client::ContractClient;
use crate::ports::contracts::AccountBalance;

use super::balance::{account_balance, ensure_positive, ensure_sufficient, ensure_token_funds, ensure_whitelisted};

pub struct AccountManager {
  client: ContractClient,
}

impl AccountManager {
  pub fn new(client: ContractClient) -> Self {
    Self { client }
  }

  pub async fn show(&self, owner: Address) -> SdkResult<AccountBalance> {
    account_balance(&self.client, owner).await
  }

  /// Move `amount` from the wallet into the escrow stake.
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn deposit(&self, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
    let from = self.client.signer_address("deposit")?;
    ensure_positive(amount.raw(), "deposit amount")?;
    ensure_whitelisted(&self.client, &[from]).await?;
    ensure_token_funds(&self.client, from, amount).await?;

    let hub = self.client.hub();
    let tx_hash = if self.client.context().is_native {
      let value = to_native_unit(amount)?;
      let tx_hash = hub.deposit_native(value.raw(), opts).await?;
      let receipt = self.client.await_confirmation(tx_hash).await?;
      receipt.expect_event::<IexecPoco::Transfer>(hub.address())?;
      tx_hash
    } else {
      let token = self.client.token()?;
      let tx_hash = token.approve_and_call(hub.address(), amount.raw(), Bytes::new(), opts).await?;
      let receipt = self.client.await_confirmation(tx_hash).await?;
      receipt.expect_event::<IexecToken::Approval>(token.address())?;
      tx_hash
    };

    info!(%tx_hash, %amount, "Deposited into escrow");
    Ok(tx_hash)
  }

  /// Move `amount` of free stake back to the wallet.
  #[instrument(skip(self), fields(chain = %self.client.context().name))]
  pub async fn withdraw(&self, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
    let from = self.client.signer_address("withdraw")?;
    ensure_positive(amount.raw(), "withdraw amount")?;
    ensure_whitelisted(&self.client, &[from]).await?;

    let stake = self.client.hub().view_account(from).await?.stake;
    ensure_sufficient(amount.raw(), stake.raw(), "nRLC")?;

    let hub = self.client.hub();
    let tx_hash = hub.withdraw(amount, opts).await?;
    let receipt = self.client.await_confirmation(tx_hash).await?;
    receipt.expect_event::<IexecPoco::Transfer>(hub.address())?;

    info!(%tx_hash, %amount, "Withdrawn from escrow");
    Ok(tx_hash)
  }
}
