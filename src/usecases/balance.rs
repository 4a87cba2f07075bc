//! Balance & Allowance Guards
//!
//! Wallet and escrow reads in both units, the sufficiency guard run before
//! every debit, and the enterprise whitelist gate. Nothing is cached: every
//! guard reads fresh state.

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::chain::Flavor;
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::units::{NativeAmount, TokenAmount, to_native_unit, to_token_unit};
use crate::ports::contract_client::ContractClient;
use crate::ports::contracts::AccountBalance;

/// Wallet holdings on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
  /// Native coin; `None` on a native chain where it *is* the token.
  #[serde(rename = "wei", skip_serializing_if = "Option::is_none")]
  pub native: Option<NativeAmount>,
  /// Marketplace token (floored from the native balance on a native chain).
  #[serde(rename = "nRLC")]
  pub token: TokenAmount,
}

/// Read the wallet balance of `owner`.
///
/// On a token chain both reads are issued concurrently.
#[instrument(skip(client), fields(chain = %client.context().name))]
pub async fn wallet_balance(client: &ContractClient, owner: Address) -> SdkResult<WalletBalance> {
  if client.context().is_native {
    let native = client.chain().native_balance(owner).await?;
    return Ok(WalletBalance {
      native: None,
      token: to_token_unit(NativeAmount(native)),
    });
  }

  let token = client.token()?;
  let (native, token) = tokio::try_join!(client.chain().native_balance(owner), token.balance_of(owner))?;
  Ok(WalletBalance {
    native: Some(NativeAmount(native)),
    token: TokenAmount(token),
  })
}

/// Escrow `{stake, locked}` of `owner`.
pub async fn account_balance(client: &ContractClient, owner: Address) -> SdkResult<AccountBalance> {
  client.hub().view_account(owner).await
}

/// `required <= available`, else `InsufficientFundsError` naming the shortfall.
pub fn ensure_sufficient(required: U256, available: U256, unit: &'static str) -> SdkResult<()> {
  if required > available {
    warn!(%required, %available, unit, "Insufficient funds");
    return Err(SdkError::insufficient(required, available, unit));
  }
  Ok(())
}

/// The debit amount must be strictly positive.
pub fn ensure_positive(amount: U256, what: &str) -> SdkResult<()> {
  if amount.is_zero() {
    return Err(SdkError::validation(format!("{what} must be greater than 0")));
  }
  Ok(())
}

/// Enterprise gate: every address must pass the token's `isKYC`.
///
/// A no-op on standard chains. Checked in order; the first rejected
/// address is named in `NotWhitelistedError`.
#[instrument(skip(client), fields(chain = %client.context().name))]
pub async fn ensure_whitelisted(client: &ContractClient, addresses: &[Address]) -> SdkResult<()> {
  if client.context().flavor != Flavor::Enterprise {
    return Ok(());
  }
  let token = client.token()?;
  for &address in addresses {
    if !token.is_kyc(address).await? {
      warn!(%address, "Address is not whitelisted");
      return Err(SdkError::NotWhitelisted { address });
    }
    debug!(%address, "KYC check passed");
  }
  Ok(())
}

/// Guard a token debit from the wallet of `owner`.
///
/// On a native chain the native balance (wei) backs the token amount.
pub async fn ensure_token_funds(client: &ContractClient, owner: Address, amount: TokenAmount) -> SdkResult<()> {
  if client.context().is_native {
    let required = to_native_unit(amount)?;
    let available = client.chain().native_balance(owner).await?;
    return ensure_sufficient(required.raw(), available, "wei");
  }
  let available = client.token()?.balance_of(owner).await?;
  ensure_sufficient(amount.raw(), available, "nRLC")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_guard_boundaries() {
    assert!(ensure_sufficient(U256::from(10), U256::from(10), "nRLC").is_ok());
    let err = ensure_sufficient(U256::from(11), U256::from(10), "nRLC").unwrap_err();
    assert_eq!(err.name(), "InsufficientFundsError");
    assert!(ensure_positive(U256::ZERO, "amount").is_err());
  }

  #[test]
  fn test_native_chain_wallet_serializes_token_only() {
    let balance = WalletBalance {
      native: None,
      token: TokenAmount::from_u64(3),
    };
    let json = serde_json::to_value(balance).unwrap();
    assert_eq!(json, serde_json::json!({"nRLC": "3"}));
  }
}
