//! Bridge Transfer - Lifecycle States, Limits and Daily Quota Accounting
//!
//! Pure part of the cross-chain transfer: which state follows which, how
//! the per-transaction and daily bounds are applied, and how the transfers
//! already made during the bridge day are summed. The orchestration that
//! talks to both chains lives in `usecases::bridge`.

use std::fmt;

use alloy::primitives::{B256, U256};
use serde::Serialize;

use super::errors::{LimitBound, SdkError, SdkResult};

/// Seconds in one bridge day; `getCurrentDay()` is `timestamp / DAY_SECONDS`.
pub const DAY_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeState {
    Validating,
    PolicyChecked,
    LimitChecked,
    Sent,
    WaitingReceive,
    Received,
    Failed,
}

impl BridgeState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Received | Self::Failed)
    }

    /// Move to `next`, refusing anything off the happy path except failure.
    pub fn advance(self, next: Self) -> SdkResult<Self> {
        let legal = match (self, next) {
            (from, Self::Failed) => !from.is_terminal(),
            (Self::Validating, Self::PolicyChecked)
            | (Self::PolicyChecked, Self::LimitChecked)
            | (Self::LimitChecked, Self::Sent)
            | (Self::Sent, Self::WaitingReceive)
            | (Self::WaitingReceive, Self::Received) => true,
            _ => false,
        };
        if legal {
            Ok(next)
        } else {
            Err(SdkError::validation(format!("illegal bridge transition {self} -> {next}")))
        }
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "VALIDATING",
            Self::PolicyChecked => "POLICY_CHECKED",
            Self::LimitChecked => "LIMIT_CHECKED",
            Self::Sent => "SENT",
            Self::WaitingReceive => "WAITING_RECEIVE",
            Self::Received => "RECEIVED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Which way value crosses the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeDirection {
    /// Token chain to native chain; completes with `AffirmationCompleted`.
    ToSidechain,
    /// Native chain to token chain; completes with `RelayedMessage`.
    ToMainchain,
}

impl BridgeDirection {
    /// Direction implied by the source chain's token mode.
    pub const fn from_source(source_is_native: bool) -> Self {
        if source_is_native { Self::ToMainchain } else { Self::ToSidechain }
    }

    /// Event the destination bridge emits once the transfer lands.
    pub const fn completion_event(self) -> &'static str {
        match self {
            Self::ToSidechain => "AffirmationCompleted",
            Self::ToMainchain => "RelayedMessage",
        }
    }
}

/// Bounds read from the source bridge, in source-chain units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeLimits {
    pub min_per_tx: U256,
    pub max_per_tx: U256,
    pub daily_limit: U256,
}

impl BridgeLimits {
    /// `amount` must lie in `[minPerTx, maxPerTx]`.
    pub fn check_per_tx(&self, amount: U256) -> SdkResult<()> {
        if amount < self.min_per_tx {
            return Err(SdkError::BridgeLimit {
                bound: LimitBound::MinPerTx,
                amount,
                limit: self.min_per_tx,
                spent_today: U256::ZERO,
            });
        }
        if amount > self.max_per_tx {
            return Err(SdkError::BridgeLimit {
                bound: LimitBound::MaxPerTx,
                amount,
                limit: self.max_per_tx,
                spent_today: U256::ZERO,
            });
        }
        Ok(())
    }

    /// `spent_today + amount` must not exceed `dailyLimit`.
    pub fn check_daily(&self, spent_today: U256, amount: U256) -> SdkResult<()> {
        let total = spent_today.saturating_add(amount);
        if total > self.daily_limit {
            return Err(SdkError::BridgeLimit {
                bound: LimitBound::DailyLimit,
                amount,
                limit: self.daily_limit,
                spent_today,
            });
        }
        Ok(())
    }
}

/// One transfer into the bridge, as read from the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeTransferLog {
    pub block_number: u64,
    pub log_index: u64,
    pub amount: U256,
}

/// Sum of the transfers at or after `day_start_block`.
///
/// Logs are put in ascending `(block, log index)` order first, so a batch
/// returned out of order by a node cannot leak yesterday's transfers in.
pub fn spent_since(mut logs: Vec<BridgeTransferLog>, day_start_block: u64) -> U256 {
    logs.sort_by_key(|log| (log.block_number, log.log_index));
    logs.iter()
        .skip_while(|log| log.block_number < day_start_block)
        .fold(U256::ZERO, |acc, log| acc.saturating_add(log.amount))
}

/// First second of bridge day `day`.
pub const fn day_start_timestamp(day: u64) -> u64 {
    day.saturating_mul(DAY_SECONDS)
}

/// Blocks to step back when `remaining_secs` separate the cursor from the
/// day start and `observed_secs` elapsed over `observed_blocks`.
///
/// Never less than one block, so the walk always makes progress.
pub fn walk_step(remaining_secs: u64, observed_blocks: u64, observed_secs: u64) -> u64 {
    if observed_secs == 0 || observed_blocks == 0 {
        return remaining_secs.max(1);
    }
    let scaled = u128::from(remaining_secs) * u128::from(observed_blocks) / u128::from(observed_secs);
    u64::try_from(scaled).unwrap_or(u64::MAX).max(1)
}

/// Intermediate states published while a transfer runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeProgress {
    PolicyChecked {
        #[serde(flatten)]
        limits: BridgeLimits,
    },
    LimitChecked {
        day: u64,
        #[serde(rename = "spentToday")]
        spent_today: U256,
    },
    Sent {
        #[serde(rename = "txHash")]
        tx_hash: B256,
    },
    WaitingReceive {
        #[serde(rename = "sourceTxHash")]
        source_tx_hash: B256,
        /// First destination block scanned for the completion event.
        #[serde(rename = "fromBlock")]
        from_block: u64,
    },
    Received {
        #[serde(rename = "receiveTxHash")]
        receive_tx_hash: B256,
    },
    Failed {
        error: String,
    },
}

impl BridgeProgress {
    pub const fn state(&self) -> BridgeState {
        match self {
            Self::PolicyChecked { .. } => BridgeState::PolicyChecked,
            Self::LimitChecked { .. } => BridgeState::LimitChecked,
            Self::Sent { .. } => BridgeState::Sent,
            Self::WaitingReceive { .. } => BridgeState::WaitingReceive,
            Self::Received { .. } => BridgeState::Received,
            Self::Failed { .. } => BridgeState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> BridgeLimits {
        BridgeLimits {
            min_per_tx: U256::from(10),
            max_per_tx: U256::from(100),
            daily_limit: U256::from(1_000),
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut state = BridgeState::Validating;
        for next in [
            BridgeState::PolicyChecked,
            BridgeState::LimitChecked,
            BridgeState::Sent,
            BridgeState::WaitingReceive,
            BridgeState::Received,
        ] {
            state = state.advance(next).unwrap();
        }
        assert!(state.is_terminal());
        assert!(state.advance(BridgeState::Failed).is_err());
    }

    #[test]
    fn test_no_skipping_limit_check() {
        assert!(BridgeState::PolicyChecked.advance(BridgeState::Sent).is_err());
        assert!(BridgeState::Sent.advance(BridgeState::Failed).is_ok());
    }

    #[test]
    fn test_per_tx_bounds_inclusive() {
        let l = limits();
        assert!(l.check_per_tx(U256::from(10)).is_ok());
        assert!(l.check_per_tx(U256::from(100)).is_ok());
        assert!(matches!(
            l.check_per_tx(U256::from(9)),
            Err(SdkError::BridgeLimit { bound: LimitBound::MinPerTx, .. })
        ));
        assert!(matches!(
            l.check_per_tx(U256::from(101)),
            Err(SdkError::BridgeLimit { bound: LimitBound::MaxPerTx, .. })
        ));
    }

    #[test]
    fn test_daily_boundary() {
        let l = limits();
        let spent = U256::from(1_000 - 30);
        assert!(l.check_daily(spent, U256::from(30)).is_ok());
        let err = l.check_daily(spent, U256::from(31)).unwrap_err();
        assert_eq!(err.name(), "BridgeLimitError");
    }

    #[test]
    fn test_spent_since_skips_prior_day() {
        let logs = vec![
            BridgeTransferLog { block_number: 12, log_index: 0, amount: U256::from(5) },
            BridgeTransferLog { block_number: 9, log_index: 3, amount: U256::from(100) },
            BridgeTransferLog { block_number: 10, log_index: 1, amount: U256::from(7) },
        ];
        assert_eq!(spent_since(logs, 10), U256::from(12));
        assert_eq!(spent_since(Vec::new(), 0), U256::ZERO);
    }

    #[test]
    fn test_walk_step_scales_by_block_time() {
        assert_eq!(walk_step(600, 100, 500), 120);
        assert_eq!(walk_step(1, 1, 3600), 1);
        assert_eq!(walk_step(50, 0, 0), 50);
    }

    #[test]
    fn test_progress_serializes_state_tag() {
        let json = serde_json::to_value(BridgeProgress::Sent { tx_hash: B256::ZERO }).unwrap();
        assert_eq!(json["state"], "SENT");
        assert_eq!(BridgeProgress::Failed { error: "x".into() }.state(), BridgeState::Failed);
    }
}
