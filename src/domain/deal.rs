//! Deals and Tasks - Identifiers and Bot Allocation
//!
//! A successful match consumes `botSize` units from every order and opens
//! tasks `botFirst..botFirst + botSize`. The hub is authoritative; the values
//! here are recomputed for reporting and cross-checked against the event.

use std::fmt::Display;

use alloy::primitives::{Address, B256, U256, keccak256};
use alloy::sol_types::SolValue;
use serde::{Serialize, Serializer};

/// Timeout multiplier applied to a category's reference work clock.
pub const FINAL_DEADLINE_RATIO: u64 = 10;

/// Batch of tasks opened by one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bot {
    pub first: u64,
    pub size: u64,
}

/// Allocate the bot of a match.
///
/// `first` is the request volume consumed so far; `size` is the smallest
/// remaining volume across the orders taking part.
pub fn compute_bot(request_consumed: u64, remaining: &[u64]) -> Bot {
    Bot {
        first: request_consumed,
        size: remaining.iter().copied().min().unwrap_or(0),
    }
}

/// `keccak256(requestHash ‖ uint256(consumedBefore))`.
pub fn deal_id(request_hash: B256, request_consumed: u64) -> B256 {
    keccak256((request_hash, U256::from(request_consumed)).abi_encode_packed())
}

/// `keccak256(dealId ‖ uint256(index))`.
pub fn task_id(deal_id: B256, index: u64) -> B256 {
    keccak256((deal_id, U256::from(index)).abi_encode_packed())
}

/// Task ids of every task in the bot.
pub fn task_ids(deal_id: B256, bot: Bot) -> Vec<B256> {
    (bot.first..bot.first.saturating_add(bot.size))
        .map(|index| task_id(deal_id, index))
        .collect()
}

fn as_decimal<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// What a match produced, as reported to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    #[serde(rename = "dealid")]
    pub deal_id: B256,
    #[serde(rename = "txHash")]
    pub tx_hash: B256,
    #[serde(serialize_with = "as_decimal")]
    pub bot_first: u64,
    #[serde(serialize_with = "as_decimal")]
    pub bot_size: u64,
    pub app: Address,
    pub dataset: Address,
    pub workerpool: Address,
    pub requester: Address,
    pub beneficiary: Address,
    pub callback: Address,
    pub params: String,
    pub tag: B256,
    pub category: u64,
    pub trust: u64,
    /// Price per task, in nRLC.
    #[serde(serialize_with = "as_decimal")]
    pub task_price: u128,
    /// Unix seconds of the block that included the match.
    pub start_time: u64,
    pub final_deadline: u64,
    pub tasks: Vec<B256>,
}

/// Last moment a task of this deal may be finalized.
pub fn final_deadline(start_time: u64, work_clock_time_ref: u64) -> u64 {
    start_time.saturating_add(work_clock_time_ref.saturating_mul(FINAL_DEADLINE_RATIO))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_is_min_remaining() {
        let bot = compute_bot(0, &[1_000_000, 5, 5]);
        assert_eq!(bot, Bot { first: 0, size: 5 });
        let bot = compute_bot(3, &[10, 2]);
        assert_eq!(bot, Bot { first: 3, size: 2 });
    }

    #[test]
    fn test_task_ids_follow_bot() {
        let deal = deal_id(B256::repeat_byte(7), 0);
        let ids = task_ids(deal, Bot { first: 2, size: 3 });
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], task_id(deal, 2));
        assert_eq!(ids[2], task_id(deal, 4));
    }

    #[test]
    fn test_deal_id_is_packed_keccak() {
        let request_hash = B256::repeat_byte(1);
        let mut packed = request_hash.to_vec();
        packed.extend_from_slice(&U256::from(4u64).to_be_bytes::<32>());
        assert_eq!(deal_id(request_hash, 4), keccak256(&packed));
        assert_ne!(deal_id(request_hash, 4), deal_id(request_hash, 5));
    }

    #[test]
    fn test_final_deadline() {
        assert_eq!(final_deadline(1_000, 300), 4_000);
    }
}
