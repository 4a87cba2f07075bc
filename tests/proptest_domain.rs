//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that unit conversion, order hashing, bot
//! allocation and bridge quota accounting hold across random inputs.

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::{Eip712Domain, eip712_domain};
use proptest::prelude::*;

use iexec_client::domain::bridge::{BridgeLimits, BridgeTransferLog, spent_since};
use iexec_client::domain::chain::STANDARD_HUB;
use iexec_client::domain::deal::{compute_bot, deal_id, task_ids};
use iexec_client::domain::order::{OrderFields, OrderKind, create_order};
use iexec_client::domain::units::{
    NativeAmount, TokenAmount, format_token, parse_token, to_native_unit, to_token_unit,
    to_token_unit_with_remainder,
};

const WEI_PER_NRLC: u64 = 1_000_000_000;

fn domain() -> Eip712Domain {
    eip712_domain! {
        name: "iExecODB",
        version: "5.0.0",
        chain_id: 134,
        verifying_contract: STANDARD_HUB,
    }
}

// ── Unit Conversion Properties ──────────────────────────────

proptest! {
    /// nRLC → wei → nRLC is exact.
    #[test]
    fn token_native_round_trip(n in any::<u64>()) {
        let amount = TokenAmount(U256::from(n));
        let native = to_native_unit(amount).unwrap();
        prop_assert_eq!(native.raw(), U256::from(n) * U256::from(WEI_PER_NRLC));
        prop_assert_eq!(to_token_unit(native), amount);
    }

    /// wei → nRLC floors; the remainder is what was dropped.
    #[test]
    fn native_to_token_floors(wei in any::<u128>()) {
        let (token, rest) = to_token_unit_with_remainder(NativeAmount(U256::from(wei)));
        prop_assert!(rest.raw() < U256::from(WEI_PER_NRLC));
        prop_assert_eq!(token.raw() * U256::from(WEI_PER_NRLC) + rest.raw(), U256::from(wei));
        prop_assert_eq!(to_token_unit(NativeAmount(U256::from(wei))), token);
    }

    /// The human RLC rendering parses back to the same nRLC amount.
    #[test]
    fn format_token_parses_back(n in any::<u64>()) {
        let amount = TokenAmount(U256::from(n));
        let rendered = format_token(amount);
        prop_assert_eq!(parse_token(&rendered, Some("RLC")).unwrap(), amount);
    }
}

// ── Order Hash Properties ───────────────────────────────────

proptest! {
    /// Any change to a hashed field changes the order hash.
    #[test]
    fn app_hash_sensitive_to_volume_and_price(
        volume in 1u64..1_000_000,
        price in 0u64..1_000_000,
        salt in any::<[u8; 32]>(),
    ) {
        let fields = |volume: u64, price: u64| OrderFields {
            app: Some(Address::repeat_byte(0xaa)),
            volume: Some(volume),
            price: Some(price),
            salt: Some(B256::from(salt)),
            ..OrderFields::default()
        };
        let base = create_order(OrderKind::App, fields(volume, price)).unwrap();
        let more_volume = create_order(OrderKind::App, fields(volume + 1, price)).unwrap();
        let more_price = create_order(OrderKind::App, fields(volume, price + 1)).unwrap();

        let d = domain();
        prop_assert_ne!(base.hash(&d), more_volume.hash(&d));
        prop_assert_ne!(base.hash(&d), more_price.hash(&d));
        prop_assert_eq!(base.hash(&d), base.with_sign(Bytes::from(vec![7u8; 65])).hash(&d));
    }
}

// ── Bot Allocation Properties ───────────────────────────────

proptest! {
    /// The bot never exceeds any order's remaining volume and opens one task per unit.
    #[test]
    fn bot_fits_every_order(
        consumed in 0u64..1_000,
        remaining in prop::collection::vec(1u64..50, 3..5),
    ) {
        let bot = compute_bot(consumed, &remaining);
        prop_assert_eq!(bot.first, consumed);
        prop_assert!(remaining.iter().all(|&volume| bot.size <= volume));
        prop_assert!(remaining.contains(&bot.size));

        let tasks = task_ids(deal_id(B256::repeat_byte(1), consumed), bot);
        prop_assert_eq!(tasks.len() as u64, bot.size);
        let mut unique = tasks.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), tasks.len());
    }
}

// ── Bridge Quota Properties ─────────────────────────────────

proptest! {
    /// Transfers before the day start never count, whatever their order.
    #[test]
    fn quota_ignores_previous_day(
        today in prop::collection::vec((100u64..200, 1u64..1_000), 0..20),
        yesterday in prop::collection::vec((0u64..100, 1u64..1_000), 0..20),
    ) {
        let to_logs = |entries: &[(u64, u64)]| -> Vec<BridgeTransferLog> {
            entries
                .iter()
                .enumerate()
                .map(|(i, &(block_number, amount))| BridgeTransferLog {
                    block_number,
                    log_index: i as u64,
                    amount: U256::from(amount),
                })
                .collect()
        };
        let expected: u64 = today.iter().map(|&(_, amount)| amount).sum();

        let mut logs = to_logs(&yesterday);
        logs.extend(to_logs(&today));
        logs.reverse();
        prop_assert_eq!(spent_since(logs, 100), U256::from(expected));
    }

    /// The daily check accepts exactly when spent + amount fits the limit.
    #[test]
    fn daily_limit_is_inclusive(
        limit in 1u64..1_000_000,
        spent in 0u64..1_000_000,
        amount in 1u64..1_000_000,
    ) {
        let limits = BridgeLimits {
            min_per_tx: U256::from(1),
            max_per_tx: U256::from(u64::MAX),
            daily_limit: U256::from(limit),
        };
        let accepted = limits.check_daily(U256::from(spent), U256::from(amount)).is_ok();
        prop_assert_eq!(accepted, spent + amount <= limit);
    }
}
