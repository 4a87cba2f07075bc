//! Exact value units: chain-native wei (18 decimals) and marketplace nRLC (9 decimals).
//!
//! Amounts are arbitrary-precision unsigned integers in the smallest unit of
//! their denomination. Going token → native is an exact scale-up; going
//! native → token floors to 9-decimal granularity and is the only lossy step.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;
use alloy::primitives::utils::format_units;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{SdkError, SdkResult};

/// Decimals of the chain native coin (wei).
pub const NATIVE_DECIMALS: u8 = 18;
/// Decimals of the marketplace token (nRLC).
pub const TOKEN_DECIMALS: u8 = 9;
/// wei per nRLC.
pub const NATIVE_PER_TOKEN: u64 = 1_000_000_000;

/// Amount in wei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeAmount(pub U256);

/// Amount in nRLC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(pub U256);

macro_rules! amount_impls {
    ($ty:ident) => {
        impl $ty {
            pub const ZERO: Self = Self(U256::ZERO);

            pub fn from_u64(value: u64) -> Self {
                Self(U256::from(value))
            }

            pub const fn raw(self) -> U256 {
                self.0
            }

            pub fn is_zero(self) -> bool {
                self.0.is_zero()
            }

            pub fn checked_add(self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map(Self)
            }

            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                U256::from_str_radix(&raw, 10)
                    .map(Self)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

amount_impls!(NativeAmount);
amount_impls!(TokenAmount);

/// Exact scale-up nRLC → wei.
///
/// Only fails when the product overflows 256 bits.
pub fn to_native_unit(amount: TokenAmount) -> SdkResult<NativeAmount> {
    amount
        .0
        .checked_mul(U256::from(NATIVE_PER_TOKEN))
        .map(NativeAmount)
        .ok_or_else(|| SdkError::validation(format!("{amount} nRLC overflows when converted to wei")))
}

/// LOSSY: floor wei → nRLC, discarding anything below 1 nRLC.
pub fn to_token_unit(amount: NativeAmount) -> TokenAmount {
    TokenAmount(amount.0 / U256::from(NATIVE_PER_TOKEN))
}

/// Same as [`to_token_unit`] but also returns the discarded wei.
pub fn to_token_unit_with_remainder(amount: NativeAmount) -> (TokenAmount, NativeAmount) {
    let scale = U256::from(NATIVE_PER_TOKEN);
    (TokenAmount(amount.0 / scale), NativeAmount(amount.0 % scale))
}

fn native_unit_decimals(unit: &str) -> Option<u8> {
    match unit.to_ascii_lowercase().as_str() {
        "wei" => Some(0),
        "kwei" => Some(3),
        "mwei" => Some(6),
        "gwei" => Some(9),
        "szabo" => Some(12),
        "finney" => Some(15),
        "ether" | "eth" => Some(18),
        _ => None,
    }
}

fn token_unit_decimals(unit: &str) -> Option<u8> {
    match unit.to_ascii_lowercase().as_str() {
        "nrlc" => Some(0),
        "rlc" => Some(9),
        _ => None,
    }
}

/// Parse a decimal string scaled by `10^decimals` into an exact integer.
///
/// Rejects signs, exponents, empty input and any non-zero digit that would
/// fall below the smallest unit.
pub fn parse_scaled(value: &str, decimals: u8) -> SdkResult<U256> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SdkError::validation("amount is empty"));
    }
    if value.starts_with('-') {
        return Err(SdkError::validation(format!("{value} is not a positive amount")));
    }

    let (int_part, frac_part) = match value.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (value, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(SdkError::validation(format!("{value} is not a valid amount")));
    }

    let decimals = usize::from(decimals);
    let frac_trimmed = frac_part.trim_end_matches('0');
    if frac_trimmed.len() > decimals {
        return Err(SdkError::validation(format!(
            "{value} is not an integer in the smallest unit ({decimals} decimals max)"
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    digits.push_str(frac_trimmed);
    digits.extend(std::iter::repeat_n('0', decimals - frac_trimmed.len()));
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map_err(|_| SdkError::validation(format!("{value} is too large")))
}

/// Parse a native amount; a bare number is already in wei.
pub fn parse_native(value: &str, unit: Option<&str>) -> SdkResult<NativeAmount> {
    let decimals = match unit {
        None => 0,
        Some(unit) => native_unit_decimals(unit)
            .ok_or_else(|| SdkError::validation(format!("unsupported native unit {unit}")))?,
    };
    parse_scaled(value, decimals).map(NativeAmount)
}

/// Parse a token amount; a bare number is already in nRLC.
pub fn parse_token(value: &str, unit: Option<&str>) -> SdkResult<TokenAmount> {
    let decimals = match unit {
        None => 0,
        Some(unit) => token_unit_decimals(unit)
            .ok_or_else(|| SdkError::validation(format!("unsupported token unit {unit}")))?,
    };
    parse_scaled(value, decimals).map(TokenAmount)
}

/// Split `"1.5 RLC"` into `("1.5", Some("RLC"))`.
pub fn split_amount(input: &str) -> SdkResult<(&str, Option<&str>)> {
    let mut parts = input.split_whitespace();
    let value = parts
        .next()
        .ok_or_else(|| SdkError::validation("amount is empty"))?;
    let unit = parts.next();
    if parts.next().is_some() {
        return Err(SdkError::validation(format!("{input} is not an amount")));
    }
    Ok((value, unit))
}

/// Human rendering in RLC.
pub fn format_token(amount: TokenAmount) -> String {
    format_units(amount.0, TOKEN_DECIMALS).map_or_else(|_| amount.to_string(), trim_decimal)
}

/// Human rendering in ether.
pub fn format_native(amount: NativeAmount) -> String {
    format_units(amount.0, NATIVE_DECIMALS).map_or_else(|_| amount.to_string(), trim_decimal)
}

fn trim_decimal(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

impl FromStr for TokenAmount {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_amount(s)?;
        parse_token(value, unit)
    }
}

impl FromStr for NativeAmount {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_amount(s)?;
        parse_native(value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_to_native_is_exact() {
        let wei = to_native_unit(TokenAmount::from_u64(5)).unwrap();
        assert_eq!(wei, NativeAmount::from_u64(5_000_000_000));
    }

    #[test]
    fn test_native_to_token_floors() {
        let (token, rest) = to_token_unit_with_remainder(NativeAmount::from_u64(1_999_999_999));
        assert_eq!(token, TokenAmount::from_u64(1));
        assert_eq!(rest, NativeAmount::from_u64(999_999_999));
        assert_eq!(to_token_unit(NativeAmount::from_u64(999)), TokenAmount::ZERO);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_token("1.5", Some("RLC")).unwrap(), TokenAmount::from_u64(1_500_000_000));
        assert_eq!(parse_token("42", None).unwrap(), TokenAmount::from_u64(42));
        assert_eq!(parse_native("2", Some("gwei")).unwrap(), NativeAmount::from_u64(2_000_000_000));
        assert_eq!(
            parse_native("1", Some("ether")).unwrap().raw(),
            U256::from(10u64).pow(U256::from(18))
        );
        assert_eq!(parse_token("0.000000001", Some("rlc")).unwrap(), TokenAmount::from_u64(1));
        assert_eq!(parse_token("1.10", Some("nRLC")).is_err(), true);
        assert_eq!(parse_token("1.00", Some("nRLC")).unwrap(), TokenAmount::from_u64(1));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["-1", "", "1e9", "abc", "1.2.3", ".", "0x10"] {
            let err = parse_token(bad, None).unwrap_err();
            assert_eq!(err.name(), "ValidationError", "input {bad:?}");
        }
        assert!(parse_token("1", Some("usd")).is_err());
        assert!(parse_native("0.5", Some("wei")).is_err());
    }

    #[test]
    fn test_split_and_from_str() {
        assert_eq!(split_amount("1.5 RLC").unwrap(), ("1.5", Some("RLC")));
        assert_eq!(split_amount("7").unwrap(), ("7", None));
        assert!(split_amount("1 RLC extra").is_err());
        let amount: TokenAmount = "2 RLC".parse().unwrap();
        assert_eq!(amount, TokenAmount::from_u64(2_000_000_000));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_token(TokenAmount::from_u64(1_500_000_000)), "1.5");
        assert_eq!(format_token(TokenAmount::from_u64(3_000_000_000)), "3");
        assert_eq!(format_native(NativeAmount::from_u64(1)), "0.000000000000000001");
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let json = serde_json::to_string(&TokenAmount::from_u64(12)).unwrap();
        assert_eq!(json, "\"12\"");
        let back: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TokenAmount::from_u64(12));
    }
}
