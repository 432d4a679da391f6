// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between smallest-unit integers and human decimal strings.

use studydao_core::{StudyDaoError, Wei};

/// Fixed decimal scale of the staking token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Render `value` scaled down by `10^decimals`.
///
/// Always includes a fractional part and trims trailing zeros from it:
/// `1000000000000000000` → `"1.0"`, `500000000000000000` → `"0.5"`.
pub fn format_units(value: u128, decimals: u32) -> String {
    let base = 10u128.pow(decimals);
    let whole = value / base;
    let frac = value % base;
    if decimals == 0 {
        return whole.to_string();
    }
    if frac == 0 {
        return format!("{whole}.0");
    }
    let digits = format!("{frac:0width$}", width = decimals as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Parse a decimal string into smallest units at `10^decimals`.
pub fn parse_units(input: &str, decimals: u32) -> Result<u128, StudyDaoError> {
    let invalid = |why: &str| StudyDaoError::Validation(format!("invalid amount `{input}`: {why}"));

    let s = input.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected digits with an optional decimal point"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid("too many decimal places"));
    }

    let base = 10u128.pow(decimals);
    let whole_value = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| invalid("too large"))?
    };
    let frac_value = if frac.is_empty() {
        0
    } else {
        let scale = 10u128.pow(decimals - frac.len() as u32);
        frac.parse::<u128>().map_err(|_| invalid("too large"))? * scale
    };

    whole_value
        .checked_mul(base)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| invalid("too large"))
}

/// [`format_units`] at the token's 18-decimal scale.
pub fn format_token(value: Wei) -> String {
    format_units(value, TOKEN_DECIMALS)
}

/// [`parse_units`] at the token's 18-decimal scale.
pub fn parse_token(input: &str) -> Result<Wei, StudyDaoError> {
    parse_units(input, TOKEN_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn formats_like_format_ether() {
        assert_eq!(format_token(0), "0.0");
        assert_eq!(format_token(1), "0.000000000000000001");
        assert_eq!(format_token(ONE), "1.0");
        assert_eq!(format_token(ONE / 2), "0.5");
        assert_eq!(format_token(123 * ONE + 45 * ONE / 100), "123.45");
    }

    #[test]
    fn parses_decimal_amounts() {
        assert_eq!(parse_token("1").unwrap(), ONE);
        assert_eq!(parse_token("1.0").unwrap(), ONE);
        assert_eq!(parse_token("0.5").unwrap(), ONE / 2);
        assert_eq!(parse_token(".5").unwrap(), ONE / 2);
        assert_eq!(parse_token(" 10 ").unwrap(), 10 * ONE);
    }

    #[test]
    fn rejects_bad_amounts() {
        for bad in ["", ".", "-1", "1e18", "abc", "1.2.3", "0.0000000000000000001"] {
            assert!(parse_token(bad).is_err(), "`{bad}` should be rejected");
        }
        assert!(parse_token("340282366920938463464").is_err());
    }

    proptest! {
        #[test]
        fn format_then_parse_round_trips(value in any::<u128>()) {
            prop_assert_eq!(parse_token(&format_token(value)).unwrap(), value);
        }

        #[test]
        fn round_trips_at_other_scales(value in any::<u64>(), decimals in 0u32..=18) {
            let value = u128::from(value);
            prop_assert_eq!(parse_units(&format_units(value, decimals), decimals).unwrap(), value);
        }
    }
}
