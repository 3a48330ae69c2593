//! Conversion of raw feed price encodings into decimal ETH.

use rust_decimal::Decimal;

/// Exponent assumed for raw base-unit (wei) amounts.
pub const WEI_DECIMALS: u32 = 18;

/// Prices above this many ETH are treated as a unit mismatch: either the
/// feed reported base units without saying so, or the entry is garbage.
fn sanity_ceiling() -> Decimal {
    Decimal::new(10_000, 0)
}

/// Cascade results below this are dust, not a credible ask; the next
/// divisor is tried instead.
fn plausibility_floor() -> Decimal {
    Decimal::new(1, 6) // 0.000001
}

/// Normalize a raw price into decimal ETH.
///
/// Computes `amount / 10^decimals`, falling back to `default_decimals`
/// when the feed did not carry an exponent. Non-numeric and negative
/// amounts are rejected. Implausibly large results are run through a fixed
/// divisor cascade (base units first, then mid denominations) and dropped
/// if neither lands in a plausible range.
///
/// Deterministic and idempotent: the same input always yields the same
/// output, and an already-plausible value passes through unchanged.
pub fn normalize_price(
    amount: &str,
    decimals: Option<u32>,
    default_decimals: u32,
) -> Option<Decimal> {
    let value: Decimal = amount.trim().parse().ok()?;
    if value.is_sign_negative() {
        return None;
    }

    let price = shift_down(value, decimals.unwrap_or(default_decimals))?;
    if price <= sanity_ceiling() {
        return Some(price);
    }

    // Unit mismatch: try interpreting the value as base units, then as a
    // gwei-like mid denomination. A candidate must land between the dust
    // floor and the ceiling to be believed.
    for extra in [WEI_DECIMALS, 9] {
        if let Some(candidate) = shift_down(price, extra) {
            if candidate >= plausibility_floor() && candidate <= sanity_ceiling() {
                return Some(candidate);
            }
        }
    }

    None
}

/// Exact power-of-ten downshift: `value / 10^digits`.
fn shift_down(value: Decimal, digits: u32) -> Option<Decimal> {
    if digits == 0 {
        return Some(value);
    }
    if digits > 28 {
        // Beyond Decimal's representable scale.
        return None;
    }
    value.checked_mul(Decimal::from_i128_with_scale(1, digits))
}
