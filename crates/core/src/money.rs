//! Decimal money helpers.
//!
//! All money values are `rust_decimal::Decimal`; floats never touch prices.
//! Arithmetic results are normalized to the currency's minor unit (two
//! decimal places) with half-away-from-zero rounding.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Number of decimal places of the currency's minor unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Round a money amount to the currency's minor unit.
pub fn to_minor_unit(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MINOR_UNIT_SCALE);
    rounded
}

/// Validate a price/discount style amount: must be `>= 0`.
pub fn non_negative(field: &str, amount: Decimal) -> DomainResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::validation(format!(
            "{field} must not be negative"
        )));
    }
    Ok(to_minor_unit(amount))
}
