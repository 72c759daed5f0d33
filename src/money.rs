//! Helpers for validating and storing fixed-point money amounts.
//!
//! Amounts are kept as [rust_decimal::Decimal] in memory and stored in
//! SQLite as decimal strings so that no precision is lost on the round
//! trip. Summing and balance arithmetic therefore happen in Rust, never in
//! SQL.

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;

use crate::Error;

/// Check that `amount` is a valid monetary amount: positive, with at most
/// two decimal places.
///
/// Returns the amount rescaled to exactly two decimal places so that
/// stored values always read back as e.g. "10.50" rather than "10.5".
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is zero, negative, or has
/// more than two decimal places.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }

    validate_scale(amount)
}

/// Like [validate_amount], but also accepts zero. Used for amounts that
/// track progress (e.g. how much of a goal has been saved so far).
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is negative or has more than
/// two decimal places.
pub fn validate_amount_or_zero(amount: Decimal) -> Result<Decimal, Error> {
    if amount < Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }

    validate_scale(amount)
}

fn validate_scale(amount: Decimal) -> Result<Decimal, Error> {
    if amount.scale() > 2 {
        return Err(Error::InvalidAmount(amount));
    }

    let mut amount = amount;
    amount.rescale(2);
    Ok(amount)
}

/// Read a decimal string column from a database row.
///
/// # Errors
/// Returns a [rusqlite::Error::FromSqlConversionFailure] if the column text
/// is not a valid decimal number.
pub fn decimal_from_row(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    text.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

#[cfg(test)]
mod money_tests {
    use rust_decimal::Decimal;

    use crate::Error;

    use super::{validate_amount, validate_amount_or_zero};

    #[test]
    fn accepts_positive_amount() {
        let amount = "12.30".parse::<Decimal>().unwrap();

        let result = validate_amount(amount).unwrap();

        assert_eq!(result, amount);
    }

    #[test]
    fn rescales_to_two_decimal_places() {
        let amount = "10.5".parse::<Decimal>().unwrap();

        let result = validate_amount(amount).unwrap();

        assert_eq!(result.to_string(), "10.50");
    }

    #[test]
    fn rejects_zero() {
        let result = validate_amount(Decimal::ZERO);

        assert_eq!(result, Err(Error::InvalidAmount(Decimal::ZERO)));
    }

    #[test]
    fn rejects_negative_amount() {
        let amount = "-1.00".parse::<Decimal>().unwrap();

        let result = validate_amount(amount);

        assert_eq!(result, Err(Error::InvalidAmount(amount)));
    }

    #[test]
    fn rejects_sub_cent_precision() {
        let amount = "1.001".parse::<Decimal>().unwrap();

        let result = validate_amount(amount);

        assert_eq!(result, Err(Error::InvalidAmount(amount)));
    }

    #[test]
    fn zero_is_allowed_for_progress_amounts() {
        let result = validate_amount_or_zero(Decimal::ZERO).unwrap();

        assert_eq!(result.to_string(), "0.00");
    }

    #[test]
    fn negative_progress_amounts_are_rejected() {
        let amount = "-0.01".parse::<Decimal>().unwrap();

        let result = validate_amount_or_zero(amount);

        assert_eq!(result, Err(Error::InvalidAmount(amount)));
    }
}
