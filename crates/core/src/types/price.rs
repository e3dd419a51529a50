//! Money helpers for a single-currency (PKR) storefront.
//!
//! All amounts are [`Decimal`] rupees. Catalog prices are whole rupees in
//! practice, but arithmetic stays in `Decimal` so nothing is lost if the
//! merchant ever prices in paisa.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Flat shipping fee added to every order total, in rupees.
///
/// Policy constant - change it here and the checkout totals follow.
pub const SHIPPING_FEE_RUPEES: u32 = 1000;

/// The shipping fee as a [`Decimal`] amount.
#[must_use]
pub fn shipping_fee() -> Decimal {
    Decimal::from(SHIPPING_FEE_RUPEES)
}

/// Format an amount for display, e.g. `PKR 3,500` or `PKR 1,250.50`.
///
/// Whole-rupee amounts drop the fraction; anything else shows two decimal
/// places. Thousands are grouped with commas.
#[must_use]
pub fn format_pkr(amount: Decimal) -> String {
    let normalized = amount.normalize();
    let body = if normalized.fract().is_zero() {
        group_thousands(&normalized.trunc().to_string())
    } else {
        let rounded = normalized.round_dp(2);
        let fraction = (rounded.fract().abs() * Decimal::from(100))
            .trunc()
            .to_u32()
            .unwrap_or(0);
        format!(
            "{}.{fraction:02}",
            group_thousands(&rounded.trunc().to_string())
        )
    };
    format!("PKR {body}")
}

/// Insert comma separators into a (possibly signed) integer string.
fn group_thousands(digits: &str) -> String {
    let (sign, digits) = digits
        .strip_prefix('-')
        .map_or(("", digits), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_fee() {
        assert_eq!(shipping_fee(), Decimal::from(1000));
    }

    #[test]
    fn test_format_whole_amounts() {
        assert_eq!(format_pkr(Decimal::from(0)), "PKR 0");
        assert_eq!(format_pkr(Decimal::from(999)), "PKR 999");
        assert_eq!(format_pkr(Decimal::from(3500)), "PKR 3,500");
        assert_eq!(format_pkr(Decimal::from(1_250_000)), "PKR 1,250,000");
    }

    #[test]
    fn test_format_fractional_amounts() {
        let amount: Decimal = "1250.5".parse().unwrap();
        assert_eq!(format_pkr(amount), "PKR 1,250.50");

        let amount: Decimal = "99.99".parse().unwrap();
        assert_eq!(format_pkr(amount), "PKR 99.99");
    }

    #[test]
    fn test_format_trailing_zero_fraction_collapses() {
        let amount: Decimal = "3500.00".parse().unwrap();
        assert_eq!(format_pkr(amount), "PKR 3,500");
    }
}
