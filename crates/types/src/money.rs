//! Monetary amounts and the canonical amount codec.
//!
//! The ledger treats amount strings as authoritative, so every amount that
//! leaves this process is first reduced to exactly two fractional digits by
//! truncating toward zero. Rounding to nearest is never used: a single cent
//! of drift between what was sent and what was recorded breaks balance
//! reconciliation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits on the wire.
pub const AMOUNT_SCALE: u32 = 2;

/// Currencies accepted by the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "RUB")]
    Rub,
}

impl Currency {
    /// ISO code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
        }
    }

    /// Number of minor-unit digits (cents).
    pub fn minor_unit_digits(&self) -> u32 {
        AMOUNT_SCALE
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "RUB" => Ok(Currency::Rub),
            _ => Err(AmountError::UnknownCurrency(s.to_string())),
        }
    }
}

/// Errors produced while encoding an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is not a number: {0:?}")]
    NotANumber(String),

    #[error("Amount is not finite: {0}")]
    NotFinite(String),

    #[error("Amount is out of range: {0}")]
    OutOfRange(String),

    #[error("Unknown currency: {0:?}")]
    UnknownCurrency(String),
}

/// Truncate toward zero, keeping exactly [`AMOUNT_SCALE`] fractional digits.
pub fn truncate_amount(amount: Decimal) -> Decimal {
    let mut truncated = amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero);
    truncated.rescale(AMOUNT_SCALE);
    if truncated.is_zero() {
        // -0.001 truncates to zero; never emit "-0.00".
        truncated.set_sign_positive(true);
    }
    truncated
}

/// Parse arbitrary decimal text, including exponent notation.
pub fn parse_decimal(input: &str) -> Result<Decimal, AmountError> {
    let text = input.trim();
    let lowered = text.to_ascii_lowercase();
    let unsigned = lowered.trim_start_matches(['+', '-']);
    if matches!(unsigned, "inf" | "infinity" | "nan") {
        return Err(AmountError::NotFinite(input.to_string()));
    }

    let parsed = if lowered.contains('e') {
        Decimal::from_scientific(&lowered)
    } else {
        Decimal::from_str(text)
    };
    parsed.map_err(|_| {
        if is_decimal_notation(text) {
            AmountError::OutOfRange(input.to_string())
        } else {
            AmountError::NotANumber(input.to_string())
        }
    })
}

/// Optional sign, digits with at most one point, optional exponent.
fn is_decimal_notation(text: &str) -> bool {
    fn digits(s: &str) -> bool {
        s.bytes().all(|b| b.is_ascii_digit())
    }

    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mantissa_ok =
        !(int_part.is_empty() && frac_part.is_empty()) && digits(int_part) && digits(frac_part);
    let exponent_ok = exponent.map_or(true, |exponent| {
        let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        !exponent.is_empty() && digits(exponent)
    });
    mantissa_ok && exponent_ok
}

/// Encode decimal text as the canonical wire amount.
///
/// ```
/// use ledger_types::encode_amount;
///
/// assert_eq!(encode_amount("10.999").unwrap(), "10.99");
/// assert_eq!(encode_amount("-10.999").unwrap(), "-10.99");
/// assert_eq!(encode_amount("25").unwrap(), "25.00");
/// ```
pub fn encode_amount(input: &str) -> Result<String, AmountError> {
    parse_decimal(input).map(|d| truncate_amount(d).to_string())
}

/// A signed amount with exactly two fractional digits and a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Create from a decimal, truncating excess precision.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: truncate_amount(amount),
            currency,
        }
    }

    /// Create from whole currency units.
    pub fn from_units(units: i64, currency: Currency) -> Self {
        Self::new(Decimal::from(units), currency)
    }

    /// Parse decimal text.
    pub fn parse(input: &str, currency: Currency) -> Result<Self, AmountError> {
        parse_decimal(input).map(|d| Self::new(d, currency))
    }

    /// Create from a float, keeping every bit of its binary value before truncating.
    ///
    /// `0.29_f64` is really `0.28999...`, so it encodes as `"0.28"`.
    pub fn from_f64(value: f64, currency: Currency) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite(value.to_string()));
        }
        Decimal::from_f64_retain(value)
            .map(|d| Self::new(d, currency))
            .ok_or_else(|| AmountError::OutOfRange(value.to_string()))
    }

    /// The truncated decimal amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Canonical wire string, e.g. `"1000000.00"`.
    pub fn to_wire_string(&self) -> String {
        self.amount.to_string()
    }

    /// Amount in minor units (cents).
    pub fn to_minor_units(&self) -> Result<i64, AmountError> {
        let mut minor = self.amount;
        minor.rescale(self.currency.minor_unit_digits());
        i64::try_from(minor.mantissa())
            .map_err(|_| AmountError::OutOfRange(self.amount.to_string()))
    }

    /// Add a signed number of whole units.
    pub fn checked_add_units(&self, units: i64) -> Option<Self> {
        self.amount
            .checked_add(Decimal::from(units))
            .map(|amount| Self::new(amount, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_toward_zero() {
        assert_eq!(encode_amount("10.999").unwrap(), "10.99");
        assert_eq!(encode_amount("10.995").unwrap(), "10.99");
        assert_eq!(encode_amount("0.019").unwrap(), "0.01");
        assert_eq!(encode_amount("-3.14159").unwrap(), "-3.14");
        assert_eq!(encode_amount("-0.009").unwrap(), "0.00");
    }

    #[test]
    fn test_pads_to_two_digits() {
        assert_eq!(encode_amount("7").unwrap(), "7.00");
        assert_eq!(encode_amount("7.5").unwrap(), "7.50");
        assert_eq!(encode_amount(" 1000000 ").unwrap(), "1000000.00");
        assert_eq!(encode_amount("1.5e3").unwrap(), "1500.00");
        assert_eq!(encode_amount("1.23456E1").unwrap(), "12.34");
    }

    #[test]
    fn test_truncation_law_matches_digit_cut() {
        // Cutting the text after the 2nd fractional digit must agree with the codec.
        let inputs = [
            "0.001", "12.3456", "99.999999", "-45.678", "123456789.98765", "0.10", "5.0000001",
        ];
        for input in inputs {
            let (int_part, frac_part) = input.split_once('.').unwrap();
            let cut = format!("{}.{}", int_part, &frac_part[..2]);
            let expected = encode_amount(&cut).unwrap();
            assert_eq!(encode_amount(input).unwrap(), expected, "input {input}");
        }
    }

    #[test]
    fn test_codec_is_idempotent() {
        for input in ["10.999", "-0.5", "3", "1e-5", "98765.4321"] {
            let once = encode_amount(input).unwrap();
            let twice = encode_amount(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_rejects_non_numeric_input() {
        assert!(matches!(
            encode_amount("ten"),
            Err(AmountError::NotANumber(_))
        ));
        assert!(matches!(encode_amount(""), Err(AmountError::NotANumber(_))));
        assert!(matches!(encode_amount("NaN"), Err(AmountError::NotFinite(_))));
        assert!(matches!(
            encode_amount("-Infinity"),
            Err(AmountError::NotFinite(_))
        ));
        assert!(matches!(
            Money::from_f64(f64::INFINITY, Currency::Usd),
            Err(AmountError::NotFinite(_))
        ));
        assert!(matches!(
            Money::from_f64(f64::NAN, Currency::Usd),
            Err(AmountError::NotFinite(_))
        ));
    }

    #[test]
    fn test_numbers_beyond_decimal_range_are_out_of_range() {
        for input in ["1e30", "123456789012345678901234567890", "-9E+40"] {
            assert!(
                matches!(encode_amount(input), Err(AmountError::OutOfRange(_))),
                "input {input}"
            );
        }
        for input in ["1e", "1.2.3", "e5", "--1", "1x"] {
            assert!(
                matches!(encode_amount(input), Err(AmountError::NotANumber(_))),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_float_input_uses_exact_binary_value() {
        let money = Money::from_f64(0.29, Currency::Usd).unwrap();
        assert_eq!(money.to_wire_string(), "0.28");

        let money = Money::from_f64(25.0, Currency::Usd).unwrap();
        assert_eq!(money.to_wire_string(), "25.00");
    }

    #[test]
    fn test_minor_units_and_arithmetic() {
        let money = Money::parse("1000000.019", Currency::Usd).unwrap();
        assert_eq!(money.to_minor_units().unwrap(), 100_000_001);

        let after = Money::from_units(1_000_000, Currency::Usd)
            .checked_add_units(-20)
            .unwrap();
        assert_eq!(after.to_wire_string(), "999980.00");
        assert_eq!(after.to_minor_units().unwrap(), 99_998_000);
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(Currency::Rub.to_string(), "RUB");
        assert!("GBP".parse::<Currency>().is_err());
        assert_eq!(serde_json::to_string(&Currency::Eur).unwrap(), "\"EUR\"");
    }
}
