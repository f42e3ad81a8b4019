//! Currency normalization and scaling.
//!
//! Maps the currency tokens users actually type to a closed set of canonical
//! currencies. Dollar and euro amounts are recorded as 100 ruble-units per
//! unit; this is a fixed business rule of the shared wallet, not an exchange
//! rate.

use super::errors::LedgerError;

/// A recognized canonical currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Ruble,
    Dollar,
    Euro,
}

impl Currency {
    /// Normalize a user-typed currency token. Tokens are matched exactly as
    /// users write them (case-sensitive); an unrecognized token is a
    /// validation failure, never a silent default.
    pub fn from_token(token: &str) -> Result<Currency, LedgerError> {
        match token {
            "" => Err(LedgerError::MissingCurrency),
            "руб" | "рубль" | "рублей" | "рубли" => Ok(Currency::Ruble),
            "$" | "доллар" | "долларов" => Ok(Currency::Dollar),
            "€" | "евро" => Ok(Currency::Euro),
            other => Err(LedgerError::InvalidCurrency(other.to_string())),
        }
    }

    /// Ruble-units recorded per unit of this currency.
    pub fn scale(&self) -> f64 {
        match self {
            Currency::Ruble => 1.0,
            Currency::Dollar | Currency::Euro => 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruble_family_tokens() {
        for token in ["руб", "рубль", "рублей", "рубли"] {
            assert_eq!(Currency::from_token(token).unwrap(), Currency::Ruble);
        }
    }

    #[test]
    fn test_dollar_family_tokens() {
        for token in ["$", "доллар", "долларов"] {
            assert_eq!(Currency::from_token(token).unwrap(), Currency::Dollar);
        }
    }

    #[test]
    fn test_euro_family_tokens() {
        for token in ["€", "евро"] {
            assert_eq!(Currency::from_token(token).unwrap(), Currency::Euro);
        }
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert!(matches!(
            Currency::from_token("РУБ"),
            Err(LedgerError::InvalidCurrency(_))
        ));
        assert!(matches!(
            Currency::from_token("Евро"),
            Err(LedgerError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_unrecognized_token_is_rejected() {
        assert!(matches!(
            Currency::from_token("биткоин"),
            Err(LedgerError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_empty_token_means_currency_missing() {
        assert!(matches!(Currency::from_token(""), Err(LedgerError::MissingCurrency)));
    }

    #[test]
    fn test_dollar_and_euro_record_one_hundred_ruble_units_per_unit() {
        // Fixed business rule: 10 dollars or euros become 1000 ruble-units,
        // 10 rubles stay 10.
        assert_eq!(10.0 * Currency::Dollar.scale(), 1000.0);
        assert_eq!(10.0 * Currency::Euro.scale(), 1000.0);
        assert_eq!(10.0 * Currency::Ruble.scale(), 10.0);
    }
}
