use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uppercase ticker identifying a tradable asset (e.g. "AAPL")
pub type Symbol = String;

/// A price observation fetched from the upstream source
///
/// Only constructible with a strictly positive price; a missing or non-positive
/// upstream price is represented as `None`, never as a zero-valued quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Quote {
    #[schema(value_type = String, example = "189.98")]
    price: Decimal,
    observed_at: DateTime<Utc>,
}

impl Quote {
    /// Build a quote, rejecting non-positive prices
    pub fn new(price: Decimal, observed_at: DateTime<Utc>) -> Option<Self> {
        if price > Decimal::ZERO {
            Some(Self { price, observed_at })
        } else {
            None
        }
    }

    /// Build a quote observed now
    pub fn now(price: Decimal) -> Option<Self> {
        Self::new(price, Utc::now())
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_requires_positive_price() {
        assert!(Quote::now(dec!(189.98)).is_some());
        assert!(Quote::now(dec!(0)).is_none());
        assert!(Quote::now(dec!(-1.5)).is_none());
    }

    #[test]
    fn test_quote_accessors() {
        let at = Utc::now();
        let quote = Quote::new(dec!(42.5), at).unwrap();

        assert_eq!(quote.price(), dec!(42.5));
        assert_eq!(quote.observed_at(), at);
    }
}
