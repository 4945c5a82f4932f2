//! Derived price-change metrics.
//!
//! Values are computed on every read from the current reference and last
//! price; nothing here is cached.

use serde::Serialize;

use crate::{Exchange, Instrument};

/// Absolute and relative change of a last price against a reference price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub absolute: f64,
    /// `None` when the reference price is zero or not finite.
    pub percent: Option<f64>,
    /// Zero change counts as positive.
    pub is_positive: bool,
}

impl PriceChange {
    pub fn between(reference: f64, last: f64) -> Self {
        let absolute = last - reference;
        let percent = if reference != 0.0 && reference.is_finite() {
            Some(absolute / reference * 100.0).filter(|value| value.is_finite())
        } else {
            None
        };

        Self {
            absolute,
            percent,
            is_positive: absolute >= 0.0,
        }
    }

    /// Signed absolute change with a currency prefix, e.g. `+₹20.00` or `-$3.50`.
    pub fn format_absolute(&self, exchange: Exchange) -> String {
        let sign = if self.is_positive { "+" } else { "-" };
        format!(
            "{sign}{}{:.2}",
            exchange.currency_symbol(),
            self.absolute.abs()
        )
    }

    /// Signed percent change with two decimals, or `n/a` when not computable.
    pub fn format_percent(&self) -> String {
        match self.percent {
            Some(percent) if self.is_positive => format!("+{:.2}%", percent.abs()),
            Some(percent) => format!("-{:.2}%", percent.abs()),
            None => String::from("n/a"),
        }
    }
}

/// Instrument paired with its derived metrics for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentRow {
    #[serde(flatten)]
    pub instrument: Instrument,
    pub change: PriceChange,
}

impl InstrumentRow {
    pub fn new(instrument: &Instrument) -> Self {
        Self {
            change: instrument.change(),
            instrument: instrument.clone(),
        }
    }
}

/// Formats a price with the market's currency prefix and two decimals.
pub fn format_price(exchange: Exchange, price: f64) -> String {
    format!("{}{:.2}", exchange.currency_symbol(), price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn gain_against_custom_reference() {
        let change = PriceChange::between(100.0, 120.0);
        assert_close(change.absolute, 20.0);
        assert_close(change.percent.expect("computable"), 20.0);
        assert!(change.is_positive);
    }

    #[test]
    fn loss_against_reference() {
        let change = PriceChange::between(1_000.0, 950.0);
        assert_close(change.absolute, -50.0);
        assert_close(change.percent.expect("computable"), -5.0);
        assert!(!change.is_positive);
        assert_eq!(change.format_percent(), "-5.00%");
        assert_eq!(change.format_absolute(Exchange::Nse), "-₹50.00");
    }

    #[test]
    fn zero_change_is_positive() {
        let change = PriceChange::between(42.0, 42.0);
        assert_eq!(change.absolute, 0.0);
        assert_eq!(change.percent, Some(0.0));
        assert!(change.is_positive);
        assert_eq!(change.format_percent(), "+0.00%");
    }

    #[test]
    fn zero_reference_is_not_computable() {
        let change = PriceChange::between(0.0, 10.0);
        assert_close(change.absolute, 10.0);
        assert_eq!(change.percent, None);
        assert_eq!(change.format_percent(), "n/a");
    }

    #[test]
    fn percent_matches_formula_across_prices() {
        let cases = [(250.0, 275.5), (0.5, 0.25), (64_000.0, 71_250.0), (3.0, 3.0)];
        for (reference, last) in cases {
            let change = PriceChange::between(reference, last);
            assert_close(
                change.percent.expect("computable"),
                100.0 * (last - reference) / reference,
            );
            assert_eq!(change.is_positive, last >= reference);
        }
    }

    #[test]
    fn crypto_prices_use_dollar_prefix() {
        assert_eq!(format_price(Exchange::Crypto, 64_123.456), "$64123.46");
        let change = PriceChange::between(10.0, 6.5);
        assert_eq!(change.format_absolute(Exchange::Crypto), "-$3.50");
    }
}
