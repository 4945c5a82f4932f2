use serde::{Deserialize, Serialize};

use crate::{Exchange, InstrumentSummary, ReferenceType, TradingSymbol, ValidationError};

/// User-supplied baseline price. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct CustomPrice(f64);

impl CustomPrice {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::InvalidCustomPrice {
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Parses form input such as `"1250.50"`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::CustomPriceRequired);
        }

        let value = trimmed
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidCustomPrice {
                value: trimmed.to_owned(),
            })?;
        Self::new(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for CustomPrice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

/// Baseline choice for a newly added instrument.
///
/// A custom baseline cannot be expressed without its price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferencePrice {
    /// Use the last known market price at add time.
    Market,
    Custom(CustomPrice),
}

impl ReferencePrice {
    /// Builds a reference choice from raw form fields.
    pub fn from_input(
        reference_type: ReferenceType,
        custom_price: Option<&str>,
    ) -> Result<Self, ValidationError> {
        match reference_type {
            ReferenceType::Market => Ok(Self::Market),
            ReferenceType::Custom => {
                let raw = custom_price.ok_or(ValidationError::CustomPriceRequired)?;
                CustomPrice::parse(raw).map(Self::Custom)
            }
        }
    }

    pub const fn reference_type(self) -> ReferenceType {
        match self {
            Self::Market => ReferenceType::Market,
            Self::Custom(_) => ReferenceType::Custom,
        }
    }

    /// Resolves the baseline against the market price observed at add time.
    pub fn resolve(self, market_price: f64) -> f64 {
        match self {
            Self::Market => market_price,
            Self::Custom(price) => price.value(),
        }
    }
}

/// Request body for `POST /watchlists/{id}/instruments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstrument {
    pub trading_symbol: TradingSymbol,
    pub name: String,
    pub exchange: Exchange,
    pub reference_type: ReferenceType,
    pub reference_price: f64,
    pub last_price: f64,
}

impl NewInstrument {
    pub fn from_summary(summary: &InstrumentSummary, reference: ReferencePrice) -> Self {
        Self {
            trading_symbol: summary.trading_symbol.clone(),
            name: summary.name.clone(),
            exchange: summary.exchange,
            reference_type: reference.reference_type(),
            reference_price: reference.resolve(summary.last_price),
            last_price: summary.last_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_reference_requires_a_price() {
        let err = ReferencePrice::from_input(ReferenceType::Custom, None).expect_err("must fail");
        assert_eq!(err, ValidationError::CustomPriceRequired);

        let err =
            ReferencePrice::from_input(ReferenceType::Custom, Some("  ")).expect_err("must fail");
        assert_eq!(err, ValidationError::CustomPriceRequired);
    }

    #[test]
    fn custom_price_must_be_positive() {
        for raw in ["0", "-5", "abc", "NaN", "inf"] {
            let err = CustomPrice::parse(raw).expect_err("must fail");
            assert!(
                matches!(err, ValidationError::InvalidCustomPrice { .. }),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn market_reference_ignores_custom_input() {
        let reference =
            ReferencePrice::from_input(ReferenceType::Market, Some("12")).expect("market");
        assert_eq!(reference, ReferencePrice::Market);
        assert_eq!(reference.resolve(2_950.0), 2_950.0);
    }

    #[test]
    fn new_instrument_pins_custom_baseline() {
        let summary = InstrumentSummary {
            trading_symbol: TradingSymbol::parse("INFY").expect("symbol"),
            name: String::from("Infosys"),
            exchange: Exchange::Nse,
            last_price: 1_520.0,
        };
        let reference = ReferencePrice::Custom(CustomPrice::new(1_400.0).expect("price"));

        let payload = NewInstrument::from_summary(&summary, reference);
        assert_eq!(payload.reference_type, ReferenceType::Custom);
        assert_eq!(payload.reference_price, 1_400.0);
        assert_eq!(payload.last_price, 1_520.0);
    }
}
