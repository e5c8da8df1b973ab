//! Typed value objects shared across orders, the book, and the engine.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Discriminates plain book orders from the contingent types the engine
/// holds outside the book (stop/stop-limit/trailing/iceberg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopLoss,
    StopLimit,
    TrailingStop,
    Iceberg,
}

impl OrderType {
    /// The contingent types never rest directly in an `OrderBook`; they live
    /// in the engine's holding lists until triggered/sliced into a plain
    /// order. Handing one to `OrderBook::add_order` is rejected as `NotRoutable`.
    pub fn is_contingent(self) -> bool {
        matches!(
            self,
            OrderType::StopLoss | OrderType::StopLimit | OrderType::TrailingStop | OrderType::Iceberg
        )
    }
}

/// Time-in-force policy. Defaults to `Gtc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum TimeInForce {
    #[default]
    Gtc,
    Ioc,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TimeInForce {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::Gtc),
            "IOC" => Ok(TimeInForce::Ioc),
            other => Err(ValidationError::InvalidTimeInForce(other.to_string())),
        }
    }
}
