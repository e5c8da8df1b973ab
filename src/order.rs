//! Order construction, validation, and the order factory.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;

use crate::enums::{OrderType, Side, TimeInForce};
use crate::error::ValidationError;

/// An order. Identity (`id`, `type`, `side`) is fixed at construction;
/// `quantity` and the trailing/iceberg tracking fields mutate as the order
/// lives in the book or in one of the engine's contingent collections.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
    pub price: Option<f64>,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    pub symbol: Option<String>,
    pub trader_id: Option<String>,
    pub tif: TimeInForce,
    /// Limit price for STOP_LIMIT; running peak/trough for TRAILING_STOP.
    pub aux_price: Option<f64>,
    /// Positive absolute offset for TRAILING_STOP.
    pub trailing_offset: Option<f64>,
    /// Visible slice size for ICEBERG; must not exceed `quantity`.
    pub display_quantity: Option<f64>,
}

/// Coerces a naive (timezone-less) timestamp to UTC.
pub fn coerce_naive_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
}

#[allow(clippy::too_many_arguments)]
impl Order {
    /// Validates and constructs an order. This is the single path every
    /// `OrderFactory` constructor and `from_map` funnel through.
    pub fn new(
        id: impl Into<String>,
        order_type: OrderType,
        side: Side,
        price: Option<f64>,
        quantity: f64,
        timestamp: DateTime<Utc>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
        aux_price: Option<f64>,
        trailing_offset: Option<f64>,
        display_quantity: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !(quantity > 0.0) {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }

        match order_type {
            OrderType::Market => {
                if price.is_some() {
                    return Err(ValidationError::MarketOrderHasPrice);
                }
            }
            OrderType::Limit | OrderType::StopLoss => {
                if !price.is_some_and(|p| p > 0.0) {
                    return Err(ValidationError::MissingOrInvalidPrice(order_type));
                }
            }
            OrderType::StopLimit => {
                if !price.is_some_and(|p| p > 0.0) {
                    return Err(ValidationError::MissingOrInvalidPrice(order_type));
                }
                if !aux_price.is_some_and(|p| p > 0.0) {
                    return Err(ValidationError::MissingAuxPrice);
                }
            }
            OrderType::TrailingStop => {
                if !trailing_offset.is_some_and(|o| o > 0.0) {
                    return Err(ValidationError::MissingTrailingOffset);
                }
                // price may be None (initialized later from last trade price) or
                // an explicit initial stop; both are acceptable here.
            }
            OrderType::Iceberg => {
                if !price.is_some_and(|p| p > 0.0) {
                    return Err(ValidationError::MissingOrInvalidPrice(order_type));
                }
                match display_quantity {
                    Some(d) if d > 0.0 => {
                        if d > quantity {
                            return Err(ValidationError::DisplayExceedsQuantity {
                                display: d,
                                total: quantity,
                            });
                        }
                    }
                    _ => return Err(ValidationError::MissingDisplayQuantity),
                }
            }
        }

        Ok(Order {
            id,
            order_type,
            side,
            price,
            quantity,
            timestamp,
            symbol,
            trader_id,
            tif,
            aux_price,
            trailing_offset,
            display_quantity,
        })
    }

    pub fn is_filled(&self) -> bool {
        self.quantity <= 0.0
    }
}

/// Factory for constructing orders — one method per order type, plus a
/// dictionary-ingestion path for externally-sourced payloads.
pub struct OrderFactory;

impl OrderFactory {
    pub fn create_limit(
        id: impl Into<String>,
        side: Side,
        price: f64,
        quantity: f64,
        timestamp: Option<DateTime<Utc>>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
    ) -> Result<Order, ValidationError> {
        Order::new(
            id,
            OrderType::Limit,
            side,
            Some(price),
            quantity,
            timestamp.unwrap_or_else(Utc::now),
            symbol,
            trader_id,
            tif,
            None,
            None,
            None,
        )
    }

    pub fn create_market(
        id: impl Into<String>,
        side: Side,
        quantity: f64,
        timestamp: Option<DateTime<Utc>>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
    ) -> Result<Order, ValidationError> {
        Order::new(
            id,
            OrderType::Market,
            side,
            None,
            quantity,
            timestamp.unwrap_or_else(Utc::now),
            symbol,
            trader_id,
            tif,
            None,
            None,
            None,
        )
    }

    pub fn create_stop_loss(
        id: impl Into<String>,
        side: Side,
        stop_price: f64,
        quantity: f64,
        timestamp: Option<DateTime<Utc>>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
    ) -> Result<Order, ValidationError> {
        Order::new(
            id,
            OrderType::StopLoss,
            side,
            Some(stop_price),
            quantity,
            timestamp.unwrap_or_else(Utc::now),
            symbol,
            trader_id,
            tif,
            None,
            None,
            None,
        )
    }

    pub fn create_stop_limit(
        id: impl Into<String>,
        side: Side,
        stop_price: f64,
        limit_price: f64,
        quantity: f64,
        timestamp: Option<DateTime<Utc>>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
    ) -> Result<Order, ValidationError> {
        Order::new(
            id,
            OrderType::StopLimit,
            side,
            Some(stop_price),
            quantity,
            timestamp.unwrap_or_else(Utc::now),
            symbol,
            trader_id,
            tif,
            Some(limit_price),
            None,
            None,
        )
    }

    pub fn create_trailing_stop(
        id: impl Into<String>,
        side: Side,
        trailing_offset: f64,
        quantity: f64,
        initial_price: Option<f64>,
        timestamp: Option<DateTime<Utc>>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
    ) -> Result<Order, ValidationError> {
        Order::new(
            id,
            OrderType::TrailingStop,
            side,
            initial_price,
            quantity,
            timestamp.unwrap_or_else(Utc::now),
            symbol,
            trader_id,
            tif,
            None,
            Some(trailing_offset),
            None,
        )
    }

    pub fn create_iceberg(
        id: impl Into<String>,
        side: Side,
        price: f64,
        total_quantity: f64,
        display_quantity: f64,
        timestamp: Option<DateTime<Utc>>,
        symbol: Option<String>,
        trader_id: Option<String>,
        tif: TimeInForce,
    ) -> Result<Order, ValidationError> {
        Order::new(
            id,
            OrderType::Iceberg,
            side,
            Some(price),
            total_quantity,
            timestamp.unwrap_or_else(Utc::now),
            symbol,
            trader_id,
            tif,
            None,
            None,
            Some(display_quantity),
        )
    }

    /// Builds an order from a loosely-typed map, as an external gateway
    /// (HTTP request body, CLI flags) would hand the engine one.
    pub fn from_map(values: &HashMap<String, serde_json::Value>) -> Result<Order, ValidationError> {
        fn get_str(values: &HashMap<String, serde_json::Value>, key: &str) -> Option<String> {
            values.get(key).and_then(|v| v.as_str()).map(str::to_string)
        }
        fn get_f64(values: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
            values.get(key).and_then(|v| v.as_f64())
        }

        let id = get_str(values, "id").ok_or(ValidationError::EmptyId)?;
        let order_type = match get_str(values, "type").as_deref() {
            Some("MARKET") => OrderType::Market,
            Some("LIMIT") | None => OrderType::Limit,
            Some("STOP_LOSS") => OrderType::StopLoss,
            Some("STOP_LIMIT") => OrderType::StopLimit,
            Some("TRAILING_STOP") => OrderType::TrailingStop,
            Some("ICEBERG") => OrderType::Iceberg,
            Some(other) => return Err(ValidationError::InvalidField(format!("unsupported order type: {other}"))),
        };
        let side = match get_str(values, "side").as_deref() {
            Some("BUY") => Side::Buy,
            Some("SELL") => Side::Sell,
            other => return Err(ValidationError::InvalidField(format!("unsupported order side: {other:?}"))),
        };
        let quantity = get_f64(values, "quantity").ok_or(ValidationError::NonPositiveQuantity(0.0))?;
        let price = get_f64(values, "price");
        let symbol = get_str(values, "symbol");
        let trader_id = get_str(values, "trader_id");
        let tif = match get_str(values, "tif") {
            Some(raw) => TimeInForce::from_str(&raw)?,
            None => TimeInForce::default(),
        };
        let aux_price = get_f64(values, "aux_price");
        let trailing_offset = get_f64(values, "trailing_offset");
        let display_quantity = get_f64(values, "display_quantity");

        Order::new(
            id,
            order_type,
            side,
            price,
            quantity,
            Utc::now(),
            symbol,
            trader_id,
            tif,
            aux_price,
            trailing_offset,
            display_quantity,
        )
    }
}
