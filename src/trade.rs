//! The trade record produced by a match.

use chrono::{DateTime, Utc};

use crate::enums::Side;

/// Which side of a trade a trader's order was on: resting in the book
/// (`Maker`) or crossing into it (`Taker`). Drives fee tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TradeRole {
    Maker,
    Taker,
}

/// One match between a resting order and an incoming (or triggered) order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub symbol: String,
    pub price: f64,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    pub maker_order_id: String,
    pub taker_order_id: String,
}

impl Trade {
    /// The counterparty id and role for a given side of the trade, used to
    /// route `apply_fill` calls and fee tagging to the right trader.
    pub fn role_for(&self, side: Side) -> (&str, TradeRole) {
        let order_id = match side {
            Side::Buy => &self.buy_order_id,
            Side::Sell => &self.sell_order_id,
        };
        let role = if order_id == &self.maker_order_id {
            TradeRole::Maker
        } else {
            TradeRole::Taker
        };
        (order_id, role)
    }
}
