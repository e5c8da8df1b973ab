//! A single-process limit order matching engine: price-time and pro-rata
//! matching, contingent order types, per-trader accounting, and a small
//! embedded event bus for market-data-style subscribers.

pub mod book;
pub mod engine;
pub mod enums;
pub mod error;
pub mod events;
pub mod order;
pub mod trade;
pub mod trader;

pub use book::OrderBook;
pub use engine::{MatchingEngine, MatchingStrategy};
pub use enums::{OrderType, Side, TimeInForce};
pub use error::{BalanceViolation, EngineError, RiskViolation, RiskViolationKind, ValidationError};
pub use events::{EventBus, HandlerId};
pub use order::{Order, OrderFactory};
pub use trade::{Trade, TradeRole};
pub use trader::{AccountPnl, PnlReport, PositionReport, Trader};
