//! Error taxonomy. All synchronous, surfaced at the call site; nothing here
//! is retried internally.

use thiserror::Error;

/// Order construction violated a field-level invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("order id must be a non-empty string")]
    EmptyId,

    #[error("order quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("market orders must have price set to None")]
    MarketOrderHasPrice,

    #[error("{0:?} orders must have a positive price")]
    MissingOrInvalidPrice(crate::enums::OrderType),

    #[error("stop-limit orders must include a positive aux (limit) price")]
    MissingAuxPrice,

    #[error("trailing-stop orders must include a positive trailing_offset")]
    MissingTrailingOffset,

    #[error("iceberg orders must specify a positive display_quantity")]
    MissingDisplayQuantity,

    #[error("display_quantity ({display}) cannot exceed total quantity ({total})")]
    DisplayExceedsQuantity { display: f64, total: f64 },

    #[error("invalid TimeInForce value: {0}")]
    InvalidTimeInForce(String),

    #[error("{0}")]
    InvalidField(String),
}

/// Unified error surface for engine- and book-level operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order symbol {order_symbol} does not match book symbol {book_symbol}")]
    SymbolMismatch {
        order_symbol: String,
        book_symbol: String,
    },

    #[error("order type {0:?} is contingent and must be routed through the engine, not OrderBook::add_order")]
    NotRoutable(crate::enums::OrderType),

    #[error("no order book registered for symbol {0}")]
    UnknownSymbol(String),

    #[error("no trader registered with id {0}")]
    UnknownTrader(String),

    #[error(transparent)]
    Risk(#[from] RiskViolation),

    #[error(transparent)]
    Balance(#[from] BalanceViolation),
}

/// Risk admission failed; the order never touches the book or a
/// contingent holding list.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("risk check failed for trader {trader_id}: {kind}")]
pub struct RiskViolation {
    pub trader_id: String,
    pub kind: RiskViolationKind,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskViolationKind {
    #[error("notional {notional} exceeds max_order_notional {limit}")]
    NotionalExceeded { notional: f64, limit: f64 },

    #[error("notional {notional} exceeds risk_per_trade_fraction * equity ({allowed})")]
    RiskFractionExceeded { notional: f64, allowed: f64 },

    #[error("balance {balance} is insufficient for buy notional {notional}")]
    InsufficientBalance { balance: f64, notional: f64 },

    #[error("resulting exposure {resulting} exceeds max_exposure_per_symbol {limit}")]
    ExposureExceeded { resulting: f64, limit: f64 },
}

/// `Trader::deposit` / `Trader::withdraw` preconditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceViolation {
    #[error("deposit/withdraw amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("withdraw {amount} exceeds balance {balance}")]
    InsufficientBalance { amount: f64, balance: f64 },
}
