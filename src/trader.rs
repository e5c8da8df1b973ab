//! Trader accounting: cash, positions, cost basis, and realized/unrealized
//! P&L. Fill application uses weighted-average cost basis, realizes P&L on
//! a short cover, and resets the average on a long/short flip.

use std::collections::HashMap;

use crate::enums::Side;
use crate::error::BalanceViolation;

/// A single trader's book of cash, positions, and P&L history.
#[derive(Debug, Clone, PartialEq)]
pub struct Trader {
    pub id: String,
    pub balance: f64,
    /// Signed quantity per symbol: positive is long, negative is short.
    pub positions: HashMap<String, f64>,
    /// Weighted-average cost basis per symbol.
    pub avg_price: HashMap<String, f64>,
    /// Last mark price observed per symbol, for unrealized P&L.
    pub unrealized_prices: HashMap<String, f64>,
    pub realized_pnl: f64,
    pub realized_by_symbol: HashMap<String, f64>,
    pub order_history: Vec<String>,

    // Risk admission configuration.
    pub max_order_notional: Option<f64>,
    pub risk_per_trade_fraction: Option<f64>,
    pub max_exposure_per_symbol: Option<f64>,
    /// Reserved for a future daily-loss circuit breaker; not enforced by
    /// `MatchingEngine::submit_order` today.
    pub daily_loss_limit: Option<f64>,
}

impl Trader {
    pub fn new(id: impl Into<String>, balance: f64) -> Self {
        Trader {
            id: id.into(),
            balance,
            positions: HashMap::new(),
            avg_price: HashMap::new(),
            unrealized_prices: HashMap::new(),
            realized_pnl: 0.0,
            realized_by_symbol: HashMap::new(),
            order_history: Vec::new(),
            max_order_notional: None,
            risk_per_trade_fraction: None,
            max_exposure_per_symbol: None,
            daily_loss_limit: None,
        }
    }

    pub fn deposit(&mut self, amount: f64) -> Result<(), BalanceViolation> {
        if !(amount > 0.0) {
            return Err(BalanceViolation::NonPositiveAmount(amount));
        }
        self.balance += amount;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: f64) -> Result<(), BalanceViolation> {
        if !(amount > 0.0) {
            return Err(BalanceViolation::NonPositiveAmount(amount));
        }
        if amount > self.balance {
            return Err(BalanceViolation::InsufficientBalance {
                amount,
                balance: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn record_order(&mut self, order_id: impl Into<String>) {
        self.order_history.push(order_id.into());
    }

    /// Updates the last-seen mark price for a symbol, used by
    /// `unrealized_pnl`/`total_equity`.
    pub fn mark_price(&mut self, symbol: &str, price: f64) {
        self.unrealized_prices.insert(symbol.to_string(), price);
    }

    /// Applies a fill to this trader's position and cash. `fee` is always
    /// debited regardless of side.
    ///
    /// - A buy into a flat or long position grows the position and folds the
    ///   new quantity into the weighted-average cost basis.
    /// - A buy that covers a short realizes `(avg_price - fill_price) *
    ///   covered_qty`; if the buy overshoots the short, the position flips
    ///   long and the average resets to the fill price for the remainder.
    /// - A sell is the mirror image.
    pub fn apply_fill(&mut self, symbol: &str, side: Side, quantity: f64, price: f64, fee: f64) {
        let position = *self.positions.get(symbol).unwrap_or(&0.0);
        let avg = *self.avg_price.get(symbol).unwrap_or(&0.0);

        let (new_position, new_avg, realized) = match side {
            Side::Buy => {
                self.balance -= quantity * price + fee;
                if position >= 0.0 {
                    let new_qty = position + quantity;
                    let new_avg = if new_qty > 0.0 {
                        (avg * position + price * quantity) / new_qty
                    } else {
                        0.0
                    };
                    (new_qty, new_avg, 0.0)
                } else {
                    let cover_qty = quantity.min(-position);
                    let realized = (avg - price) * cover_qty;
                    let new_qty = position + quantity;
                    let new_avg = if new_qty > 0.0 { price } else { avg };
                    (new_qty, new_avg, realized)
                }
            }
            Side::Sell => {
                self.balance += quantity * price - fee;
                if position <= 0.0 {
                    let new_qty = position - quantity;
                    let new_avg = if new_qty < 0.0 {
                        (avg * -position + price * quantity) / -new_qty
                    } else {
                        0.0
                    };
                    (new_qty, new_avg, 0.0)
                } else {
                    let cover_qty = quantity.min(position);
                    let realized = (price - avg) * cover_qty;
                    let new_qty = position - quantity;
                    let new_avg = if new_qty < 0.0 { price } else { avg };
                    (new_qty, new_avg, realized)
                }
            }
        };

        if new_position.abs() < 1e-12 {
            self.positions.remove(symbol);
            self.avg_price.remove(symbol);
        } else {
            self.positions.insert(symbol.to_string(), new_position);
            self.avg_price.insert(symbol.to_string(), new_avg);
        }
        if realized != 0.0 {
            self.realized_pnl += realized;
            *self.realized_by_symbol.entry(symbol.to_string()).or_insert(0.0) += realized;
        }
    }

    pub fn position(&self, symbol: &str) -> f64 {
        *self.positions.get(symbol).unwrap_or(&0.0)
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self, symbol: &str) -> f64 {
        let position = self.position(symbol);
        let avg = *self.avg_price.get(symbol).unwrap_or(&0.0);
        match self.unrealized_prices.get(symbol) {
            Some(mark) => (mark - avg) * position,
            None => 0.0,
        }
    }

    pub fn total_unrealized_pnl(&self) -> f64 {
        self.positions.keys().map(|s| self.unrealized_pnl(s)).sum()
    }

    /// Cash plus realized and unrealized P&L across every symbol with an
    /// open position.
    pub fn total_equity(&self) -> f64 {
        self.balance + self.realized_pnl + self.total_unrealized_pnl()
    }

    /// Whole-account P&L snapshot: `{realized, unrealized, equity, cash}`,
    /// the shape `MatchingEngine::pnl_report` hands back to a caller.
    pub fn account_pnl(&self) -> AccountPnl {
        AccountPnl {
            realized: self.realized_pnl,
            unrealized: self.total_unrealized_pnl(),
            equity: self.total_equity(),
            cash: self.balance,
        }
    }

    /// `{symbol -> signed quantity}` across every open position.
    pub fn positions_snapshot(&self) -> HashMap<String, f64> {
        self.positions.clone()
    }

    /// Per-symbol realized/unrealized/total breakdown.
    pub fn pnl_by_symbol(&self) -> HashMap<String, PnlReport> {
        let mut symbols: Vec<&String> = self.positions.keys().collect();
        for s in self.realized_by_symbol.keys() {
            if !symbols.contains(&s) {
                symbols.push(s);
            }
        }
        symbols
            .into_iter()
            .map(|symbol| {
                let realized = *self.realized_by_symbol.get(symbol).unwrap_or(&0.0);
                let unrealized = self.unrealized_pnl(symbol);
                (
                    symbol.clone(),
                    PnlReport {
                        realized_pnl: realized,
                        unrealized_pnl: unrealized,
                        total_pnl: realized + unrealized,
                    },
                )
            })
            .collect()
    }

    pub fn position_detail(&self, symbol: &str) -> PositionReport {
        PositionReport {
            symbol: symbol.to_string(),
            quantity: self.position(symbol),
            avg_price: *self.avg_price.get(symbol).unwrap_or(&0.0),
            mark_price: self.unrealized_prices.get(symbol).copied(),
            unrealized_pnl: self.unrealized_pnl(symbol),
        }
    }
}

/// Realized/unrealized/total P&L for one symbol. Serializable for external
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PnlReport {
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
}

/// Whole-account P&L: `MatchingEngine::pnl_report`'s return shape.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccountPnl {
    pub realized: f64,
    pub unrealized: f64,
    pub equity: f64,
    pub cash: f64,
}

/// A snapshot of a trader's position in one symbol.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositionReport {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub mark_price: Option<f64>,
    pub unrealized_pnl: f64,
}
