//! The matching engine: admission, risk checks, matching, fee tagging, and
//! contingent order activation.
//!
//! Contingent orders (stop-loss, stop-limit, trailing-stop, iceberg) never
//! rest in an `OrderBook` directly — the engine holds them in its own lists
//! and converts/replaces them into plain market or limit orders as they
//! trigger. Activation can itself produce trades that trigger further
//! contingent orders, so `submit_order` drains an explicit work queue
//! rather than recursing; this sidesteps any re-entrant-borrow hazard
//! without needing `Rc<RefCell<_>>` plumbing around the book. See
//! DESIGN.md for why the engine doesn't subscribe to the book's own event
//! bus for its internal control flow.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::book::OrderBook;
use crate::enums::{OrderType, Side, TimeInForce};
use crate::error::{EngineError, RiskViolation, RiskViolationKind};
use crate::events::EventBus;
use crate::order::Order;
use crate::trade::{Trade, TradeRole};
use crate::trader::{AccountPnl, PnlReport, PositionReport, Trader};

/// How liquidity at a price level is allocated among resting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingStrategy {
    /// Strict price-time priority: the order that arrived first at a price
    /// takes the whole fill before the next one is touched.
    Fifo,
    /// Splits an incoming order across every resting order at the best
    /// price, proportional to each one's remaining size.
    ProRata,
}

/// A completed fill: the trade itself, plus the buyer's and seller's
/// trader ids (either may be absent for an anonymous counterparty).
type Fill = (Trade, Option<String>, Option<String>);

struct IcebergState {
    side: Side,
    price: f64,
    trader_id: Option<String>,
    tif: TimeInForce,
    hidden_remaining: f64,
    display_quantity: f64,
}

pub struct MatchingEngine {
    books: HashMap<String, OrderBook>,
    /// The symbol an order with no `symbol` of its own routes to, mirroring
    /// the "default `OrderBook`" the constructor takes per spec.md §3/§6.
    /// Set to the first symbol registered via `add_order_book`.
    default_symbol: Option<String>,
    traders: HashMap<String, Trader>,
    trades: Vec<Trade>,
    last_trade_price: HashMap<String, f64>,

    stop_orders: Vec<Order>,
    stop_limit_orders: Vec<Order>,
    trailing_stop_orders: Vec<Order>,
    iceberg_orders: HashMap<String, IcebergState>,

    pub maker_fee_rate: f64,
    pub taker_fee_rate: f64,
    pub matching_strategy: MatchingStrategy,

    events: EventBus<'static, Trade>,
}

impl MatchingEngine {
    pub fn new(maker_fee_rate: f64, taker_fee_rate: f64, matching_strategy: MatchingStrategy) -> Self {
        MatchingEngine {
            books: HashMap::new(),
            default_symbol: None,
            traders: HashMap::new(),
            trades: Vec::new(),
            last_trade_price: HashMap::new(),
            stop_orders: Vec::new(),
            stop_limit_orders: Vec::new(),
            trailing_stop_orders: Vec::new(),
            iceberg_orders: HashMap::new(),
            maker_fee_rate,
            taker_fee_rate,
            matching_strategy,
            events: EventBus::new(),
        }
    }

    /// Registers a book for `symbol`. The first book ever registered becomes
    /// the default an order with no `symbol` of its own routes to.
    pub fn add_order_book(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if self.default_symbol.is_none() {
            self.default_symbol = Some(symbol.clone());
        }
        self.books.entry(symbol.clone()).or_insert_with(|| OrderBook::new(symbol));
    }

    pub fn register_trader(&mut self, trader: Trader) {
        self.traders.insert(trader.id.clone(), trader);
    }

    pub fn trader(&self, id: &str) -> Option<&Trader> {
        self.traders.get(id)
    }

    pub fn book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn last_trade_price(&self, symbol: &str) -> Option<f64> {
        self.last_trade_price.get(symbol).copied()
    }

    pub fn subscribe(&mut self, event: impl Into<String>, handler: impl FnMut(&str, &Trade) + 'static) -> crate::events::HandlerId {
        self.events.subscribe(event, handler)
    }

    pub fn unsubscribe(&mut self, event: &str, id: crate::events::HandlerId) {
        self.events.unsubscribe(event, id);
    }

    pub fn pnl_by_symbol(&self, trader_id: &str) -> Option<HashMap<String, PnlReport>> {
        self.traders.get(trader_id).map(Trader::pnl_by_symbol)
    }

    pub fn position_detail(&self, trader_id: &str, symbol: &str) -> Option<PositionReport> {
        self.traders.get(trader_id).map(|t| t.position_detail(symbol))
    }

    /// Whole-account `{realized, unrealized, equity, cash}` snapshot.
    pub fn pnl_report(&self, trader_id: &str) -> Result<AccountPnl, EngineError> {
        self.traders
            .get(trader_id)
            .map(Trader::account_pnl)
            .ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))
    }

    /// `{symbol -> signed quantity}` across every open position.
    pub fn position_report(&self, trader_id: &str) -> Result<HashMap<String, f64>, EngineError> {
        self.traders
            .get(trader_id)
            .map(Trader::positions_snapshot)
            .ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))
    }

    /// Entry point for every order, plain or contingent. Runs risk
    /// admission, then either routes straight into matching or parks the
    /// order in a contingent holding list, then drains the activation
    /// queue until quiescent.
    pub fn submit_order(&mut self, mut order: Order) -> Result<Vec<Trade>, EngineError> {
        let symbol = order
            .symbol
            .clone()
            .or_else(|| self.default_symbol.clone())
            .ok_or_else(|| EngineError::UnknownSymbol(String::new()))?;
        if !self.books.contains_key(&symbol) {
            return Err(EngineError::UnknownSymbol(symbol));
        }
        // An order with no symbol of its own is routed to the default book;
        // stamp it so downstream book/ledger lookups see a real symbol.
        if order.symbol.is_none() {
            order.symbol = Some(symbol.clone());
        }

        // An order naming a trader id this engine never registered is
        // treated like an anonymous order (no risk check, no history entry)
        // rather than rejected outright: `UnknownTrader` is reserved for
        // reporting calls (`pnl_report`, `position_report`) per the error
        // taxonomy, not for submission.
        if let Some(trader_id) = order.trader_id.clone() {
            if self.traders.contains_key(&trader_id) {
                self.check_risk(&trader_id, &order, &symbol)?;
                if let Some(trader) = self.traders.get_mut(&trader_id) {
                    trader.record_order(order.id.clone());
                }
            }
        }

        let mut queue: VecDeque<Order> = VecDeque::new();
        self.admit(order, &mut queue);

        let mut trades = Vec::new();
        while let Some(next) = queue.pop_front() {
            let produced = self.match_order(next, &mut queue)?;
            trades.extend(produced);
        }
        Ok(trades)
    }

    /// Routes a freshly-admitted order to the matching queue or to a
    /// contingent holding list.
    fn admit(&mut self, mut order: Order, queue: &mut VecDeque<Order>) {
        match order.order_type {
            OrderType::Market | OrderType::Limit => queue.push_back(order),
            OrderType::StopLoss => {
                debug!(order_id = %order.id, "parking stop-loss order");
                self.stop_orders.push(order);
            }
            OrderType::StopLimit => {
                debug!(order_id = %order.id, "parking stop-limit order");
                self.stop_limit_orders.push(order);
            }
            OrderType::TrailingStop => {
                if order.price.is_none() {
                    if let Some(symbol) = order.symbol.as_deref() {
                        if let Some(last) = self.last_trade_price.get(symbol).copied() {
                            let offset = order.trailing_offset.unwrap_or(0.0);
                            order.price = Some(match order.side {
                                Side::Sell => last - offset,
                                Side::Buy => last + offset,
                            });
                            order.aux_price = Some(last);
                        }
                    }
                }
                debug!(order_id = %order.id, "parking trailing-stop order");
                self.trailing_stop_orders.push(order);
            }
            OrderType::Iceberg => {
                let display = order.display_quantity.unwrap_or(order.quantity);
                let slice_qty = display.min(order.quantity);
                let price = order.price.expect("iceberg orders always carry a price");
                self.iceberg_orders.insert(
                    order.id.clone(),
                    IcebergState {
                        side: order.side,
                        price,
                        trader_id: order.trader_id.clone(),
                        tif: order.tif,
                        hidden_remaining: order.quantity - slice_qty,
                        display_quantity: display,
                    },
                );
                order.order_type = OrderType::Limit;
                order.quantity = slice_qty;
                order.display_quantity = None;
                queue.push_back(order);
            }
        }
    }

    /// Matches one order against the book, applies fills and fees, logs
    /// trades, updates the last-trade price, and feeds any contingent
    /// activations back into `queue`.
    fn match_order(&mut self, mut taker: Order, queue: &mut VecDeque<Order>) -> Result<Vec<Trade>, EngineError> {
        let symbol = taker.symbol.clone().ok_or_else(|| EngineError::UnknownSymbol(String::new()))?;
        let opposite = match taker.side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };
        let mut trades = Vec::new();

        loop {
            if taker.quantity <= 1e-9 {
                break;
            }
            let book = self.books.get_mut(&symbol).ok_or_else(|| EngineError::UnknownSymbol(symbol.clone()))?;
            let Some(best_effective) = book.best_effective_price(opposite) else {
                break;
            };
            if !crosses(&taker, best_effective) {
                break;
            }

            // Pro-rata allocation only makes sense across priced resting
            // orders; a resting MARKET order at the top forces a single
            // FIFO step against it first.
            let use_fifo = self.matching_strategy == MatchingStrategy::Fifo || book.best_order_type(opposite) == Some(OrderType::Market);

            let fills = if use_fifo {
                self.fifo_fill(&symbol, opposite, &mut taker)?
            } else {
                self.pro_rata_fill(&symbol, opposite, &mut taker)?
            };
            if fills.is_empty() {
                break;
            }
            for (trade, buyer_trader_id, seller_trader_id) in fills {
                self.settle_trade(&trade, buyer_trader_id, seller_trader_id, queue);
                trades.push(trade);
            }
        }

        if taker.quantity > 1e-9 {
            match taker.order_type {
                OrderType::Limit if taker.tif != TimeInForce::Ioc => {
                    let book = self.books.get_mut(&symbol).ok_or_else(|| EngineError::UnknownSymbol(symbol.clone()))?;
                    book.add_order(taker)?;
                }
                _ => {
                    // Market orders and IOC residue never rest; the unfilled
                    // remainder is simply dropped.
                }
            }
        }

        Ok(trades)
    }

    fn fifo_fill(&mut self, symbol: &str, opposite: Side, taker: &mut Order) -> Result<Vec<Fill>, EngineError> {
        let book = self.books.get_mut(symbol).ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        let Some(mut resting) = book.pop_best(opposite) else {
            return Ok(Vec::new());
        };

        let fill_qty = taker.quantity.min(resting.quantity);

        resting.quantity -= fill_qty;
        taker.quantity -= fill_qty;

        let (buy_leg, sell_leg) = match taker.side {
            Side::Buy => (&*taker, &resting),
            Side::Sell => (&resting, &*taker),
        };
        // Price improvement: use whichever side actually carries a price,
        // preferring the ask. Both legs are unpriced only when two resting
        // MARKET orders somehow cross, which the sentinel effective-price
        // ordering makes unreachable in practice.
        let price = sell_leg.price.or(buy_leg.price).unwrap_or(0.0);
        let trade = build_trade(symbol, buy_leg, sell_leg, price, fill_qty);
        let (buyer_id, seller_id) = match taker.side {
            Side::Buy => (taker.trader_id.clone(), resting.trader_id.clone()),
            Side::Sell => (resting.trader_id.clone(), taker.trader_id.clone()),
        };

        if resting.quantity > 1e-9 {
            book.requeue_front(resting);
        } else {
            book.notify_filled(&resting);
        }

        Ok(vec![(trade, buyer_id, seller_id)])
    }

    fn pro_rata_fill(&mut self, symbol: &str, opposite: Side, taker: &mut Order) -> Result<Vec<Fill>, EngineError> {
        let book = self.books.get_mut(symbol).ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        let level: Vec<(String, f64, f64, Option<String>)> = book
            .best_level_orders(opposite)
            .iter()
            .map(|o| (o.id.clone(), o.quantity, o.price.expect("resting orders always carry a price"), o.trader_id.clone()))
            .collect();
        if level.is_empty() {
            return Ok(Vec::new());
        }
        let price = level[0].2;
        let total_live: f64 = level.iter().map(|(_, qty, _, _)| qty).sum();
        let to_allocate = taker.quantity.min(total_live);

        let mut allocations: Vec<f64> = level
            .iter()
            .map(|(_, qty, _, _)| (qty / total_live * to_allocate).floor().max(0.0))
            .collect();
        let mut allocated: f64 = allocations.iter().sum();
        // Largest-remainder pass: hand out whatever floor() left on the
        // table, in level order, until the taker's quantity is exhausted.
        let mut idx = 0;
        while allocated + 1e-9 < to_allocate && idx < allocations.len() {
            let room = level[idx].1 - allocations[idx];
            if room > 1e-9 {
                let extra = room.min(to_allocate - allocated);
                allocations[idx] += extra;
                allocated += extra;
            }
            idx += 1;
        }

        let mut trades = Vec::new();
        for (i, qty) in allocations.into_iter().enumerate() {
            if qty <= 1e-9 {
                continue;
            }
            let (ref id, _, _, ref maker_trader_id) = level[i];
            book.reduce_order(id, qty);
            let resting = Order {
                id: id.clone(),
                order_type: OrderType::Limit,
                side: opposite,
                price: Some(price),
                quantity: qty,
                timestamp: taker.timestamp,
                symbol: Some(symbol.to_string()),
                trader_id: maker_trader_id.clone(),
                tif: TimeInForce::Gtc,
                aux_price: None,
                trailing_offset: None,
                display_quantity: None,
            };
            taker.quantity -= qty;
            let (buy_leg, sell_leg) = match taker.side {
                Side::Buy => (&*taker, &resting),
                Side::Sell => (&resting, &*taker),
            };
            let trade = build_trade(symbol, buy_leg, sell_leg, price, qty);
            let (buyer_id, seller_id) = match taker.side {
                Side::Buy => (taker.trader_id.clone(), maker_trader_id.clone()),
                Side::Sell => (maker_trader_id.clone(), taker.trader_id.clone()),
            };
            trades.push((trade, buyer_id, seller_id));
        }
        Ok(trades)
    }

    /// Books a completed fill: applies it to both traders' ledgers, tags
    /// fees by maker/taker role, logs and broadcasts the trade, advances
    /// the last-trade price, and re-checks/activates contingent orders
    /// for the symbol.
    fn settle_trade(&mut self, trade: &Trade, buyer_trader_id: Option<String>, seller_trader_id: Option<String>, queue: &mut VecDeque<Order>) {
        let (_, buy_role) = trade.role_for(Side::Buy);
        let (_, sell_role) = trade.role_for(Side::Sell);
        let buy_fee_rate = if buy_role == TradeRole::Maker { self.maker_fee_rate } else { self.taker_fee_rate };
        let sell_fee_rate = if sell_role == TradeRole::Maker { self.maker_fee_rate } else { self.taker_fee_rate };
        self.apply_ledger(buyer_trader_id.as_deref(), &trade.symbol, Side::Buy, trade.quantity, trade.price, buy_fee_rate);
        self.apply_ledger(seller_trader_id.as_deref(), &trade.symbol, Side::Sell, trade.quantity, trade.price, sell_fee_rate);

        info!(
            symbol = %trade.symbol,
            price = trade.price,
            quantity = trade.quantity,
            maker = %trade.maker_order_id,
            taker = %trade.taker_order_id,
            "trade executed"
        );
        self.trades.push(trade.clone());
        self.events.notify("trade_executed", trade);
        self.last_trade_price.insert(trade.symbol.clone(), trade.price);

        for order_id in [&trade.buy_order_id, &trade.sell_order_id] {
            if self.iceberg_orders.contains_key(order_id) && !self.order_still_resting(&trade.symbol, order_id) {
                self.replenish_iceberg(&trade.symbol, order_id, queue);
            }
        }

        self.activate_contingent_orders(&trade.symbol, trade.price, queue);
    }

    fn apply_ledger(&mut self, trader_id: Option<&str>, symbol: &str, side: Side, quantity: f64, price: f64, fee_rate: f64) {
        let Some(trader_id) = trader_id else {
            return;
        };
        if let Some(trader) = self.traders.get_mut(trader_id) {
            let fee = fee_rate * price * quantity;
            trader.apply_fill(symbol, side, quantity, price, fee);
            trader.mark_price(symbol, price);
        }
    }

    fn order_still_resting(&self, symbol: &str, order_id: &str) -> bool {
        self.books.get(symbol).and_then(|b| b.get_order(order_id)).is_some()
    }

    fn replenish_iceberg(&mut self, symbol: &str, order_id: &str, queue: &mut VecDeque<Order>) {
        let Some(state) = self.iceberg_orders.get_mut(order_id) else {
            return;
        };
        if state.hidden_remaining <= 1e-9 {
            self.iceberg_orders.remove(order_id);
            return;
        }
        let slice = state.display_quantity.min(state.hidden_remaining);
        state.hidden_remaining -= slice;
        let child = Order {
            id: order_id.to_string(),
            order_type: OrderType::Limit,
            side: state.side,
            price: Some(state.price),
            quantity: slice,
            timestamp: Utc::now(),
            symbol: Some(symbol.to_string()),
            trader_id: state.trader_id.clone(),
            tif: state.tif,
            aux_price: None,
            trailing_offset: None,
            display_quantity: None,
        };
        debug!(order_id = %order_id, slice_quantity = slice, "replenished iceberg slice");
        queue.push_back(child);
    }

    fn activate_contingent_orders(&mut self, symbol: &str, last_price: f64, queue: &mut VecDeque<Order>) {
        for order in self.trailing_stop_orders.iter_mut().filter(|o| o.symbol.as_deref() == Some(symbol)) {
            let offset = order.trailing_offset.unwrap_or(0.0);
            // aux_price tracks the running peak (SELL) / trough (BUY) of the
            // last trade price; the trigger price trails it by `offset`.
            let peak = match order.side {
                Side::Sell => order.aux_price.map_or(last_price, |p| p.max(last_price)),
                Side::Buy => order.aux_price.map_or(last_price, |p| p.min(last_price)),
            };
            order.aux_price = Some(peak);
            order.price = Some(match order.side {
                Side::Sell => peak - offset,
                Side::Buy => peak + offset,
            });
        }

        let mut still_stop = Vec::new();
        for order in self.stop_orders.drain(..) {
            if order.symbol.as_deref() == Some(symbol) && triggered(&order, last_price) {
                info!(order_id = %order.id, "stop-loss triggered");
                queue.push_back(to_market(order));
            } else {
                still_stop.push(order);
            }
        }
        self.stop_orders = still_stop;

        let mut still_stop_limit = Vec::new();
        for order in self.stop_limit_orders.drain(..) {
            if order.symbol.as_deref() == Some(symbol) && triggered(&order, last_price) {
                info!(order_id = %order.id, "stop-limit triggered");
                queue.push_back(to_limit_from_stop_limit(order));
            } else {
                still_stop_limit.push(order);
            }
        }
        self.stop_limit_orders = still_stop_limit;

        let mut still_trailing = Vec::new();
        for order in self.trailing_stop_orders.drain(..) {
            if order.symbol.as_deref() == Some(symbol) && triggered(&order, last_price) {
                info!(order_id = %order.id, "trailing-stop triggered");
                queue.push_back(to_market(order));
            } else {
                still_trailing.push(order);
            }
        }
        self.trailing_stop_orders = still_trailing;
    }

    /// Estimated fill price for risk admission: a limit order's own price
    /// when set; for a market order, the last trade price, falling back to
    /// the opposite side's best price.
    fn estimate_notional_price(&mut self, order: &Order, symbol: &str) -> Option<f64> {
        match order.order_type {
            OrderType::Market => {
                if let Some(last) = self.last_trade_price.get(symbol).copied() {
                    return Some(last);
                }
                let book = self.books.get_mut(symbol)?;
                match order.side {
                    Side::Buy => book.best_ask(),
                    Side::Sell => book.best_bid(),
                }
            }
            _ => order.price,
        }
    }

    /// Admission risk check for a trader's scalar config against an order's
    /// estimated notional. Pulls the trader's relevant fields into locals
    /// first so the estimate (which may need a mutable book lookup) doesn't
    /// overlap the trader borrow.
    fn check_risk(&mut self, trader_id: &str, order: &Order, symbol: &str) -> Result<(), EngineError> {
        let (balance, max_order_notional, risk_per_trade_fraction, max_exposure_per_symbol, total_equity, position) = {
            let trader = self.traders.get(trader_id).ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))?;
            (
                trader.balance,
                trader.max_order_notional,
                trader.risk_per_trade_fraction,
                trader.max_exposure_per_symbol,
                trader.total_equity(),
                trader.position(symbol),
            )
        };

        // Exposure is a quantity cap, not a notional one, so it's gated on
        // the symbol being known, not on an estimated price existing; it
        // must run even when the notional-dependent checks below bail out.
        if let Some(limit) = max_exposure_per_symbol {
            let signed_delta = match order.side {
                Side::Buy => order.quantity,
                Side::Sell => -order.quantity,
            };
            let resulting = (position + signed_delta).abs();
            if resulting > limit {
                return Err(violation(trader_id, RiskViolationKind::ExposureExceeded { resulting, limit }));
            }
        }

        let Some(price) = self.estimate_notional_price(order, symbol) else {
            // No price to estimate notional against (a market order hitting
            // an empty book for the first time). Admitted without a risk
            // check rather than blocked.
            warn!(trader_id, order_id = %order.id, "admitting order with unknown notional; risk check skipped");
            return Ok(());
        };
        let notional = price * order.quantity;

        if let Some(limit) = max_order_notional {
            if notional > limit {
                return Err(violation(trader_id, RiskViolationKind::NotionalExceeded { notional, limit }));
            }
        }
        if let Some(fraction) = risk_per_trade_fraction {
            let allowed = fraction * total_equity;
            if notional > allowed {
                return Err(violation(trader_id, RiskViolationKind::RiskFractionExceeded { notional, allowed }));
            }
        }
        if order.side == Side::Buy && notional > balance {
            return Err(violation(trader_id, RiskViolationKind::InsufficientBalance { balance, notional }));
        }
        Ok(())
    }

    /// Cancels a resting or contingent order by id, wherever it lives.
    pub fn cancel_order(&mut self, symbol: &str, order_id: &str) -> Option<Order> {
        if let Some(book) = self.books.get_mut(symbol) {
            if let Some(order) = book.remove_order(order_id) {
                self.iceberg_orders.remove(order_id);
                return Some(order);
            }
        }
        for list in [&mut self.stop_orders, &mut self.stop_limit_orders, &mut self.trailing_stop_orders] {
            if let Some(pos) = list.iter().position(|o| o.id == order_id) {
                return Some(list.remove(pos));
            }
        }
        None
    }
}

fn violation(trader_id: &str, kind: RiskViolationKind) -> EngineError {
    EngineError::Risk(RiskViolation {
        trader_id: trader_id.to_string(),
        kind,
    })
}

/// Tags maker/taker by order composition, not by which side happened to be
/// resting: if exactly one side is a MARKET order, that side is the taker;
/// otherwise (both LIMIT, or both MARKET) the buyer is always the taker.
fn build_trade(symbol: &str, buy: &Order, sell: &Order, price: f64, quantity: f64) -> Trade {
    let buy_is_taker = match (buy.order_type == OrderType::Market, sell.order_type == OrderType::Market) {
        (true, false) => true,
        (false, true) => false,
        _ => true,
    };
    let (maker_order_id, taker_order_id) = if buy_is_taker {
        (sell.id.clone(), buy.id.clone())
    } else {
        (buy.id.clone(), sell.id.clone())
    };
    Trade {
        buy_order_id: buy.id.clone(),
        sell_order_id: sell.id.clone(),
        symbol: symbol.to_string(),
        price,
        quantity,
        timestamp: Utc::now(),
        maker_order_id,
        taker_order_id,
    }
}

fn crosses(taker: &Order, best_opposite_price: f64) -> bool {
    match taker.order_type {
        OrderType::Market => true,
        _ => match taker.price {
            Some(limit) => match taker.side {
                Side::Buy => limit >= best_opposite_price,
                Side::Sell => limit <= best_opposite_price,
            },
            None => true,
        },
    }
}

fn triggered(order: &Order, last_price: f64) -> bool {
    match order.price {
        Some(stop_price) => match order.side {
            Side::Sell => last_price <= stop_price,
            Side::Buy => last_price >= stop_price,
        },
        None => false,
    }
}

fn to_market(mut order: Order) -> Order {
    order.id = format!("{}-mkt", order.id);
    order.order_type = OrderType::Market;
    order.price = None;
    order.aux_price = None;
    order.trailing_offset = None;
    order
}

fn to_limit_from_stop_limit(mut order: Order) -> Order {
    order.id = format!("{}-lmt", order.id);
    order.order_type = OrderType::Limit;
    order.price = order.aux_price;
    order.aux_price = None;
    order
}
