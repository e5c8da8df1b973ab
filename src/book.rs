//! A single-symbol limit order book with price-time priority.
//!
//! Order data lives in one place: `orders`, an id-keyed map that is the
//! single source of truth for price/quantity/side. `PriceLevels` holds only
//! ids, grouped by price and FIFO-ordered by arrival within a price level.
//! This keeps `get_order` O(1) and keeps the two structures from drifting
//! out of sync with each other.
//!
//! Cancellation is lazy: `remove_order` drops the id from `orders` and marks
//! it in a tombstone set; the id is dropped from its price level the next
//! time that level reaches the front during a read. MARKET orders carry no
//! price, so they are keyed by a sentinel effective price (+inf on the bid
//! side, 0 on the ask side) that always sorts to the front of their side.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use crate::enums::{OrderType, Side};
use crate::error::EngineError;
use crate::events::EventBus;
use crate::order::Order;

/// The key used to order a side's price levels: an order's own price, or
/// the side's sentinel when it is a resting MARKET order.
pub(crate) fn effective_price(side: Side, price: Option<f64>) -> f64 {
    match price {
        Some(p) => p,
        None => match side {
            Side::Buy => f64::INFINITY,
            Side::Sell => 0.0,
        },
    }
}

/// An `f64` price, ordered by total order (prices reaching a book are
/// always finite, or the +inf/0 sentinels above — never NaN).
#[derive(Debug, Clone, Copy)]
struct PriceKey(f64);

impl PriceKey {
    fn new(value: f64) -> Self {
        PriceKey(value)
    }
}

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}
impl Eq for PriceKey {}
impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
impl Hash for PriceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// One side (bids or asks) of a book: ids only, grouped by price.
struct PriceLevels {
    side: Side,
    levels: BTreeMap<PriceKey, VecDeque<String>>,
    canceled: HashSet<String>,
}

impl PriceLevels {
    fn new(side: Side) -> Self {
        PriceLevels {
            side,
            levels: BTreeMap::new(),
            canceled: HashSet::new(),
        }
    }

    fn push_back(&mut self, id: String, key: PriceKey) {
        self.levels.entry(key).or_default().push_back(id);
    }

    fn push_front(&mut self, id: String, key: PriceKey) {
        self.levels.entry(key).or_default().push_front(id);
    }

    fn best_key(&self) -> Option<PriceKey> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Drops tombstoned ids and ids whose order has been depleted from the
    /// front of the best level, walking into the next level whenever the
    /// current one empties out.
    fn clean_front(&mut self, orders: &HashMap<String, Order>) {
        loop {
            let Some(key) = self.best_key() else { return };
            {
                let deque = self.levels.get_mut(&key).expect("best_key always names a present level");
                while let Some(front_id) = deque.front() {
                    let dead = self.canceled.remove(front_id) || orders.get(front_id).is_none_or(|o| o.quantity <= 1e-9);
                    if dead {
                        deque.pop_front();
                    } else {
                        break;
                    }
                }
            }
            if self.levels.get(&key).is_some_and(VecDeque::is_empty) {
                self.levels.remove(&key);
                continue;
            }
            return;
        }
    }

    fn peek_best(&mut self, orders: &HashMap<String, Order>) -> Option<String> {
        self.clean_front(orders);
        let key = self.best_key()?;
        self.levels.get(&key)?.front().cloned()
    }

    fn pop_best(&mut self, orders: &HashMap<String, Order>) -> Option<String> {
        self.clean_front(orders);
        let key = self.best_key()?;
        let deque = self.levels.get_mut(&key)?;
        let id = deque.pop_front();
        if deque.is_empty() {
            self.levels.remove(&key);
        }
        id
    }

    /// Live ids resting at the best price, front to back. Used for
    /// pro-rata allocation, which needs every order at the level.
    fn best_level_ids(&mut self, orders: &HashMap<String, Order>) -> Vec<String> {
        self.clean_front(orders);
        let Some(key) = self.best_key() else {
            return Vec::new();
        };
        self.levels
            .get(&key)
            .map(|deque| deque.iter().filter(|id| !self.canceled.contains(*id)).cloned().collect())
            .unwrap_or_default()
    }

    fn cancel(&mut self, id: &str) -> bool {
        self.canceled.insert(id.to_string())
    }

    fn depth(&self, orders: &HashMap<String, Order>, levels: usize) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        let mut push_level = |key: &PriceKey, ids: &VecDeque<String>| {
            let qty: f64 = ids
                .iter()
                .filter(|id| !self.canceled.contains(*id))
                .filter_map(|id| orders.get(id))
                .filter(|o| o.price.is_some())
                .map(|o| o.quantity)
                .sum();
            if qty > 0.0 {
                out.push((key.0, qty));
            }
        };
        match self.side {
            Side::Buy => {
                for (key, ids) in self.levels.iter().rev().take(levels) {
                    push_level(key, ids);
                }
            }
            Side::Sell => {
                for (key, ids) in self.levels.iter().take(levels) {
                    push_level(key, ids);
                }
            }
        }
        out
    }
}

/// A single symbol's bid and ask sides, with an id→order map as the
/// authoritative store for order data and a named event bus for
/// `order_added`/`order_removed` subscribers.
pub struct OrderBook {
    pub symbol: String,
    bids: PriceLevels,
    asks: PriceLevels,
    orders: HashMap<String, Order>,
    events: EventBus<'static, Order>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        OrderBook {
            symbol: symbol.into(),
            bids: PriceLevels::new(Side::Buy),
            asks: PriceLevels::new(Side::Sell),
            orders: HashMap::new(),
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, event: impl Into<String>, handler: impl FnMut(&str, &Order) + 'static) -> crate::events::HandlerId {
        self.events.subscribe(event, handler)
    }

    pub fn unsubscribe(&mut self, event: &str, id: crate::events::HandlerId) {
        self.events.unsubscribe(event, id);
    }

    /// Rests a LIMIT or MARKET order in the book. Contingent types never
    /// route here directly — the engine holds them until they trigger or
    /// slice into a plain order.
    pub fn add_order(&mut self, order: Order) -> Result<(), EngineError> {
        if order.symbol.as_deref() != Some(self.symbol.as_str()) {
            return Err(EngineError::SymbolMismatch {
                order_symbol: order.symbol.clone().unwrap_or_default(),
                book_symbol: self.symbol.clone(),
            });
        }
        if order.order_type.is_contingent() {
            return Err(EngineError::NotRoutable(order.order_type));
        }

        let id = order.id.clone();
        let key = PriceKey::new(effective_price(order.side, order.price));
        match order.side {
            Side::Buy => self.bids.push_back(id.clone(), key),
            Side::Sell => self.asks.push_back(id.clone(), key),
        }
        let added = order.clone();
        self.orders.insert(id, order);
        self.events.notify("order_added", &added);
        Ok(())
    }

    /// Cancels a resting order by id. Returns the removed order if it was
    /// present.
    pub fn remove_order(&mut self, id: &str) -> Option<Order> {
        let order = self.orders.remove(id)?;
        match order.side {
            Side::Buy => self.bids.cancel(id),
            Side::Sell => self.asks.cancel(id),
        };
        self.events.notify("order_removed", &order);
        Some(order)
    }

    /// O(1) lookup by id.
    pub fn get_order(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// The best resting price on a side, skipping past a resting MARKET
    /// order at the front (it has no price to report) to the next live,
    /// priced order if one exists.
    pub fn best_bid(&mut self) -> Option<f64> {
        let id = self.bids.peek_best(&self.orders)?;
        self.orders.get(&id)?.price
    }

    pub fn best_ask(&mut self) -> Option<f64> {
        let id = self.asks.peek_best(&self.orders)?;
        self.orders.get(&id)?.price
    }

    /// Aggregated (price, quantity) pairs, best-first, up to `levels` deep
    /// on each side. MARKET orders (no price) never contribute.
    pub fn depth(&self, levels: usize) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
        (self.bids.depth(&self.orders, levels), self.asks.depth(&self.orders, levels))
    }

    /// The comparison key used by the matching loop's cross test: an
    /// order's real price, or the side's sentinel if the best resting
    /// order is an unpriced MARKET order.
    pub(crate) fn best_effective_price(&mut self, side: Side) -> Option<f64> {
        match side {
            Side::Buy => {
                self.bids.clean_front(&self.orders);
                self.bids.best_key().map(|k| k.0)
            }
            Side::Sell => {
                self.asks.clean_front(&self.orders);
                self.asks.best_key().map(|k| k.0)
            }
        }
    }

    pub(crate) fn best_order_type(&mut self, side: Side) -> Option<OrderType> {
        let id = match side {
            Side::Buy => self.bids.peek_best(&self.orders),
            Side::Sell => self.asks.peek_best(&self.orders),
        }?;
        self.orders.get(&id).map(|o| o.order_type)
    }

    /// Pops the highest-priority resting order on `side`, if any is live.
    /// Used by the matching loop; not part of the public maintenance API.
    pub(crate) fn pop_best(&mut self, side: Side) -> Option<Order> {
        let id = match side {
            Side::Buy => self.bids.pop_best(&self.orders),
            Side::Sell => self.asks.pop_best(&self.orders),
        }?;
        self.orders.remove(&id)
    }

    /// Live orders resting at the best price on `side`, front to back.
    /// Used for pro-rata allocation, which needs every order at the level.
    pub(crate) fn best_level_orders(&mut self, side: Side) -> Vec<Order> {
        let ids = match side {
            Side::Buy => self.bids.best_level_ids(&self.orders),
            Side::Sell => self.asks.best_level_ids(&self.orders),
        };
        ids.into_iter().filter_map(|id| self.orders.get(&id).cloned()).collect()
    }

    /// Reduces a resting order by `qty` in place (used by pro-rata
    /// allocation, which fills several orders at a level without popping
    /// them in arrival order). Removes the order once fully consumed.
    /// Returns the order's remaining quantity, or `None` if `id` isn't
    /// resting here.
    pub(crate) fn reduce_order(&mut self, id: &str, qty: f64) -> Option<f64> {
        let order = self.orders.get_mut(id)?;
        order.quantity -= qty;
        let remaining = order.quantity.max(0.0);
        if remaining <= 1e-9 {
            let removed = self.orders.remove(id)?;
            match removed.side {
                Side::Buy => self.bids.cancel(id),
                Side::Sell => self.asks.cancel(id),
            };
            self.events.notify("order_removed", &removed);
        }
        Some(remaining)
    }

    /// Puts a partially-filled order back at the front of its price level,
    /// preserving its original time priority.
    pub(crate) fn requeue_front(&mut self, order: Order) {
        let id = order.id.clone();
        let key = PriceKey::new(effective_price(order.side, order.price));
        match order.side {
            Side::Buy => self.bids.push_front(id.clone(), key),
            Side::Sell => self.asks.push_front(id.clone(), key),
        }
        self.orders.insert(id, order);
    }

    /// Fires `order_removed` for an order the matching loop has fully
    /// consumed (and therefore will not `requeue_front`). `pop_best` itself
    /// can't tell a full fill from a pending partial requeue — the caller
    /// decrements quantity after popping — so it's the matching loop's job
    /// to call this once it knows the order won't be rested again.
    pub(crate) fn notify_filled(&mut self, order: &Order) {
        self.events.notify("order_removed", order);
    }
}


#[cfg(test)]
mod order_book_tests {
    use super::*;
    use crate::enums::TimeInForce;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn limit(id: &str, side: Side, price: f64, qty: f64) -> Order {
        Order::new(
            id,
            OrderType::Limit,
            side,
            Some(price),
            qty,
            Utc::now(),
            Some("AAPL".into()),
            None,
            TimeInForce::Gtc,
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn market(id: &str, side: Side, qty: f64) -> Order {
        Order::new(
            id,
            OrderType::Market,
            side,
            None,
            qty,
            Utc::now(),
            Some("AAPL".into()),
            None,
            TimeInForce::Gtc,
            None,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn symbol_mismatch_is_rejected() {
        let mut book = OrderBook::new("AAPL");
        let mut order = limit("a", Side::Buy, 100.0, 1.0);
        order.symbol = Some("TSLA".into());
        let err = book.add_order(order).unwrap_err();
        assert!(matches!(err, EngineError::SymbolMismatch { .. }));
    }

    #[test]
    fn contingent_order_is_not_routable() {
        let mut book = OrderBook::new("AAPL");
        let order = Order::new(
            "a",
            OrderType::StopLoss,
            Side::Buy,
            Some(90.0),
            1.0,
            Utc::now(),
            Some("AAPL".into()),
            None,
            TimeInForce::Gtc,
            None,
            None,
            None,
        )
        .unwrap();
        let err = book.add_order(order).unwrap_err();
        assert!(matches!(err, EngineError::NotRoutable(OrderType::StopLoss)));
    }

    #[test]
    fn market_order_is_routable_and_rests_at_the_front() {
        let mut book = OrderBook::new("AAPL");
        book.add_order(limit("a", Side::Buy, 99.0, 1.0)).unwrap();
        book.add_order(market("m", Side::Buy, 1.0)).unwrap();
        // The market order has no displayable price, so best_bid() reports
        // the next real priced order behind it.
        assert_eq!(book.best_bid(), Some(99.0));
        assert_eq!(book.best_effective_price(Side::Buy), Some(f64::INFINITY));
    }

    #[test]
    fn best_bid_and_ask_reflect_resting_orders() {
        let mut book = OrderBook::new("AAPL");
        book.add_order(limit("a", Side::Buy, 99.0, 1.0)).unwrap();
        book.add_order(limit("b", Side::Sell, 101.0, 1.0)).unwrap();
        assert_eq!(book.best_bid(), Some(99.0));
        assert_eq!(book.best_ask(), Some(101.0));
    }

    #[test]
    fn remove_order_fires_order_removed_event() {
        let mut book = OrderBook::new("AAPL");
        book.add_order(limit("a", Side::Buy, 99.0, 1.0)).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        book.subscribe("order_removed", move |_, o| seen_clone.borrow_mut().push(o.id.clone()));
        book.remove_order("a");
        assert_eq!(*seen.borrow(), vec!["a".to_string()]);
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn removing_twice_fires_event_only_once() {
        let mut book = OrderBook::new("AAPL");
        book.add_order(limit("a", Side::Buy, 99.0, 1.0)).unwrap();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        book.subscribe("order_removed", move |_, _| *count_clone.borrow_mut() += 1);
        book.remove_order("a");
        book.remove_order("a");
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn depth_aggregates_quantity_per_price_and_excludes_market_orders() {
        let mut book = OrderBook::new("AAPL");
        book.add_order(limit("a", Side::Buy, 99.0, 1.0)).unwrap();
        book.add_order(limit("b", Side::Buy, 99.0, 2.0)).unwrap();
        book.add_order(limit("c", Side::Buy, 98.0, 5.0)).unwrap();
        book.add_order(market("m", Side::Buy, 10.0)).unwrap();
        let (bids, _asks) = book.depth(10);
        assert_eq!(bids, vec![(99.0, 3.0), (98.0, 5.0)]);
    }

    #[test]
    fn get_order_is_present_after_add_and_absent_after_cancel() {
        let mut book = OrderBook::new("AAPL");
        book.add_order(limit("a", Side::Buy, 99.0, 1.0)).unwrap();
        assert!(book.get_order("a").is_some());
        book.remove_order("a");
        assert!(book.get_order("a").is_none());
    }
}
