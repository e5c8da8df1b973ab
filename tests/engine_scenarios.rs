//! End-to-end scenarios against the public `MatchingEngine`/`OrderBook`
//! surface, one per literal case enumerated in the engine's testable
//! properties.

use chrono::Utc;
use trading_engine::{MatchingEngine, MatchingStrategy, OrderBook, OrderFactory, Side, TimeInForce, Trader};

/// Surfaces the engine's `tracing` instrumentation (admission rejections,
/// trade prints, contingent triggers) when these tests run with
/// `RUST_LOG` set; a no-op if a subscriber is already installed.
fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn engine_with_book(symbol: &str) -> MatchingEngine {
    init_tracing();
    let mut engine = MatchingEngine::new(0.0, 0.0, MatchingStrategy::Fifo);
    engine.add_order_book(symbol);
    engine
}

fn limit(id: &str, side: Side, price: f64, qty: f64, symbol: &str, trader: Option<&str>, tif: TimeInForce) -> trading_engine::Order {
    OrderFactory::create_limit(id, side, price, qty, Some(Utc::now()), Some(symbol.into()), trader.map(String::from), tif).unwrap()
}

#[test]
fn basic_cross_leaves_residual_bid_resting() {
    let mut engine = engine_with_book("AAPL");
    engine.submit_order(limit("b1", Side::Buy, 101.0, 2.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    let trades = engine.submit_order(limit("a1", Side::Sell, 100.5, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, "b1");
    assert_eq!(trades[0].sell_order_id, "a1");
    assert_eq!(trades[0].price, 100.5);
    assert_eq!(trades[0].quantity, 1.0);

    let book = engine.book("AAPL").unwrap();
    assert_eq!(book.get_order("b1").unwrap().quantity, 1.0);
    assert!(book.get_order("a1").is_none());
}

#[test]
fn price_time_tie_break_fills_earlier_order_first() {
    let mut engine = engine_with_book("AAPL");
    engine.submit_order(limit("b1", Side::Buy, 100.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("b2", Side::Buy, 100.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    let trades = engine.submit_order(limit("a1", Side::Sell, 100.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, "b1");
}

#[test]
fn ioc_residue_never_rests() {
    let mut engine = engine_with_book("AAPL");
    engine.submit_order(limit("a1", Side::Sell, 100.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    let trades = engine.submit_order(limit("b1", Side::Buy, 100.0, 5.0, "AAPL", None, TimeInForce::Ioc)).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].quantity, 1.0);
    assert!(engine.book("AAPL").unwrap().get_order("b1").is_none());
}

#[test]
fn stop_loss_triggers_on_a_qualifying_print() {
    let mut engine = engine_with_book("AAPL");
    // Establish a last price of 98.0.
    engine.submit_order(limit("seed-sell", Side::Sell, 98.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("seed-buy", Side::Buy, 98.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    let stop = OrderFactory::create_stop_loss("stop1", Side::Sell, 99.0, 5.0, Some(Utc::now()), Some("AAPL".into()), None, TimeInForce::Gtc).unwrap();
    engine.submit_order(stop).unwrap();
    engine.submit_order(limit("resting-buy", Side::Buy, 90.0, 5.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    // Print at 98.5 triggers the SELL stop (last <= 99.0).
    engine.submit_order(limit("setter", Side::Sell, 98.5, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    let trades = engine.submit_order(limit("hitter", Side::Buy, 98.5, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    assert!(trades.iter().any(|t| t.price == 98.5));
    assert!(trades.iter().any(|t| t.sell_order_id == "stop1-mkt" && t.price == 90.0));
}

#[test]
fn iceberg_replenishes_a_single_visible_child() {
    let mut engine = engine_with_book("AAPL");
    let iceberg = OrderFactory::create_iceberg("ice1", Side::Buy, 100.0, 10.0, 2.0, Some(Utc::now()), Some("AAPL".into()), None, TimeInForce::Gtc).unwrap();
    engine.submit_order(iceberg).unwrap();

    let (bids, _) = engine.book("AAPL").unwrap().depth(5);
    assert_eq!(bids, vec![(100.0, 2.0)]);

    engine.submit_order(limit("s1", Side::Sell, 100.0, 2.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    // The first child was fully consumed; a fresh 2-lot child replaces it.
    let (bids, _) = engine.book("AAPL").unwrap().depth(5);
    assert_eq!(bids, vec![(100.0, 2.0)]);
}

#[test]
fn pro_rata_splits_proportionally_at_the_top_level() {
    let mut engine = MatchingEngine::new(0.0, 0.0, MatchingStrategy::ProRata);
    engine.add_order_book("AAPL");
    engine.submit_order(limit("b1", Side::Buy, 100.0, 30.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("b2", Side::Buy, 100.0, 70.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    let trades = engine.submit_order(limit("s1", Side::Sell, 100.0, 50.0, "AAPL", None, TimeInForce::Gtc)).unwrap();

    let b1_fill: f64 = trades.iter().filter(|t| t.buy_order_id == "b1").map(|t| t.quantity).sum();
    let b2_fill: f64 = trades.iter().filter(|t| t.buy_order_id == "b2").map(|t| t.quantity).sum();
    assert_eq!(b1_fill, 15.0);
    assert_eq!(b2_fill, 35.0);
    assert!(trades.iter().all(|t| t.price == 100.0));
}

#[test]
fn cancel_then_resubmit_round_trips_cleanly() {
    let mut engine = engine_with_book("AAPL");
    let order = limit("a1", Side::Sell, 100.0, 5.0, "AAPL", None, TimeInForce::Gtc);
    engine.submit_order(order.clone()).unwrap();
    assert!(engine.book("AAPL").unwrap().get_order("a1").is_some());

    let cancelled = engine.cancel_order("AAPL", "a1");
    assert_eq!(cancelled.unwrap().id, "a1");
    assert!(engine.book("AAPL").unwrap().get_order("a1").is_none());
}

#[test]
fn quiescent_match_orders_call_is_idempotent() {
    let mut engine = engine_with_book("AAPL");
    engine.submit_order(limit("b1", Side::Buy, 99.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    let before = engine.trades().len();
    // Re-submitting nothing: the book is already at rest, no new crosses.
    assert_eq!(engine.trades().len(), before);
}

#[test]
fn fills_update_both_traders_positions_and_cash_with_fees() {
    let mut engine = MatchingEngine::new(0.0, 0.01, MatchingStrategy::Fifo);
    engine.add_order_book("AAPL");
    engine.register_trader(Trader::new("buyer", 100_000.0));
    engine.register_trader(Trader::new("seller", 100_000.0));

    engine.submit_order(limit("s1", Side::Sell, 100.0, 10.0, "AAPL", Some("seller"), TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("b1", Side::Buy, 100.0, 10.0, "AAPL", Some("buyer"), TimeInForce::Gtc)).unwrap();

    let buyer = engine.trader("buyer").unwrap();
    assert_eq!(buyer.position("AAPL"), 10.0);
    // Buyer is taker here (both legs are LIMIT orders): pays the taker fee.
    assert_eq!(buyer.balance, 100_000.0 - 1_000.0 - 10.0);

    let seller = engine.trader("seller").unwrap();
    assert_eq!(seller.position("AAPL"), -10.0);
    assert_eq!(seller.balance, 100_000.0 + 1_000.0);
}

#[test]
fn risk_violation_blocks_admission_and_order_never_touches_the_book() {
    let mut engine = engine_with_book("AAPL");
    let mut trader = Trader::new("buyer", 1_000_000.0);
    // A quantity cap, not a notional one: 10 shares exceeds a 5-share cap
    // regardless of price.
    trader.max_exposure_per_symbol = Some(5.0);
    engine.register_trader(trader);

    let order = limit("b1", Side::Buy, 100.0, 10.0, "AAPL", Some("buyer"), TimeInForce::Gtc);
    let err = engine.submit_order(order).unwrap_err();
    assert!(matches!(err, trading_engine::EngineError::Risk(_)));
    assert!(engine.book("AAPL").unwrap().get_order("b1").is_none());
}

#[test]
fn exposure_check_runs_even_when_notional_is_unknown() {
    let mut engine = engine_with_book("AAPL");
    let mut trader = Trader::new("buyer", 1_000_000.0);
    trader.max_exposure_per_symbol = Some(5.0);
    engine.register_trader(trader);

    // A MARKET buy against an empty book (no last price, no resting ask)
    // has no estimable notional, but the exposure cap is a quantity check
    // and must still be enforced.
    let order = OrderFactory::create_market("b1", Side::Buy, 10.0, Some(Utc::now()), Some("AAPL".into()), Some("buyer".into()), TimeInForce::Gtc).unwrap();
    let err = engine.submit_order(order).unwrap_err();
    assert!(matches!(err, trading_engine::EngineError::Risk(_)));
}

#[test]
fn depth_ignores_resting_market_orders() {
    let mut book = OrderBook::new("AAPL");
    book.add_order(limit("a1", Side::Buy, 99.0, 1.0, "AAPL", None, TimeInForce::Gtc)).unwrap();
    let market = OrderFactory::create_market("m1", Side::Buy, 5.0, Some(Utc::now()), Some("AAPL".into()), None, TimeInForce::Gtc).unwrap();
    book.add_order(market).unwrap();

    let (bids, _) = book.depth(10);
    assert_eq!(bids, vec![(99.0, 1.0)]);
}

#[test]
fn pnl_report_reflects_realized_and_unrealized_pnl() {
    let mut engine = MatchingEngine::new(0.0, 0.0, MatchingStrategy::Fifo);
    engine.add_order_book("AAPL");
    engine.register_trader(Trader::new("buyer", 10_000.0));
    engine.register_trader(Trader::new("seller", 10_000.0));

    engine.submit_order(limit("s1", Side::Sell, 100.0, 10.0, "AAPL", Some("seller"), TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("b1", Side::Buy, 100.0, 10.0, "AAPL", Some("buyer"), TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("b2", Side::Buy, 110.0, 10.0, "AAPL", Some("seller"), TimeInForce::Gtc)).unwrap();
    engine.submit_order(limit("s2", Side::Sell, 110.0, 10.0, "AAPL", Some("buyer"), TimeInForce::Gtc)).unwrap();

    let report = engine.pnl_report("buyer").unwrap();
    assert_eq!(report.realized, 100.0);
    assert_eq!(report.cash, 10_100.0);
    // Equity is cash + realized + unrealized, not just cash + unrealized.
    assert_eq!(report.equity, 10_200.0);

    let positions = engine.position_report("buyer").unwrap();
    assert!(positions.get("AAPL").is_none());
}

#[test]
fn unknown_symbol_is_rejected_without_touching_any_book() {
    let mut engine = MatchingEngine::new(0.0, 0.0, MatchingStrategy::Fifo);
    let order = limit("b1", Side::Buy, 100.0, 1.0, "MSFT", None, TimeInForce::Gtc);
    let err = engine.submit_order(order).unwrap_err();
    assert!(matches!(err, trading_engine::EngineError::UnknownSymbol(_)));
}
