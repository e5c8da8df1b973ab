//! A small named-event bus, embedded in `OrderBook` and `MatchingEngine`.
//!
//! Subscriptions are indexed handles (`HandlerId`) rather than closures
//! compared by pointer equality, so `unsubscribe` doesn't need `PartialEq`
//! on `Box<dyn FnMut>`. Handlers run in subscription order; a handler that
//! panics propagates to the caller of the operation that triggered the
//! notification — nothing here catches or swallows it.

use std::collections::HashMap;

/// A handle returned by `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<'a, P> = Box<dyn FnMut(&str, &P) + 'a>;

/// Event bus over a single payload type `P`. `OrderBook` uses `P = Order`
/// for `order_added`/`order_removed`; `MatchingEngine` uses `P = Trade`
/// for `trade_executed`.
pub struct EventBus<'a, P> {
    subscribers: HashMap<String, Vec<(HandlerId, Handler<'a, P>)>>,
    next_id: u64,
}

impl<'a, P> Default for EventBus<'a, P> {
    fn default() -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<'a, P> EventBus<'a, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: impl Into<String>, handler: impl FnMut(&str, &P) + 'a) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(event.into())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, event: &str, id: HandlerId) {
        if let Some(handlers) = self.subscribers.get_mut(event) {
            handlers.retain(|(hid, _)| *hid != id);
        }
    }

    pub fn notify(&mut self, event: &str, payload: &P) {
        if let Some(handlers) = self.subscribers.get_mut(event) {
            for (_, handler) in handlers.iter_mut() {
                handler(event, payload);
            }
        }
    }
}
