use tracing::{debug, instrument};

use crate::error::Error;
use crate::matching::MatchOutcome;
use crate::models::{Order, OrderRequest, Quantity, Side};
use crate::repository::{OrderRepository, RepositoryError, SortDirection};

/// Order currently being filled on one side of the sweep, with the quantity
/// already taken from it this round.
#[derive(Debug, Default)]
struct PartialFill {
    order: Option<Order>,
    matched: Quantity,
}

impl PartialFill {
    fn remaining(&self, order: &Order) -> Quantity {
        order.quantity() - self.matched
    }

    fn accumulate(&mut self, order: &Order, quantity: Quantity) {
        if self.order.is_none() {
            self.order = Some(order.clone());
        }
        self.matched += quantity;
    }

    fn clear(&mut self) {
        self.order = None;
        self.matched = 0;
    }
}

/// Order book over a repository. The book keeps no state of its own; pass
/// `&mut repository` to borrow a repository instead of owning it.
#[derive(Debug)]
pub struct OrderBook<R> {
    orders: R,
}

impl<R: OrderRepository> OrderBook<R> {
    pub fn new(orders: R) -> Self {
        Self { orders }
    }

    pub fn repository(&self) -> &R {
        &self.orders
    }

    pub fn add(&mut self, order: Order) -> Result<(), RepositoryError> {
        self.orders.add(order)
    }

    /// Validates a raw request and adds the resulting order.
    pub fn submit(&mut self, request: OrderRequest) -> Result<Order, Error> {
        let order = Order::try_from(request)?;
        self.orders.add(order.clone())?;
        Ok(order)
    }

    pub fn modify(&mut self, order: Order) -> Result<(), RepositoryError> {
        self.orders.update(order)
    }

    pub fn remove(&mut self, order: &Order) -> Result<Order, RepositoryError> {
        self.orders.remove(order)
    }

    pub fn batch_remove(&mut self, orders: &[Order]) -> usize {
        self.orders.batch_remove(orders)
    }

    /// Runs one matching round over the whole book.
    ///
    /// Asks are swept from the lowest price and bids from the highest until
    /// the prices stop crossing. Fully consumed orders are removed and
    /// returned in `matched`. At most one order is left partially filled; its
    /// matched part is returned in `partial` and its remainder, with the same
    /// id, replaces it in the book.
    #[instrument(skip(self))]
    pub fn match_orders(&mut self) -> Result<MatchOutcome, RepositoryError> {
        let asks = self.orders.orders_by_side(Side::Sell, SortDirection::Ascending);
        let bids = self.orders.orders_by_side(Side::Buy, SortDirection::Descending);

        let mut matched = Vec::new();
        let mut ask_fill = PartialFill::default();
        let mut bid_fill = PartialFill::default();
        let mut ask_idx = 0;
        let mut bid_idx = 0;

        while ask_idx < asks.len() && bid_idx < bids.len() {
            let ask = &asks[ask_idx];
            let bid = &bids[bid_idx];
            if ask.price() > bid.price() {
                break;
            }

            let sell_remaining = ask_fill.remaining(ask);
            let buy_remaining = bid_fill.remaining(bid);
            let trade_qty = sell_remaining.min(buy_remaining);

            if trade_qty == sell_remaining {
                matched.push(ask.clone());
                ask_idx += 1;
                ask_fill.clear();
            } else {
                ask_fill.accumulate(ask, trade_qty);
            }

            if trade_qty == buy_remaining {
                matched.push(bid.clone());
                bid_idx += 1;
                bid_fill.clear();
            } else {
                bid_fill.accumulate(bid, trade_qty);
            }
        }

        let removed = self.orders.batch_remove(&matched);

        let mut partial = Vec::new();
        for fill in [ask_fill, bid_fill] {
            if let Some(order) = fill.order {
                let (fragment, leftover) = order.split(fill.matched);
                self.orders.update(leftover)?;
                partial.push(fragment);
            }
        }
        debug_assert!(partial.len() <= 1);

        let resting = self.orders.count();
        metrics::counter!("matchbook_orders_matched_total")
            .increment(matched.len() as u64);
        metrics::counter!("matchbook_orders_partial_total")
            .increment(partial.len() as u64);
        metrics::gauge!("matchbook_resting_orders").set(resting as f64);
        debug!(
            matched = matched.len(),
            removed,
            partial = partial.len(),
            resting,
            "matching round complete"
        );

        Ok(MatchOutcome { matched, partial })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::repository::MemoryOrderRepository;

    fn order(n: u128, side: Side, quantity: u64, price: i64) -> Order {
        Order::new(Uuid::from_u128(n), 1.0, side, quantity, Decimal::from(price)).unwrap()
    }

    #[test]
    fn empty_book_matches_nothing() {
        let mut book = OrderBook::new(MemoryOrderRepository::new());
        let outcome = book.match_orders().unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn exact_cross_leaves_no_fragment() {
        let mut book = OrderBook::new(MemoryOrderRepository::new());
        book.add(order(1, Side::Sell, 4, 10)).unwrap();
        book.add(order(2, Side::Buy, 4, 10)).unwrap();

        let outcome = book.match_orders().unwrap();
        assert_eq!(outcome.matched.len(), 2);
        assert!(outcome.partial.is_empty());
        assert!(book.repository().is_empty());
    }

    #[test]
    fn bid_partially_filled_across_asks() {
        let mut book = OrderBook::new(MemoryOrderRepository::new());
        book.add(order(1, Side::Sell, 2, 10)).unwrap();
        book.add(order(2, Side::Sell, 3, 11)).unwrap();
        book.add(order(3, Side::Buy, 10, 12)).unwrap();

        let outcome = book.match_orders().unwrap();
        assert_eq!(outcome.matched_quantity(), 5);
        assert_eq!(outcome.partial.len(), 1);
        assert_eq!(outcome.partial[0].quantity(), 5);
        assert_eq!(outcome.partial[0].side(), Side::Buy);

        let remainder = book.repository().get(Uuid::from_u128(3)).unwrap();
        assert_eq!(remainder.quantity(), 5);
        assert_eq!(book.repository().count(), 1);
    }

    #[test]
    fn book_can_borrow_repository() {
        let mut repo = MemoryOrderRepository::new();
        {
            let mut book = OrderBook::new(&mut repo);
            book.add(order(1, Side::Sell, 1, 10)).unwrap();
            book.add(order(2, Side::Buy, 1, 9)).unwrap();
            assert!(book.match_orders().unwrap().is_empty());
        }
        assert_eq!(repo.count(), 2);
    }
}
