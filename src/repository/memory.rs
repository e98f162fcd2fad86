use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::models::{Order, OrderId, Price, Side};
use crate::repository::{OrderRepository, RepositoryError, SortDirection};

#[derive(Debug, Clone)]
struct OrderNode {
    order: Order,
    next: Option<usize>,
    prev: Option<usize>,
}

#[derive(Debug, Default)]
struct Level {
    head: Option<usize>,
    tail: Option<usize>,
}

type Levels = BTreeMap<Price, Level>;

/// In-memory repository. Orders live in a slab indexed by id; each price
/// level is a doubly linked FIFO through the slab, so side queries walk the
/// levels instead of sorting and removals unlink in constant time.
#[derive(Debug, Default)]
pub struct MemoryOrderRepository {
    bids: Levels,
    asks: Levels,
    orders: slab::Slab<OrderNode>,
    order_index: HashMap<OrderId, usize>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn levels(&self, side: Side) -> &Levels {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut Levels {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Links the node at `idx` at the back of its level.
    fn attach(&mut self, idx: usize) {
        let (side, price) = {
            let order = &self.orders[idx].order;
            (order.side(), order.price())
        };
        let level = self.levels_mut(side).entry(price).or_default();
        let prev = level.tail;
        if level.head.is_none() {
            level.head = Some(idx);
        }
        level.tail = Some(idx);
        if let Some(prev) = prev {
            self.orders[prev].next = Some(idx);
        }
        let node = &mut self.orders[idx];
        node.prev = prev;
        node.next = None;
    }

    /// Unlinks the node at `idx` from its level, dropping the level once empty.
    fn detach(&mut self, idx: usize) {
        let (side, price, prev, next) = {
            let node = &self.orders[idx];
            (node.order.side(), node.order.price(), node.prev, node.next)
        };
        if let Some(prev) = prev {
            self.orders[prev].next = next;
        }
        if let Some(next) = next {
            self.orders[next].prev = prev;
        }
        let levels = self.levels_mut(side);
        if let Some(level) = levels.get_mut(&price) {
            if level.head == Some(idx) {
                level.head = next;
            }
            if level.tail == Some(idx) {
                level.tail = prev;
            }
            if level.head.is_none() {
                levels.remove(&price);
            }
        }
        let node = &mut self.orders[idx];
        node.prev = None;
        node.next = None;
    }

    fn collect_level(&self, level: &Level, out: &mut Vec<Order>) {
        let mut cursor = level.head;
        while let Some(idx) = cursor {
            let node = &self.orders[idx];
            out.push(node.order.clone());
            cursor = node.next;
        }
    }
}

impl OrderRepository for MemoryOrderRepository {
    fn add(&mut self, order: Order) -> Result<(), RepositoryError> {
        let order_id = order.order_id();
        if self.order_index.contains_key(&order_id) {
            return Err(RepositoryError::AlreadyExists(order_id));
        }
        trace!(%order_id, side = %order.side(), "order added");
        let idx = self.orders.insert(OrderNode {
            order,
            next: None,
            prev: None,
        });
        self.attach(idx);
        self.order_index.insert(order_id, idx);
        Ok(())
    }

    fn update(&mut self, order: Order) -> Result<(), RepositoryError> {
        let order_id = order.order_id();
        let Some(&idx) = self.order_index.get(&order_id) else {
            return Err(RepositoryError::NotFound(order_id));
        };
        let current = &self.orders[idx].order;
        let same_level = current.side() == order.side() && current.price() == order.price();
        trace!(%order_id, quantity = order.quantity(), "order updated");
        if same_level {
            self.orders[idx].order = order;
        } else {
            self.detach(idx);
            self.orders[idx].order = order;
            self.attach(idx);
        }
        Ok(())
    }

    fn remove(&mut self, order: &Order) -> Result<Order, RepositoryError> {
        let order_id = order.order_id();
        let Some(idx) = self.order_index.remove(&order_id) else {
            return Err(RepositoryError::NotFound(order_id));
        };
        self.detach(idx);
        trace!(%order_id, "order removed");
        Ok(self.orders.remove(idx).order)
    }

    fn get(&self, order_id: OrderId) -> Option<Order> {
        let &idx = self.order_index.get(&order_id)?;
        self.orders.get(idx).map(|node| node.order.clone())
    }

    fn contains(&self, order_id: OrderId) -> bool {
        self.order_index.contains_key(&order_id)
    }

    fn orders_by_side(&self, side: Side, direction: SortDirection) -> Vec<Order> {
        let levels = self.levels(side);
        let mut out = Vec::new();
        match direction {
            SortDirection::Ascending => {
                for level in levels.values() {
                    self.collect_level(level, &mut out);
                }
            }
            SortDirection::Descending => {
                for level in levels.values().rev() {
                    self.collect_level(level, &mut out);
                }
            }
        }
        out
    }

    fn orders(&self) -> Vec<Order> {
        let mut out = self.orders_by_side(Side::Sell, SortDirection::Ascending);
        out.extend(self.orders_by_side(Side::Buy, SortDirection::Descending));
        out
    }

    fn count(&self) -> usize {
        self.order_index.len()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;

    fn order(n: u128, side: Side, quantity: u64, price: i64) -> Order {
        Order::new(
            Uuid::from_u128(n),
            n as f64,
            side,
            quantity,
            Decimal::from(price),
        )
        .unwrap()
    }

    fn ids(orders: &[Order]) -> Vec<u128> {
        orders.iter().map(|o| o.order_id().as_u128()).collect()
    }

    #[test]
    fn equal_prices_come_back_in_arrival_order() {
        let mut repo = MemoryOrderRepository::new();
        repo.add(order(3, Side::Buy, 1, 10)).unwrap();
        repo.add(order(1, Side::Buy, 1, 10)).unwrap();
        repo.add(order(2, Side::Buy, 1, 12)).unwrap();

        let desc = repo.orders_by_side(Side::Buy, SortDirection::Descending);
        assert_eq!(ids(&desc), vec![2, 3, 1]);
        let asc = repo.orders_by_side(Side::Buy, SortDirection::Ascending);
        assert_eq!(ids(&asc), vec![3, 1, 2]);
    }

    #[test]
    fn quantity_update_keeps_queue_position() {
        let mut repo = MemoryOrderRepository::new();
        repo.add(order(1, Side::Sell, 5, 10)).unwrap();
        repo.add(order(2, Side::Sell, 5, 10)).unwrap();
        repo.update(order(1, Side::Sell, 2, 10)).unwrap();

        let asks = repo.orders_by_side(Side::Sell, SortDirection::Ascending);
        assert_eq!(ids(&asks), vec![1, 2]);
        assert_eq!(asks[0].quantity(), 2);
    }

    #[test]
    fn price_update_requeues_at_new_level() {
        let mut repo = MemoryOrderRepository::new();
        repo.add(order(1, Side::Sell, 5, 10)).unwrap();
        repo.add(order(2, Side::Sell, 5, 11)).unwrap();
        repo.update(order(1, Side::Sell, 5, 11)).unwrap();

        let asks = repo.orders_by_side(Side::Sell, SortDirection::Ascending);
        assert_eq!(ids(&asks), vec![2, 1]);
        assert!(!repo.asks.contains_key(&Decimal::from(10)));
    }

    #[test]
    fn side_update_moves_between_books() {
        let mut repo = MemoryOrderRepository::new();
        repo.add(order(1, Side::Sell, 5, 10)).unwrap();
        repo.update(order(1, Side::Buy, 5, 10)).unwrap();

        assert!(
            repo.orders_by_side(Side::Sell, SortDirection::Ascending)
                .is_empty()
        );
        let bids = repo.orders_by_side(Side::Buy, SortDirection::Ascending);
        assert_eq!(ids(&bids), vec![1]);
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn remove_drops_empty_level() {
        let mut repo = MemoryOrderRepository::new();
        let resting = order(1, Side::Buy, 5, 10);
        repo.add(resting.clone()).unwrap();
        let removed = repo.remove(&resting).unwrap();
        assert_eq!(removed.quantity(), 5);
        assert!(repo.bids.is_empty());
        assert!(repo.is_empty());
    }

    #[test]
    fn removals_from_a_crowded_level_keep_links_intact() {
        let mut repo = MemoryOrderRepository::new();
        let orders: Vec<_> = (1..=10_000).map(|n| order(n, Side::Sell, 1, 10)).collect();
        for resting in &orders {
            repo.add(resting.clone()).unwrap();
        }

        // Head, tail and every other order in between.
        repo.remove(&orders[0]).unwrap();
        repo.remove(&orders[9_999]).unwrap();
        let middle: Vec<_> = orders[1..9_999].iter().step_by(2).cloned().collect();
        assert_eq!(repo.batch_remove(&middle), middle.len());

        let expected: Vec<u128> = (3..10_000).step_by(2).collect();
        let asks = repo.orders_by_side(Side::Sell, SortDirection::Ascending);
        assert_eq!(ids(&asks), expected);
        assert_eq!(repo.count(), expected.len());

        let level = &repo.asks[&Decimal::from(10)];
        let head = level.head.unwrap();
        let tail = level.tail.unwrap();
        assert_eq!(repo.orders[head].order.order_id().as_u128(), 3);
        assert_eq!(repo.orders[tail].order.order_id().as_u128(), 9_999);
        assert!(repo.orders[head].prev.is_none());
        assert!(repo.orders[tail].next.is_none());

        let rest = repo.orders_by_side(Side::Sell, SortDirection::Ascending);
        assert_eq!(repo.batch_remove(&rest), rest.len());
        assert!(repo.asks.is_empty());
        assert!(repo.orders.is_empty());
    }

    #[test]
    fn slots_are_reused_without_breaking_order() {
        let mut repo = MemoryOrderRepository::new();
        repo.add(order(1, Side::Buy, 1, 10)).unwrap();
        repo.add(order(2, Side::Buy, 1, 10)).unwrap();
        repo.remove(&order(1, Side::Buy, 1, 10)).unwrap();
        repo.add(order(3, Side::Buy, 1, 10)).unwrap();

        let bids = repo.orders_by_side(Side::Buy, SortDirection::Descending);
        assert_eq!(ids(&bids), vec![2, 3]);
    }
}
