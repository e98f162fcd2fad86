use tracing::trace;

use crate::models::{Order, OrderId, Side};

pub mod memory;

pub use memory::MemoryOrderRepository;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("order {0} is already in repository")]
    AlreadyExists(OrderId),
    #[error("order {0} is not found")]
    NotFound(OrderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Storage for resting orders, keyed by order id.
///
/// Snapshots returned by the query methods are copies; mutating them never
/// touches stored state.
pub trait OrderRepository {
    /// Fails with `AlreadyExists` when the id is already stored.
    fn add(&mut self, order: Order) -> Result<(), RepositoryError>;

    /// Replaces the stored order with the same id.
    fn update(&mut self, order: Order) -> Result<(), RepositoryError>;

    /// Removes the stored order with the same id and hands it back.
    fn remove(&mut self, order: &Order) -> Result<Order, RepositoryError>;

    /// Removes every order that is still present and returns how many were
    /// removed. Orders that are already gone are skipped.
    fn batch_remove(&mut self, orders: &[Order]) -> usize {
        let mut removed = 0;
        for order in orders {
            match self.remove(order) {
                Ok(_) => removed += 1,
                Err(err) => trace!(%err, "batch remove skipped order"),
            }
        }
        removed
    }

    fn get(&self, order_id: OrderId) -> Option<Order>;

    fn contains(&self, order_id: OrderId) -> bool {
        self.get(order_id).is_some()
    }

    /// Orders on `side`, sorted by price in `direction`. Orders sharing a
    /// price come back in arrival order.
    fn orders_by_side(&self, side: Side, direction: SortDirection) -> Vec<Order>;

    /// Every resting order: asks ascending, then bids descending.
    fn orders(&self) -> Vec<Order>;

    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl<T: OrderRepository + ?Sized> OrderRepository for &mut T {
    fn add(&mut self, order: Order) -> Result<(), RepositoryError> {
        (**self).add(order)
    }

    fn update(&mut self, order: Order) -> Result<(), RepositoryError> {
        (**self).update(order)
    }

    fn remove(&mut self, order: &Order) -> Result<Order, RepositoryError> {
        (**self).remove(order)
    }

    fn batch_remove(&mut self, orders: &[Order]) -> usize {
        (**self).batch_remove(orders)
    }

    fn get(&self, order_id: OrderId) -> Option<Order> {
        (**self).get(order_id)
    }

    fn contains(&self, order_id: OrderId) -> bool {
        (**self).contains(order_id)
    }

    fn orders_by_side(&self, side: Side, direction: SortDirection) -> Vec<Order> {
        (**self).orders_by_side(side, direction)
    }

    fn orders(&self) -> Vec<Order> {
        (**self).orders()
    }

    fn count(&self) -> usize {
        (**self).count()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }
}
