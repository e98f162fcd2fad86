pub mod orderbook;

use serde::Serialize;

use crate::models::{Order, Quantity};

pub use orderbook::OrderBook;

/// Result of one matching round.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchOutcome {
    /// Orders consumed in full and removed from the book.
    pub matched: Vec<Order>,
    /// Matched parts of orders whose remainder stays in the book.
    pub partial: Vec<Order>,
}

impl MatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.partial.is_empty()
    }

    pub fn matched_quantity(&self) -> Quantity {
        self.matched.iter().map(Order::quantity).sum()
    }

    pub fn partial_quantity(&self) -> Quantity {
        self.partial.iter().map(Order::quantity).sum()
    }
}
