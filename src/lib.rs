pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod repository;
pub mod simulator;

pub mod metrics;

pub use error::Error;
pub use matching::{MatchOutcome, OrderBook};
pub use models::{
    Order, OrderId, OrderRequest, Price, Quantity, Side, Timestamp, ValidationError, Violation,
};
pub use repository::{MemoryOrderRepository, OrderRepository, RepositoryError, SortDirection};
