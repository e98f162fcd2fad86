use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrderId = Uuid;
pub type Price = Decimal;
pub type Quantity = u64;
/// Seconds since the Unix epoch.
pub type Timestamp = f64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Side {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(Violation::UnknownSide),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("order_id is missing")]
    MissingId,
    #[error("order_id is not a valid uuid")]
    MalformedId,
    #[error("timestamp should be greater than 0")]
    NonPositiveTimestamp,
    #[error("side is missing")]
    MissingSide,
    #[error("side should be one of buy, sell")]
    UnknownSide,
    #[error("quantity is missing")]
    MissingQuantity,
    #[error("quantity should be greater than 0")]
    NonPositiveQuantity,
    #[error("price is missing")]
    MissingPrice,
    #[error("price should be greater than 0")]
    NonPositivePrice,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn contains(&self, violation: Violation) -> bool {
        self.violations.contains(&violation)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A resting intent to buy or sell `quantity` at `price`.
///
/// Two orders with the same id are the same logical order: equality, hashing
/// and ordering look at the id only, so a partially filled remainder still
/// compares equal to the order it replaced.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    order_id: OrderId,
    timestamp: Timestamp,
    side: Side,
    quantity: Quantity,
    price: Price,
}

impl Order {
    pub fn new(
        order_id: OrderId,
        timestamp: Timestamp,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();
        if !timestamp_is_valid(timestamp) {
            violations.push(Violation::NonPositiveTimestamp);
        }
        if quantity == 0 {
            violations.push(Violation::NonPositiveQuantity);
        }
        if price <= Decimal::ZERO {
            violations.push(Violation::NonPositivePrice);
        }
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }
        Ok(Self {
            order_id,
            timestamp,
            side,
            quantity,
            price,
        })
    }

    /// Builds an order stamped with the current time, read at every call.
    pub fn at_now(
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Result<Self, ValidationError> {
        Self::new(order_id, now_timestamp(), side, quantity, price)
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Splits off `matched` units, returning `(fragment, leftover)`. Both keep
    /// the id, side, price and timestamp of `self`.
    pub(crate) fn split(&self, matched: Quantity) -> (Order, Order) {
        debug_assert!(matched > 0 && matched < self.quantity);
        let fragment = Order {
            quantity: matched,
            ..self.clone()
        };
        let leftover = Order {
            quantity: self.quantity - matched,
            ..self.clone()
        };
        (fragment, leftover)
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.order_id == other.order_id
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.order_id.hash(state);
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_id.cmp(&other.order_id)
    }
}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.side, self.quantity, self.price, self.order_id
        )
    }
}

/// Untrusted order fields as they arrive from outside the crate. Every field
/// may be absent; `Order::try_from` reports all problems at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: Option<String>,
    pub timestamp: Option<Timestamp>,
    #[serde(alias = "order_type")]
    pub side: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Price>,
}

impl TryFrom<OrderRequest> for Order {
    type Error = ValidationError;

    fn try_from(value: OrderRequest) -> Result<Self, Self::Error> {
        let mut violations = Vec::new();

        let order_id = match value.order_id.as_deref() {
            None => {
                violations.push(Violation::MissingId);
                None
            }
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    violations.push(Violation::MalformedId);
                    None
                }
            },
        };

        let timestamp = value.timestamp.unwrap_or_else(now_timestamp);
        if !timestamp_is_valid(timestamp) {
            violations.push(Violation::NonPositiveTimestamp);
        }

        let side = match value.side.as_deref() {
            None => {
                violations.push(Violation::MissingSide);
                None
            }
            Some(raw) => match raw.parse::<Side>() {
                Ok(side) => Some(side),
                Err(violation) => {
                    violations.push(violation);
                    None
                }
            },
        };

        let quantity = match value.quantity {
            None => {
                violations.push(Violation::MissingQuantity);
                None
            }
            Some(qty) if qty <= 0 => {
                violations.push(Violation::NonPositiveQuantity);
                None
            }
            Some(qty) => Some(qty as Quantity),
        };

        let price = match value.price {
            None => {
                violations.push(Violation::MissingPrice);
                None
            }
            Some(price) if price <= Decimal::ZERO => {
                violations.push(Violation::NonPositivePrice);
                None
            }
            Some(price) => Some(price),
        };

        match (order_id, side, quantity, price) {
            (Some(order_id), Some(side), Some(quantity), Some(price)) if violations.is_empty() => {
                Order::new(order_id, timestamp, side, quantity, price)
            }
            _ => Err(ValidationError { violations }),
        }
    }
}

pub fn now_timestamp() -> Timestamp {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn timestamp_is_valid(timestamp: Timestamp) -> bool {
    timestamp.is_finite() && timestamp > 0.0
}
