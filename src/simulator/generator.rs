use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use uuid::Builder;

use crate::config::SimulatorConfig;
use crate::models::{Order, OrderId, Quantity, Side, ValidationError};

/// Random limit orders for the simulator. Seeded generators are fully
/// reproducible, ids included.
pub struct OrderGenerator {
    rng: StdRng,
    orders_per_round: RangeInclusive<usize>,
    quantity: RangeInclusive<Quantity>,
    price_cents: RangeInclusive<i64>,
}

impl OrderGenerator {
    pub fn new(config: &SimulatorConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let (min_cents, max_cents) = config.price_cents()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            orders_per_round: config.min_orders..=config.max_orders,
            quantity: 1..=config.max_quantity,
            price_cents: min_cents..=max_cents,
        })
    }

    pub fn next_batch(&mut self) -> Result<Vec<Order>, ValidationError> {
        let count = self.rng.gen_range(self.orders_per_round.clone());
        (0..count).map(|_| self.next_order()).collect()
    }

    pub fn next_order(&mut self) -> Result<Order, ValidationError> {
        let order_id = self.next_id();
        let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let quantity = self.rng.gen_range(self.quantity.clone());
        let price = Decimal::new(self.rng.gen_range(self.price_cents.clone()), 2);
        Order::at_now(order_id, side, quantity, price)
    }

    fn next_id(&mut self) -> OrderId {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        Builder::from_random_bytes(bytes).into_uuid()
    }
}
