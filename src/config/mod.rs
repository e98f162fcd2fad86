use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub simulator: SimulatorConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    pub interval_ms: u64,
    pub min_orders: usize,
    pub max_orders: usize,
    pub max_quantity: u64,
    pub min_price: Decimal,
    pub max_price: Decimal,
    /// Stop after this many rounds; run until interrupted when unset.
    #[serde(default)]
    pub rounds: Option<u64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl SimulatorConfig {
    /// Price bounds in cents.
    pub fn price_cents(&self) -> anyhow::Result<(i64, i64)> {
        let to_cents = |price: Decimal| {
            (price * Decimal::ONE_HUNDRED)
                .round()
                .to_i64()
                .ok_or_else(|| anyhow::anyhow!("price {price} is out of range"))
        };
        Ok((to_cents(self.min_price)?, to_cents(self.max_price)?))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.min_orders <= self.max_orders, "min_orders exceeds max_orders");
        anyhow::ensure!(self.max_quantity > 0, "max_quantity should be greater than 0");
        let (min_cents, max_cents) = self.price_cents()?;
        anyhow::ensure!(min_cents > 0, "min_price should be at least 0.01");
        anyhow::ensure!(min_cents <= max_cents, "min_price exceeds max_price");
        Ok(())
    }
}

impl Settings {
    /// Defaults, then the optional file at `path`, then `MATCHBOOK__*`
    /// environment variables.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("simulator.interval_ms", 1000)?
            .set_default("simulator.min_orders", 15)?
            .set_default("simulator.max_orders", 30)?
            .set_default("simulator.max_quantity", 500)?
            .set_default("simulator.min_price", "0.10")?
            .set_default("simulator.max_price", "100.00")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?;
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("MATCHBOOK")
                .separator("__")
                .try_parsing(true),
        );
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.simulator.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_simulator() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.simulator.min_orders, 15);
        assert_eq!(settings.simulator.max_orders, 30);
        assert_eq!(settings.simulator.price_cents().unwrap(), (10, 10_000));
        assert_eq!(settings.simulator.rounds, None);
        assert!(!settings.log.json);
    }

    #[test]
    fn rejects_inverted_ranges() {
        let config = SimulatorConfig {
            interval_ms: 0,
            min_orders: 5,
            max_orders: 1,
            max_quantity: 1,
            min_price: Decimal::ONE,
            max_price: Decimal::from(2),
            rounds: None,
            seed: None,
        };
        assert!(config.validate().is_err());
    }
}
