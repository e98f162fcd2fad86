use std::fmt;

use serde::Serialize;

use crate::models::Order;

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round: u64,
    pub added: usize,
    pub matched: Vec<Order>,
    pub partial: Vec<Order>,
    pub unmatched: usize,
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(20);
        writeln!(f, "Round {}", self.round)?;
        writeln!(f, "{separator}")?;
        writeln!(f, "Matched orders:")?;
        for order in &self.matched {
            writeln!(f, "{order}")?;
        }
        writeln!(f, "{separator}")?;
        writeln!(f, "Partially matched orders:")?;
        for order in &self.partial {
            writeln!(f, "{order}")?;
        }
        writeln!(f, "{separator}")?;
        writeln!(f, "Summary:")?;
        writeln!(f, "Orders added: {}", self.added)?;
        writeln!(f, "Orders matched in full: {}", self.matched.len())?;
        writeln!(f, "Orders matched in part: {}", self.partial.len())?;
        writeln!(f, "Orders unmatched: {}", self.unmatched)?;
        writeln!(f, "{separator}")
    }
}
