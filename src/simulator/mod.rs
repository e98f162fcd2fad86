//! Market simulator: feeds random orders into a book round after round and
//! reports what each round matched.

pub mod generator;
pub mod report;

use std::time::Duration;

use tracing::info;

use crate::config::SimulatorConfig;
use crate::matching::OrderBook;
use crate::repository::OrderRepository;

pub use generator::OrderGenerator;
pub use report::RoundReport;

/// Adds one generated batch to the book, matches it and reports the round.
pub fn play_round<R: OrderRepository>(
    book: &mut OrderBook<R>,
    generator: &mut OrderGenerator,
    round: u64,
) -> anyhow::Result<RoundReport> {
    let batch = generator.next_batch()?;
    let added = batch.len();
    for order in batch {
        book.add(order)?;
    }
    let outcome = book.match_orders()?;
    let unmatched = book.repository().count();
    info!(
        round,
        added,
        matched = outcome.matched.len(),
        partial = outcome.partial.len(),
        unmatched,
        "round finished"
    );
    Ok(RoundReport {
        round,
        added,
        matched: outcome.matched,
        partial: outcome.partial,
        unmatched,
    })
}

/// Plays rounds until `config.rounds` is reached or Ctrl+C arrives, printing
/// each report to stdout. Returns the number of rounds played.
pub async fn run<R: OrderRepository>(
    book: &mut OrderBook<R>,
    config: &SimulatorConfig,
    json: bool,
) -> anyhow::Result<u64> {
    let mut generator = OrderGenerator::new(config)?;
    let interval = Duration::from_millis(config.interval_ms);
    let mut round = 0;
    loop {
        round += 1;
        let report = play_round(book, &mut generator, round)?;
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print!("{report}");
            println!("To interrupt simulation press Ctrl+C");
        }

        if config.rounds.is_some_and(|limit| round >= limit) {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!(round, "simulation interrupted");
                break;
            }
        }
    }
    Ok(round)
}
