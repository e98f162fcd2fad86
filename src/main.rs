use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use matchbook::config::Settings;
use matchbook::metrics::install_recorder;
use matchbook::simulator;
use matchbook::{MemoryOrderRepository, OrderBook, OrderRepository};

#[derive(Parser, Debug)]
#[command(name = "matchbook", about = "Order book market simulator")]
struct Args {
    /// YAML settings file, e.g. config/simulator.yaml
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    rounds: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Print one JSON report per round instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if args.rounds.is_some() {
        settings.simulator.rounds = args.rounds;
    }
    if args.seed.is_some() {
        settings.simulator.seed = args.seed;
    }
    if let Some(interval_ms) = args.interval_ms {
        settings.simulator.interval_ms = interval_ms;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if settings.log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    let prom = install_recorder()?;

    if !args.json {
        println!("Welcome to market simulator");
    }
    let mut repository = MemoryOrderRepository::new();
    let mut book = OrderBook::new(&mut repository);
    let rounds = simulator::run(&mut book, &settings.simulator, args.json).await?;

    info!(rounds, resting = repository.count(), "simulation stopped");
    debug!(metrics = %prom.render(), "final metrics");
    Ok(())
}
