//! Replays a recorded level 2 feed and prints every best bid/offer change.
//!
//! Run with:
//!
//! ```text
//! cargo run --example replay -- \
//!     quotebook/examples/data/products.json \
//!     quotebook/examples/data/feed.jsonl \
//!     BTC-EUR ETH-EUR
//! ```
//!
//! Set `RUST_LOG=debug` to see per-operation timings.

use quotebook::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("usage: replay <products.json> <feed.jsonl> <PRODUCT>...");
        return ExitCode::from(2);
    }

    match run(&args[0], &args[1], &args[2..]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[Replay] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(catalog: &str, feed: &str, products: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let instruments = Catalog::load(catalog)?.resolve(products)?;
    let recorder = LatencyRecorder::new()?;

    let handler = MarketDataHandler::builder()
        .instruments(instruments)
        .observer(FnObserver::new(|id: &str, bbo: &Bbo| {
            println!("{id}: {bbo}");
        }))
        .instrumentation(recorder.clone())
        .build()?;

    let mut processor = FeedProcessor::new(handler);
    let counts = processor.replay(BufReader::new(File::open(feed)?))?;

    let stats = processor.handler().stats();
    println!();
    println!(
        "Total events received: {} ({} snapshots, {} updates, {} ignored, {} rejected)",
        counts.total, counts.snapshots, counts.updates, counts.ignored, counts.rejected
    );
    println!("BBO changes published: {}", stats.bbo_changes);

    for op in [Operation::Snapshot, Operation::Update] {
        if let Some(latency) = recorder.stats(op) {
            println!(
                "{op}: n={} p50={:?} p99={:?} max={:?}",
                latency.count, latency.median, latency.p99, latency.max
            );
        }
    }
    Ok(())
}
