use clap::Parser;
use gray_scott_core::{
    write_pgm, SimulationConfig, SimulationEngine, TickOutcome, WaitPolicy,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Gray-Scott reaction-diffusion demo without a display
#[derive(Parser, Debug)]
#[command(name = "gray-scott-demo")]
#[command(about = "Headless Gray-Scott reaction-diffusion run", long_about = None)]
struct Args {
    /// JSON file with a full simulation configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<usize>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<usize>,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Feed rate
    #[arg(short, long)]
    feed: Option<f64>,

    /// Kill rate
    #[arg(short, long)]
    kill: Option<f64>,

    /// Side of the central B seed square (0 = no seed)
    #[arg(long)]
    seed_size: Option<usize>,

    /// Resolution skip factor
    #[arg(long)]
    skip: Option<usize>,

    /// Per-tick wait budget in milliseconds (unbounded if omitted)
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 2000)]
    ticks: u64,

    /// Extra B drops scattered evenly over the run
    #[arg(short, long, default_value_t = 0)]
    drops: u64,

    /// Seed for drop positions
    #[arg(long, default_value_t = 42)]
    rng_seed: u64,

    /// Report interval in ticks
    #[arg(short, long, default_value_t = 200)]
    report_interval: u64,

    /// Write the final B field as a binary PGM image
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    config: SimulationConfig,
    workers: usize,
    ticks: u64,
    partial_ticks: u64,
    drops: u64,
    total_b: f64,
    max_b: f64,
    mean_tick_ms: f64,
    ticks_per_second: f64,
    wall_time_s: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let config = build_config(&args)?;

    println!("=== Gray-Scott Headless Demo ===\n");

    let mut engine = SimulationEngine::new(config)?;
    engine.initialize();
    let config = engine.config().clone();
    println!(
        "Grid {}x{}, {} workers, feed={:.4}, kill={:.4}, skip={}",
        config.width,
        config.height,
        engine.num_workers(),
        config.feed,
        config.kill,
        config.resolution_skip
    );

    let mut rng = StdRng::seed_from_u64(args.rng_seed);
    let drop_interval = if args.drops > 0 {
        (args.ticks / (args.drops + 1)).max(1)
    } else {
        0
    };
    let mut drops_done = 0;
    let mut partial_ticks = 0;
    let report_interval = args.report_interval.max(1);

    println!("\n  Tick | B mass      | Max B  | Ticks/s");
    println!("-------|-------------|--------|---------");

    let start = Instant::now();
    for _ in 0..args.ticks {
        let report = engine.step()?;
        if matches!(report.outcome, TickOutcome::Partial { .. }) {
            partial_ticks += 1;
        }

        if drops_done < args.drops && report.tick % drop_interval == 0 {
            let x = rng.random_range(0..config.width as i64);
            let y = rng.random_range(0..config.height as i64);
            engine.inject_at(x, y);
            drops_done += 1;
            info!("Drop {} at ({}, {}) after tick {}", drops_done, x, y, report.tick);
        }

        if report.tick % report_interval == 0 {
            println!(
                "{:6} | {:11.3} | {:6.4} | {:7.1}",
                report.tick,
                engine.field().total_b(),
                max_b(engine.snapshot_b()),
                engine.timer().ticks_per_second()
            );
        }
    }
    let wall_time = start.elapsed();

    let timer = engine.timer();
    let summary = RunSummary {
        config: config.clone(),
        workers: engine.num_workers(),
        ticks: engine.tick_count(),
        partial_ticks,
        drops: drops_done,
        total_b: engine.field().total_b(),
        max_b: max_b(engine.snapshot_b()),
        mean_tick_ms: timer.mean().as_secs_f64() * 1000.0,
        ticks_per_second: timer.ticks_per_second(),
        wall_time_s: wall_time.as_secs_f64(),
    };

    println!("\n=== Run Complete ===");
    println!("Ticks: {} ({} partial)", summary.ticks, summary.partial_ticks);
    println!("Final B mass: {:.3}", summary.total_b);
    println!(
        "Mean tick: {:.3} ms ({:.1} ticks/s)",
        summary.mean_tick_ms, summary.ticks_per_second
    );
    if summary.total_b == 0.0 {
        warn!("Pattern died out; all B has been consumed");
    }

    if let Some(path) = &args.output {
        let mut writer = BufWriter::new(File::create(path)?);
        write_pgm(&mut writer, engine.snapshot_b(), config.width, config.height)?;
        println!("Wrote B field to {}", path.display());
    }

    if let Some(path) = &args.summary {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
        println!("Wrote summary to {}", path.display());
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start from the JSON config (or defaults) and apply command-line overrides
fn build_config(args: &Args) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let config: SimulationConfig = serde_json::from_reader(File::open(path)?)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => SimulationConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    if let Some(feed) = args.feed {
        config.feed = feed;
    }
    if let Some(kill) = args.kill {
        config.kill = kill;
    }
    if let Some(seed_size) = args.seed_size {
        config.seed_size = seed_size;
    }
    if let Some(skip) = args.skip {
        config.resolution_skip = skip;
    }
    if let Some(budget_ms) = args.budget_ms {
        config.wait_policy = WaitPolicy::Bounded { budget_ms };
    }

    config.validate()?;
    Ok(config)
}

fn max_b(snapshot: &[f64]) -> f64 {
    snapshot.iter().copied().fold(0.0, f64::max)
}
