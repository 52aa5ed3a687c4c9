//! Territory load simulation CLI.
//!
//! Settles batches of random mission rewards against in-memory territories
//! and prints a JSON report.
//!
//! Usage:
//!   cargo run --release --bin simulate -- [OPTIONS]
//!
//! Options:
//!   --territories N  Number of territories (default: 20)
//!   --hours H        Simulated hours (default: 72)
//!   --missions N     Mission completions per hour (default: 200)
//!   --max-request P  Largest request per team (default: 40)
//!   --threads N      Worker threads (default: 4)
//!   --seed N         Random seed, 0 for entropy (default: 0)
//!   --config FILE    Scoring configuration JSON
//!   --quiet          Suppress progress output

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use turfwar::config::{load_config, ScoringConfig};
use turfwar::simulate::{run_simulation, SimulationConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut sim = SimulationConfig::default();
    let mut scoring = ScoringConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--territories" => {
                i += 1;
                sim.territories = value(&args, i).parse().expect("invalid --territories value");
            }
            "--hours" => {
                i += 1;
                sim.hours = value(&args, i).parse().expect("invalid --hours value");
            }
            "--missions" => {
                i += 1;
                sim.missions_per_hour = value(&args, i).parse().expect("invalid --missions value");
            }
            "--max-request" => {
                i += 1;
                sim.max_request = value(&args, i).parse().expect("invalid --max-request value");
            }
            "--threads" => {
                i += 1;
                sim.threads = value(&args, i).parse().expect("invalid --threads value");
            }
            "--seed" => {
                i += 1;
                sim.seed = value(&args, i).parse().expect("invalid --seed value");
            }
            "--config" => {
                i += 1;
                scoring = load_config(Path::new(value(&args, i))).unwrap_or_else(|e| {
                    eprintln!("{}", e);
                    std::process::exit(1);
                });
            }
            "--quiet" => {
                sim.quiet = true;
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let start = Instant::now();
    let report = match run_simulation(&sim, scoring) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    if !sim.quiet {
        eprintln!(
            "Settled {} missions ({} failed) in {:.2}s",
            report.settlements,
            report.failed,
            start.elapsed().as_secs_f64()
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &report).expect("failed to write report");
    writeln!(out).expect("failed to write report");
}

fn value(args: &[String], i: usize) -> &str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("missing value for {}", args[i - 1]);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: simulate [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --territories N  Number of territories (default: 20)");
    eprintln!("  --hours H        Simulated hours (default: 72)");
    eprintln!("  --missions N     Mission completions per hour (default: 200)");
    eprintln!("  --max-request P  Largest request per team (default: 40)");
    eprintln!("  --threads N      Worker threads (default: 4)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --config FILE    Scoring configuration JSON");
    eprintln!("  --quiet          Suppress progress output");
    eprintln!("  --help           Show this help");
}
