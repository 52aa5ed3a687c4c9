//! turfwar -- territory scoring engine front end.
//!
//! Reads commands from stdin and writes one reply line per command to
//! stdout. Diagnostics go to stderr through `tracing`; set `RUST_LOG` to
//! control verbosity.
//!
//! Usage:
//!   turfwar [--config FILE]

use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use turfwar::config::{load_config, ScoringConfig};
use turfwar::engine::Engine;
use turfwar::protocol::parser::{parse_command, Command};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = match config_from_args() {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        tracing::error!("i/o failure: {}", e);
        process::exit(1);
    }
}

fn config_from_args() -> Result<ScoringConfig, String> {
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        None => Ok(ScoringConfig::default()),
        Some("--config") => {
            let path = args
                .get(2)
                .ok_or_else(|| "--config requires a file path".to_string())?;
            load_config(Path::new(path)).map_err(|e| e.to_string())
        }
        Some(other) => Err(format!("unknown argument: {}\nusage: turfwar [--config FILE]", other)),
    }
}

/// Runs the command loop until `quit` or end of input.
fn run(config: ScoringConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new(config);

    for line in stdin.lock().lines() {
        let line = line?;

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::IsReady => engine.handle_isready(&mut out)?,
            Command::Create {
                category,
                coordinates,
                name,
            } => engine.handle_create(&mut out, category, coordinates, &name)?,
            Command::Settle { id, requests } => engine.handle_settle(&mut out, &id, &requests)?,
            Command::Show { id, person } => engine.handle_show(&mut out, &id, person.as_ref())?,
            Command::List { person } => engine.handle_list(&mut out, person.as_ref())?,
            Command::Bonus { id, person } => engine.handle_bonus(&mut out, &id, &person)?,
            Command::Advance { by } => engine.handle_advance(&mut out, by)?,
            Command::Now => engine.handle_now(&mut out)?,
            Command::Quit => break,
        }
    }

    out.flush()
}
