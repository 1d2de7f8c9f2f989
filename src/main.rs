//! Headless Duck Castle runner (default binary).
//!
//! Loads levels, plays move strings, and converts between glyph rows and level codes.
//! Logs go to stderr (filter via `CASTLE_LOG`, then `RUST_LOG`); results go to stdout.

use std::io::{self, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use duck_castle::cli::{parse_args, run};
use duck_castle::engine::EngineConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CASTLE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = parse_args(&args)?;
    let config = EngineConfig::from_env();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&invocation, &config, &mut out)?;
    out.flush()?;
    Ok(())
}
