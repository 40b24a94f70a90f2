use std::env;
use std::error::Error;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use tagcycle::catalog::DEFAULT_CATALOG;
use tagcycle::config::Config;
use tagcycle::controller;
use tagcycle::display::TermDisplay;
use tagcycle::emulator::{Emulator, ToneEmulator, TraceEmulator};
use tagcycle::input::TerminalKeys;
use tagcycle::CycleError;

const LOG_FILE: &str = "tagcycle.log";

fn main() -> Result<(), Box<dyn Error>> {
    // NB. keep the guard until main returns, or buffered lines are lost
    let _log_guard = init_tracing();

    // initialise
    let config = Config::default();
    let mut emulator: Box<dyn Emulator> = match ToneEmulator::probe() {
        Ok(tone) => Box::new(tone),
        Err(e) => {
            tracing::warn!(error = %e, "no speaker, only logging emissions");
            Box::new(TraceEmulator::new())
        }
    };
    let display = TermDisplay::new().map_err(|e| CycleError::startup("terminal", e))?;

    let summary = controller::run(
        &config,
        DEFAULT_CATALOG,
        display,
        TerminalKeys,
        emulator.as_mut(),
    )?;
    // terminal is ours again by now
    println!(
        "stopped after {} ticks ({} identifier changes); log in {}",
        summary.ticks,
        summary.advances,
        log_path().display()
    );
    Ok(())
}

fn log_path() -> PathBuf {
    env::temp_dir().join(LOG_FILE)
}

// the UI owns the terminal, so logs go to a file instead
fn init_tracing() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(env::temp_dir(), LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    guard
}
