//! Entry point for the reader.
//!
//! - Parse command-line arguments.
//! - Load user configuration (default `conf/config.toml`).
//! - Import the given files, then apply line commands read from stdin and
//!   print a JSON snapshot after each one.

use anyhow::{Context, Result, anyhow};
use flow_reader::app::{Command, EventLoop, Message, build_event_loop, parse_command};
use flow_reader::config::load_config;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

struct Args {
    config: PathBuf,
    files: Vec<PathBuf>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(&args.config);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %args.config.display(),
        level = %config.log_level,
        files = args.files.len(),
        "Starting reader"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    // The blocking HTTP client must be created and dropped outside the runtime.
    let mut event_loop = build_event_loop(config);
    let files = args.files;
    runtime.block_on(async {
        if !files.is_empty() {
            event_loop.dispatch(Message::OpenFiles(files));
            event_loop.run_until_idle().await;
        }
        print_snapshot(&event_loop)?;
        let result = command_loop(&mut event_loop).await;
        event_loop.shutdown();
        result
    })
}

async fn command_loop(event_loop: &mut EventLoop) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command")?;
        match parse_command(&line, event_loop.app()) {
            Ok(Command::Quit) => break,
            Ok(Command::Snapshot) => {}
            Ok(Command::Dispatch(messages)) => {
                for message in messages {
                    event_loop.dispatch(message);
                }
                event_loop.run_until_idle().await;
            }
            Err(err) => {
                warn!(command = %line.trim(), "{err:#}");
                continue;
            }
        }
        print_snapshot(event_loop)?;
    }
    Ok(())
}

fn print_snapshot(event_loop: &EventLoop) -> Result<()> {
    let json = serde_json::to_string(&event_loop.app().snapshot())
        .context("Failed to serialize snapshot")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write snapshot")?;
    stdout.flush().context("Failed to flush stdout")
}

fn parse_args() -> Result<Args> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut files = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("Usage: flow-reader [--config PATH] [FILES..]"))?;
                config = PathBuf::from(path);
            }
            "--help" | "-h" => {
                return Err(anyhow!("Usage: flow-reader [--config PATH] [FILES..]"));
            }
            _ => {
                let path = PathBuf::from(arg);
                if !path.exists() {
                    return Err(anyhow!("File not found: {}", path.display()));
                }
                files.push(path);
            }
        }
    }
    Ok(Args { config, files })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    info!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
