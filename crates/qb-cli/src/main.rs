use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qb_board::BoardState;
use qb_config::{
    load_layered_yaml, report_unused_keys, resolve_cookie, BoardConfig, ConfigConsumer,
    UnusedKeyPolicy,
};
use qb_runtime::{BoardMsg, BoardRuntime, Publisher, Sources, DEFAULT_BUS_CAPACITY};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

mod render;

#[derive(Parser)]
#[command(name = "qb")]
#[command(about = "Live quiz board CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the backend and print every board view as it changes
    Watch {
        /// Config paths in merge order (base -> overlay...)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Stop after this many milliseconds instead of waiting for ctrl-c
        #[arg(long)]
        exit_after_ms: Option<u64>,

        /// Reject configs that carry keys `watch` does not read
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Run the stream payload decoder on one raw message (stdin when omitted)
    Decode { payload: Option<String> },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlay...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Watch {
            config_paths,
            exit_after_ms,
            strict,
        } => watch(config_paths, exit_after_ms, strict).await?,

        Commands::Decode { payload } => {
            let raw = match payload {
                Some(p) => p,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read payload from stdin")?;
                    buf
                }
            };
            match qb_board::try_decode(raw.trim_end_matches(['\r', '\n'])) {
                Ok(event) => println!("{}", render::render_decoded(&event)),
                Err(err) => {
                    println!("event=null");
                    eprintln!("reason={err}");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

async fn watch(config_paths: Vec<String>, exit_after_ms: Option<u64>, strict: bool) -> Result<()> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = report_unused_keys(ConfigConsumer::Watch, &loaded.config_json, policy)?;
    if !unused.is_clean() {
        warn!(keys = ?unused.unused_leaf_pointers, "unused config keys");
    }
    let cfg = BoardConfig::from_config_json(&loaded.config_json)?;
    let cookie = resolve_cookie(&cfg);
    println!("config_hash={}", loaded.config_hash);

    let http = reqwest::Client::builder()
        .build()
        .context("http client build failed")?;
    let publisher = Publisher::new(BoardState::new().view(), DEFAULT_BUS_CAPACITY);
    let mut bus = publisher.subscribe();
    let runtime = BoardRuntime::spawn(Sources::connect(http, &cfg, &cookie), publisher);

    let deadline = async {
        match exit_after_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    warn!(error = %err, "ctrl-c handler failed");
                }
                break;
            }
            msg = bus.recv() => match msg {
                Ok(BoardMsg::View(view)) => print!("{}", render::render_view(&view)),
                Ok(BoardMsg::LogLine { level, msg }) => println!("log level={level} msg={msg}"),
                Ok(BoardMsg::Heartbeat { .. }) => {}
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "watcher lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    runtime.shutdown().await;
    Ok(())
}

/// Logs go to stderr; stdout carries the rendered board.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
