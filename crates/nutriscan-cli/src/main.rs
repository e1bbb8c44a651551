//! `nutriscan` command-line entry point.
//!
//! Looks up each barcode given on the command line, or reads barcodes from
//! stdin one per line. Results go to stdout; notices and logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nutriscan::{Barcode, LoadingStage, NutriConfig, ProductSearch, SearchOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::EnvFilter;

mod render;

/// Look up packaged food by barcode on Open Food Facts.
#[derive(Parser, Debug)]
#[command(name = "nutriscan", author, version, about)]
struct Args {
    /// Barcodes to look up. Read from stdin when omitted.
    barcodes: Vec<String>,

    /// Print each final record as a JSON line
    #[arg(long)]
    json: bool,

    /// TOML config file (overrides NUTRISCAN_CONFIG_FILE)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "nutriscan={0},nutriscan_core={0},nutriscan_off={0},nutriscan_cache={0}",
            args.log_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Runs lookups and prints their results.
struct Runner {
    search: ProductSearch,
    json: bool,
    failures: usize,
}

impl Runner {
    async fn lookup(&mut self, input: &str) -> Result<()> {
        let barcode = Barcode::new(input);
        let mut state = self.search.subscribe();
        let mut notices = self.search.notices();

        let lookup = self.search.search(input);
        tokio::pin!(lookup);

        let outcome = loop {
            tokio::select! {
                outcome = &mut lookup => break outcome,
                Ok(()) = state.changed() => {
                    let current = state.borrow_and_update().clone();
                    if let (Some(partial), LoadingStage::Full) = (&current.result, current.stage) {
                        if !self.json {
                            eprintln!("{}", render::preview(partial));
                        }
                    }
                }
            }
        };

        loop {
            match notices.try_recv() {
                Ok(notice) => eprintln!("{barcode}: {notice}"),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        tracing::debug!(%barcode, ?outcome, "Lookup finished");

        match outcome {
            SearchOutcome::Cached(data)
            | SearchOutcome::Complete(data)
            | SearchOutcome::Partial(data) => {
                if self.json {
                    println!("{}", render::json(&barcode, &data)?);
                } else {
                    println!("{}", render::text(&data));
                }
            }
            SearchOutcome::NotFound | SearchOutcome::Failed => self.failures += 1,
            SearchOutcome::Ignored | SearchOutcome::Superseded => {}
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args);

    let config =
        NutriConfig::load_from(args.config.as_deref()).context("loading configuration")?;
    let search =
        ProductSearch::from_config(&config).context("configuring product search")?;

    let mut runner = Runner {
        search,
        json: args.json,
        failures: 0,
    };

    if args.barcodes.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("reading stdin")? {
            let input = line.trim();
            if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
                break;
            }
            runner.lookup(input).await?;
        }
    } else {
        for input in &args.barcodes {
            runner.lookup(input).await?;
        }
    }

    if runner.failures > 0 {
        tracing::info!(failures = runner.failures, "Some lookups did not succeed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
