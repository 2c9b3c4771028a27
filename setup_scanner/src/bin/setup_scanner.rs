use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use market_data_ingestor::providers::yahoo_chart::YahooChartProvider;
use setup_scanner::{
    config::{ScannerConfig, resolve_config},
    report::{self, ReportOptions},
    scanner::{ScanProgress, Scanner},
    session::run_scan,
    universe::{TtlCache, Universe, normalize_symbol, wikipedia::http_client},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const INDEX_PAGE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser)]
#[command(version, about = "High & tight baby-bar screener")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args)]
struct ConfigArg {
    /// Scanner config (TOML). Falls back to $SETUP_SCANNER_CONFIG, then built-in defaults.
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Scan the universe and print the best setups
    Scan {
        #[command(flatten)]
        cfg: ConfigArg,
        /// Tickers taken from the head of the universe
        #[arg(long, value_parser = clap::value_parser!(u16).range(50..=500))]
        max_tickers: Option<u16>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Score one ticker and print its scorecard, qualifying or not
    Score {
        symbol: String,
        #[command(flatten)]
        cfg: ConfigArg,
    },
    /// Print the resolved ticker universe
    Universe {
        #[command(flatten)]
        cfg: ConfigArg,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "setup_scanner=info,market_data_ingestor=info".into()),
        )
        .init();
}

fn build_scanner(config: &Arc<ScannerConfig>) -> Result<Scanner> {
    let provider = YahooChartProvider::with_config(config.yahoo_config()).context("build price provider")?;
    Ok(Scanner::new(Arc::new(provider), Arc::clone(config)))
}

fn build_universe(config: &ScannerConfig) -> Result<Universe> {
    let client = http_client(INDEX_PAGE_TIMEOUT).context("build index page client")?;
    let cache = Arc::new(TtlCache::new(config.universe.cache_ttl()));
    Ok(Universe::from_params(&config.universe, client, cache))
}

/// Logs every tenth of the scan.
fn progress_logger() -> impl FnMut(ScanProgress) {
    let mut last_decile = 0;
    move |p: ScanProgress| {
        let decile = (p.fraction() * 10.0).floor() as u32;
        if decile > last_decile {
            last_decile = decile;
            info!(processed = p.processed, total = p.total, "{}% scanned", decile * 10);
        }
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; finishing tickers already in flight");
            trigger.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Scan {
            cfg,
            max_tickers,
            json,
        } => {
            let mut config = resolve_config(cfg.config.as_deref())?;
            if let Some(n) = max_tickers {
                config.scan.max_tickers = usize::from(n);
                config.validate().context("invalid --max-tickers")?;
            }
            let config = Arc::new(config);
            let scanner = build_scanner(&config)?;
            let universe = build_universe(&config)?;
            let cancel = cancel_on_ctrl_c();

            let outcome = run_scan(&universe, &scanner, &cancel, progress_logger()).await?;
            if json {
                println!("{}", report::to_json(&outcome).context("serialize scan outcome")?);
            } else {
                print!("{}", report::render_outcome(&outcome, &ReportOptions::default()));
            }
        }
        Cmd::Score { symbol, cfg } => {
            let config = Arc::new(resolve_config(cfg.config.as_deref())?);
            let scanner = build_scanner(&config)?;
            let benchmark = scanner.benchmark().await?;
            let symbol = normalize_symbol(&symbol);

            match scanner.evaluate_ticker(&symbol, &benchmark).await {
                Ok(result) => {
                    let max_score = config.scoring.max_score();
                    print!(
                        "{}",
                        report::render_evaluation(&result, max_score, &ReportOptions::default())
                    );
                    let verdict = if result.qualifies(config.selection.min_score) {
                        "qualifies"
                    } else {
                        "below threshold"
                    };
                    println!("   {verdict} (threshold {})", config.selection.min_score);
                }
                Err(reason) => println!("{symbol}: skipped, {reason}"),
            }
        }
        Cmd::Universe { cfg } => {
            let config = resolve_config(cfg.config.as_deref())?;
            let universe = build_universe(&config)?;
            for symbol in universe.tickers().await.iter() {
                println!("{symbol}");
            }
        }
    }

    Ok(())
}
