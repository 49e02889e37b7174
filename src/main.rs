use ag_dow_yield::backtest::load_sessions;
use ag_dow_yield::{
    BacktestEngine, DividendYieldRotation, FundamentalsProvider, MembershipTimeline,
    PaperExecution, RotationConfig, StaticFundamentals, StrategyParams,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[clap(name = "ag-dow-yield", about = "Dow 30 dividend-yield rotation")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print index members on a date, one per line
    Members {
        #[clap(long)]
        as_of: NaiveDate,
        /// Membership dataset (built-in Dow 30 history if omitted)
        #[clap(long)]
        membership: Option<PathBuf>,
    },
    /// Validate a membership dataset and list its events
    Events {
        #[clap(long)]
        membership: Option<PathBuf>,
    },
    /// Print the ranked selection for a date
    Select {
        #[clap(long)]
        as_of: NaiveDate,
        #[clap(long)]
        fundamentals: PathBuf,
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Run the rotation over recorded sessions and print the result as JSON
    Backtest {
        #[clap(short, long, default_value = "config/strategy.yaml")]
        config: PathBuf,
        #[clap(long)]
        fundamentals: PathBuf,
        #[clap(long)]
        prices: PathBuf,
        /// Strategy parameter override, `top_n=5` or `target_weight=0.2`
        #[clap(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

fn load_timeline(membership: Option<&Path>) -> Result<MembershipTimeline> {
    let timeline = match membership {
        Some(path) => {
            info!("Loading membership dataset from {:?}", path);
            MembershipTimeline::from_file(path)
                .with_context(|| format!("Failed to load membership dataset {:?}", path))?
        }
        None => ag_dow_yield::membership::dow30_timeline()?,
    };
    Ok(timeline)
}

fn load_config(path: Option<&Path>) -> Result<RotationConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            RotationConfig::from_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))
        }
        None => Ok(RotationConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Members { as_of, membership } => {
            let timeline = load_timeline(membership.as_deref())?;
            for security in timeline.members_as_of(as_of)? {
                println!("{}", security);
            }
        }
        Command::Events { membership } => {
            let timeline = load_timeline(membership.as_deref())?;
            timeline.validate()?;
            for event in timeline.events() {
                println!(
                    "{} {:<6} {}",
                    event.effective_date, event.action, event.security
                );
            }
            info!(
                events = timeline.len(),
                final_members = timeline.final_members()?.len(),
                "Membership dataset is consistent"
            );
        }
        Command::Select {
            as_of,
            fundamentals,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let timeline = config.load_timeline()?;
            let fundamentals = StaticFundamentals::from_file(&fundamentals)
                .with_context(|| format!("Failed to load fundamentals {:?}", fundamentals))?;

            let members = timeline.members_as_of(as_of)?;
            let selection = fundamentals.top_by_dividend_yield(&members, as_of, config.top_n)?;
            for (rank, ranked) in selection.iter().enumerate() {
                println!(
                    "{:>2} {:<6} {:>6.2}%",
                    rank + 1,
                    ranked.security,
                    100.0 * ranked.fundamentals.dividend_yield
                );
            }
        }
        Command::Backtest {
            config,
            fundamentals,
            prices,
            params,
        } => {
            let config = load_config(Some(&config))?;
            let fundamentals = StaticFundamentals::from_file(&fundamentals)
                .with_context(|| format!("Failed to load fundamentals {:?}", fundamentals))?;
            let sessions = load_sessions(&prices)
                .with_context(|| format!("Failed to load price sessions {:?}", prices))?;

            let mut overrides = StrategyParams::new();
            for (key, value) in params {
                overrides.set(key, value);
            }

            let strategy = DividendYieldRotation::from_config(config)?;
            let exec = Arc::new(Mutex::new(PaperExecution::new()));
            let mut engine = BacktestEngine::new(exec, Arc::new(fundamentals))
                .with_strategy_id("dow_yield");

            let result = engine
                .run_backtest(Box::new(strategy), sessions, overrides)
                .await
                .map_err(|e| {
                    if e.is_data_error() {
                        error!(error = %e, "Membership reference data rejected");
                    }
                    anyhow::Error::from(e)
                })?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
