use anyhow::Result;
use clap::Parser;
use signal_core::TradeType;

mod config;
mod executor;
mod orchestrator;
mod pipeline;

use config::AgentConfig;
use orchestrator::TradingOrchestrator;

#[derive(Parser)]
#[command(
    name = "trader-agent",
    about = "Rule-based signal aggregation for NSE options trading",
    version
)]
struct Cli {
    /// Symbol to analyze (e.g. NIFTY, BANKNIFTY)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Evaluate for the swing horizon instead of intraday
    #[arg(long)]
    swing: bool,

    /// Scan the configured symbol list for opportunities
    #[arg(long)]
    scan: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    let cli = Cli::parse();
    let config = AgentConfig::from_env();
    let orchestrator = TradingOrchestrator::new(config).await?;

    if let Some(symbol) = cli.symbol {
        let trade_type = if cli.swing {
            TradeType::Swing
        } else {
            TradeType::Intraday
        };
        orchestrator.analyze_symbol(&symbol, trade_type).await?;
    } else if cli.scan {
        orchestrator.run_scan().await?;
    } else {
        tracing::info!("No arguments given, running a demo pass on NIFTY");
        orchestrator
            .analyze_symbol("NIFTY", TradeType::Intraday)
            .await?;
    }

    Ok(())
}

fn init_tracing() {
    let json_logging = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }
}
