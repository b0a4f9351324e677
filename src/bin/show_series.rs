use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use currency_report::config::CurrencyEndpoints;
use currency_report::fetcher::QuoteFetcher;
use currency_report::series::CurrencySeries;

#[derive(Parser)]
#[command(name = "show-series")]
#[command(about = "Fetch one currency and print its aligned series for the current month", long_about = None)]
struct Cli {
    /// Currency symbol (USD or EUR)
    #[arg(long, default_value = "USD")]
    currency: String,

    /// Print the series as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let fetcher = QuoteFetcher::new(CurrencyEndpoints::default());
    let cells = fetcher.fetch_cells(&cli.currency).await?;
    let series = CurrencySeries::from_cells(&cli.currency, &cells)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    println!("\n=== {} ({} days) ===", series.symbol, series.len());
    for ((date, rate), change) in series.dates.iter().zip(&series.rates).zip(&series.changes) {
        let change = change
            .map(|c| format!("{c:+.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!("  {date}: {rate:.4} ({change})");
    }
    println!("Raw cells: {}\n", cells.len());

    Ok(())
}
