use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use currency_report::config::ReportConfig;
use currency_report::fetcher::QuoteFetcher;
use currency_report::notifier::{default_subject, Credentials, Notifier};
use currency_report::report::ReportComposer;

#[derive(Parser)]
#[command(name = "currency-report")]
#[command(about = "Mail this month's MOEX USD/EUR fixings as a spreadsheet", long_about = None)]
struct Cli {
    /// Sender address (prompted when omitted)
    #[arg(long)]
    sender: Option<String>,

    /// Recipient address (prompted when omitted)
    #[arg(long)]
    recipient: Option<String>,

    /// First currency; the cross-rate is second/first
    #[arg(long, default_value = "USD")]
    first: String,

    /// Second currency
    #[arg(long, default_value = "EUR")]
    second: String,

    /// Base of the report file name ({base}_{first}_{second}.xls)
    #[arg(long, default_value = "courses")]
    base: String,

    /// Directory to write the report into (default: current directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the report and stop without sending mail
    #[arg(long)]
    no_send: bool,
}

/// Ask on the terminal and read one line; input is echoed
fn prompt(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn credentials(cli: &Cli) -> io::Result<Credentials> {
    let sender = match &cli.sender {
        Some(sender) => sender.clone(),
        None => prompt("Введите электронный адрес отправителя:")?,
    };
    let recipient = match &cli.recipient {
        Some(recipient) => recipient.clone(),
        None => prompt("Введите электронный адрес получателя:")?,
    };
    let password = prompt("Введите пароль приложения:")?;

    Ok(Credentials {
        sender,
        recipient,
        password,
    })
}

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,currency_report=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    let config = ReportConfig {
        first_currency: cli.first.clone(),
        second_currency: cli.second.clone(),
        base_filename: cli.base.clone(),
        output_dir: cli.output_dir.clone(),
        ..ReportConfig::default()
    };
    info!(
        "Building {}/{} report from {} configured endpoints",
        config.first_currency,
        config.second_currency,
        config.endpoints.symbols().count()
    );

    let mut composer = ReportComposer::new(
        &config.first_currency,
        &config.second_currency,
        &config.base_filename,
    );
    if let Some(dir) = &config.output_dir {
        composer = composer.with_output_dir(dir);
    }

    let fetcher = QuoteFetcher::new(config.endpoints.clone());
    let path = composer.build(&fetcher).await?;
    info!("Report written to {}", path.display());

    if cli.no_send {
        info!("--no-send given, skipping mail");
        return Ok(());
    }

    let credentials = credentials(&cli)?;
    let notifier = Notifier::new(credentials, config.mail.clone());
    let subject = default_subject(&config.first_currency, &config.second_currency);
    notifier.send_report(&path, &subject).await?;

    Ok(())
}
