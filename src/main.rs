use clap::{Args, Parser, Subcommand};
use konvert::application::rates::RateService;
use konvert::config::{
    DEFAULT_CRYPTO_URL, DEFAULT_FOREX_URL, DEFAULT_REFRESH_SECS, DEFAULT_TIMEOUT_SECS, RateSettings,
};
use konvert::domain::calculator::{Calculator, Transition, sanitize};
use konvert::domain::converter::Converter;
use konvert::domain::currency::CurrencyCode;
use konvert::domain::expression;
use konvert::domain::format::format_result;
use konvert::domain::rates::{RateOrigin, RateTable};
use konvert::infrastructure::fixed::FixedRates;
use konvert::infrastructure::http::{HttpCryptoPriceSource, HttpForexSource, build_client};
use konvert::interfaces::csv::history_writer::HistoryWriter;
use konvert::interfaces::csv::row_writer::RowWriter;
use konvert::interfaces::keys::parse_keys;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an arithmetic expression and print the result
    Eval {
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },
    /// Feed key presses into a calculator session
    ///
    /// Keys are digits, `.`, `+ - * x / × ÷`, `=`, `c`, or the named keys
    /// `Enter`, `Backspace`, `Clear` and `@N` (recall history entry N).
    Calc {
        #[arg(required = true, allow_hyphen_values = true)]
        keys: Vec<String>,

        /// Also print the calculation history as CSV
        #[arg(long)]
        history: bool,
    },
    /// Convert an amount once and print the rows as CSV
    Convert {
        #[command(flatten)]
        rows: RowArgs,

        #[command(flatten)]
        rates: RateArgs,

        /// Write the rows to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Keep converting as rates refresh, reprinting the rows every time
    Watch {
        #[command(flatten)]
        rows: RowArgs,

        #[command(flatten)]
        rates: RateArgs,

        /// Stop after this many refreshes instead of waiting for Ctrl-C
        #[arg(long)]
        ticks: Option<usize>,
    },
}

#[derive(Args)]
struct RowArgs {
    /// Amount of the base currency
    #[arg(allow_hyphen_values = true)]
    amount: String,

    /// Base currency code or alias (e.g. `EUR`, `euro`)
    base: CurrencyCode,

    /// Target currencies (defaults to the rest of the catalog)
    targets: Vec<CurrencyCode>,
}

#[derive(Args)]
struct RateArgs {
    /// Crypto price endpoint
    #[arg(long, env = "KONVERT_CRYPTO_URL", default_value = DEFAULT_CRYPTO_URL)]
    crypto_url: String,

    /// Forex endpoint quoting every rate against USD
    #[arg(long, env = "KONVERT_FOREX_URL", default_value = DEFAULT_FOREX_URL)]
    forex_url: String,

    /// Seconds between rate refreshes
    #[arg(long, env = "KONVERT_REFRESH_SECS", default_value_t = DEFAULT_REFRESH_SECS)]
    refresh_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "KONVERT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Use the built-in fallback rates and never touch the network
    #[arg(long)]
    offline: bool,
}

impl RateArgs {
    fn settings(&self) -> Result<RateSettings> {
        let settings = RateSettings {
            crypto_url: self.crypto_url.clone(),
            forex_url: self.forex_url.clone(),
            refresh_interval: Duration::from_secs(self.refresh_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        };
        settings.validate().into_diagnostic()?;
        Ok(settings)
    }

    fn service(&self, settings: &RateSettings) -> Result<RateService> {
        if self.offline {
            let fixed = FixedRates::from_table(&RateTable::fallback());
            let service = RateService::new(Box::new(fixed.clone()), Box::new(fixed));
            return Ok(service.with_origin(RateOrigin::Fallback));
        }

        let client = build_client(settings).into_diagnostic()?;
        Ok(RateService::new(
            Box::new(HttpForexSource::new(client.clone(), settings.forex_url.clone())),
            Box::new(HttpCryptoPriceSource::new(client, settings.crypto_url.clone())),
        ))
    }
}

impl RowArgs {
    fn converter(&self, rates: RateTable) -> Result<Converter> {
        let targets: Vec<CurrencyCode> = if self.targets.is_empty() {
            CurrencyCode::all().collect()
        } else {
            self.targets.clone()
        };
        let mut converter = Converter::with_rows(self.base, Decimal::ONE, &targets, rates);
        converter
            .set_base_amount_str(&self.amount)
            .into_diagnostic()?;
        Ok(converter)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Eval { expression } => {
            let value = expression::evaluate(&sanitize(&expression)).into_diagnostic()?;
            println!("{}", format_result(value));
        }
        Command::Calc { keys, history } => run_calc(&keys, history)?,
        Command::Convert {
            rows,
            rates,
            output,
        } => {
            let table = if rates.offline {
                RateTable::fallback()
            } else {
                let settings = rates.settings()?;
                rates.service(&settings)?.refresh().await
            };
            info!(origin = ?table.origin(), "converting");
            let converter = rows.converter(table)?;

            match output {
                Some(path) => {
                    let file = File::create(path).into_diagnostic()?;
                    RowWriter::new(file)
                        .write_rows(converter.rows())
                        .into_diagnostic()?;
                }
                None => {
                    let stdout = io::stdout();
                    RowWriter::new(stdout.lock())
                        .write_rows(converter.rows())
                        .into_diagnostic()?;
                }
            }
        }
        Command::Watch { rows, rates, ticks } => run_watch(rows, rates, ticks).await?,
    }

    Ok(())
}

fn run_calc(keys: &[String], history: bool) -> Result<()> {
    let mut calculator = Calculator::new();
    for key in keys {
        for input in parse_keys(key).into_diagnostic()? {
            match calculator.apply(input) {
                Transition::Evaluated(item) => debug!(%item, "evaluated"),
                Transition::Failed(err) => debug!(%err, "evaluation failed"),
                Transition::Updated | Transition::Ignored => {}
            }
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", calculator.display()).into_diagnostic()?;
    if let Some(last) = calculator.last_operation() {
        writeln!(out, "{last}").into_diagnostic()?;
    }
    if history {
        HistoryWriter::new(&mut out)
            .write_history(calculator.history().iter())
            .into_diagnostic()?;
    }
    Ok(())
}

async fn run_watch(rows: RowArgs, rates: RateArgs, ticks: Option<usize>) -> Result<()> {
    let settings = rates.settings()?;
    let mut converter = rows.converter(RateTable::fallback())?;
    let mut handle = rates.service(&settings)?.spawn(settings.refresh_interval);
    let mut refreshes = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            table = handle.next() => {
                let Some(table) = table else { break };
                info!(
                    origin = ?table.origin(),
                    fetched_at = %table.fetched_at(),
                    "rates refreshed"
                );
                converter.apply_rates(table);

                let stdout = io::stdout();
                let mut out = stdout.lock();
                RowWriter::new(&mut out)
                    .write_rows(converter.rows())
                    .into_diagnostic()?;
                out.flush().into_diagnostic()?;

                refreshes += 1;
                if ticks.is_some_and(|limit| refreshes >= limit) {
                    break;
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
