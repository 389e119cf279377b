use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use morning_update::{
    Credentials, DigestConfig, DigestPipeline, Schedule, Scheduler, SmtpMailer, SystemClock,
    WeatherFetcher, YahooFinanceClient, logging,
};
use std::path::PathBuf;
use tracing::info;

/// Daily weekday email digest with current weather and stock quotes
#[derive(Parser, Debug)]
#[command(name = "morning-update", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single firing and exit instead of staying resident
    #[arg(long)]
    once: bool,

    /// Print the composed digest instead of sending it, then exit
    #[arg(long)]
    dry_run: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DigestConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    // Fail fast: a missing secret is a startup error, not a failed firing.
    let credentials = Credentials::from_env().context("Missing credentials")?;
    info!(
        "Morning Update {} for {} ({} symbols)",
        morning_update::VERSION,
        config.weather.location,
        config.quotes.symbols.len()
    );

    let schedule = Schedule::from_config(&config.schedule)?;
    let weather = WeatherFetcher::new(&config.weather)?;
    let quotes = YahooFinanceClient::new(&config.quotes)?;
    let mailer = SmtpMailer::new(&config.email, &credentials);
    let pipeline = DigestPipeline::new(&config, credentials, weather, quotes, mailer)?;

    if cli.dry_run {
        let report = pipeline.prepare(Utc::now());
        println!("To: {}", pipeline.recipient());
        println!("{}", report.digest);
        return Ok(());
    }

    if cli.once {
        pipeline.run(Utc::now());
        return Ok(());
    }

    info!(
        "Scheduled at {} {} on {:?}",
        schedule.at.format("%H:%M"),
        schedule.timezone,
        schedule.weekdays
    );

    let scheduler = Scheduler::new(schedule, SystemClock);
    scheduler.start(|| {
        pipeline.run(Utc::now());
    })
}
