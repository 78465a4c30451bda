//!  QPX Fare Watch
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! CLI for QPX fare searches with email notification.
//!
//! Exit codes: 0 notification sent, 1 configuration/transport/notification
//! failure, 2 unparseable response, 3 no results or unresolved references.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use qpx_fare_watch::{
    AppConfig, EmailNotifier, FareSearch, MissingReferencePolicy, QpxClient, QpxError,
    SearchOptions, SearchOutcome, SearchRequest, StdoutNotifier,
};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "qpx-fares")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Origin airport IATA code (e.g., GDL)
    #[arg(short = 'o', long)]
    origin: String,

    /// Destination airport IATA code (e.g., CUU)
    #[arg(short = 'd', long)]
    destination: String,

    /// Departure date (YYYY-MM-DD). Overrides --delay
    #[arg(short = 'x', long, conflicts_with = "delay")]
    date: Option<String>,

    /// Length of stay in days; searches a round trip when given
    #[arg(short = 'D', long)]
    duration: Option<u32>,

    /// Depart this many days from today
    #[arg(short = 't', long, default_value_t = 0)]
    delay: u32,

    /// Maximum number of trip options to return
    #[arg(short = 's', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    solutions: u32,

    /// Number of adult passengers
    #[arg(short = 'a', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    adults: u32,

    /// Maximum price with currency prefix (e.g., USD55000)
    #[arg(short = 'P', long = "maxprice")]
    max_price: String,

    /// Path to the JSON configuration file
    #[arg(short = 'c', long, default_value = "config.json")]
    config: PathBuf,

    /// What to print for codes missing from the response tables: fail, placeholder, carry-forward
    #[arg(long, default_value = "fail")]
    on_missing_reference: MissingReferencePolicy,

    /// Save the raw response under the configured home directory
    #[arg(long)]
    save_response: bool,

    /// Print the report to stdout instead of emailing it
    #[arg(long)]
    no_notify: bool,

    /// Verbose output
    #[arg(short = 'v', long, default_value = "false")]
    verbose: bool,
}

/// Configure logging based on verbosity level, RUST_LOG wins when set
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: CliArgs) -> Result<SearchOutcome, QpxError> {
    let config = AppConfig::load(&args.config)?;

    let mut builder = SearchRequest::builder(&args.origin, &args.destination, &args.max_price)
        .delay_days(args.delay)
        .duration_days(args.duration)
        .adults(args.adults)
        .solutions(args.solutions);
    if let Some(date) = &args.date {
        builder = builder.date(date);
    }
    let request = builder.build()?;

    let options = SearchOptions {
        missing_reference: args.on_missing_reference,
        save_response_to: args
            .save_response
            .then(|| config.response_dump_path(&request.origin, &request.destination)),
    };
    let transport = QpxClient::new(&config.qpx_url, &config.api_key)?;

    if args.no_notify {
        FareSearch::new(transport, StdoutNotifier, options)
            .run(&request)
            .await
    } else {
        let notifier = EmailNotifier::from_config(&config.notification)?;
        FareSearch::new(transport, notifier, options)
            .run(&request)
            .await
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    tracing::info!("Starting qpx-fares");
    tracing::debug!("Args: {:?}", args);

    match run(args).await {
        Ok(outcome) => {
            tracing::info!(
                "Done: {} trip options, subject {:?}",
                outcome.trip_count,
                outcome.notification.subject
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err.exit_code();
            tracing::error!("{:#}", anyhow::Error::new(err));
            ExitCode::from(code)
        }
    }
}
