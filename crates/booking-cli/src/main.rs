//! `booking` -- inspect a master's availability and check bookings from the
//! command line.
//!
//! Inputs are JSON documents read from a file or, when no path is given, from
//! stdin. Results are printed as JSON on stdout; logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable               | Default | Description                      |
//! |------------------------|---------|----------------------------------|
//! | `BOOKING_SLOT_MINUTES` | `30`    | Slot length for `slots`          |
//! | `RUST_LOG`             | `booking=info,booking_engine=info` | Log filter |

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use booking_engine::{
    bookable_slots, compute_availability, validate, EngineConfig, EventDraft, ScheduleProfile,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "booking", version, about = "Master schedule availability and booking checks")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Working window and non-working days for one month
    Availability {
        /// Schedule profile JSON (stdin if omitted)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Month as YYYY-MM
        #[arg(short, long)]
        month: String,
    },

    /// Bookable slots on one day
    Slots {
        /// Schedule profile JSON (stdin if omitted)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Day as YYYY-MM-DD
        #[arg(short, long)]
        date: NaiveDate,

        /// Slot length; defaults to BOOKING_SLOT_MINUTES or 30
        #[arg(long)]
        slot_minutes: Option<u32>,
    },

    /// Validate and normalize an event draft
    Normalize {
        /// Event draft JSON (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking=info,booking_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("loading configuration")?;

    match cli.command {
        Command::Availability { profile, month } => {
            let profile: ScheduleProfile = read_json(profile.as_ref())?;
            let reference = parse_month(&month)?;
            let availability = compute_availability(&profile, reference);
            emit(&availability, cli.pretty)
        }
        Command::Slots {
            profile,
            date,
            slot_minutes,
        } => {
            let profile: ScheduleProfile = read_json(profile.as_ref())?;
            let minutes = slot_minutes.unwrap_or(config.slot_minutes);
            if minutes == 0 {
                anyhow::bail!("--slot-minutes must be positive");
            }
            let slots = bookable_slots(&profile, date, minutes);
            tracing::info!(%date, count = slots.len(), "slots listed");
            emit(&slots, cli.pretty)
        }
        Command::Normalize { input } => {
            let draft: EventDraft = read_json(input.as_ref())?;
            let record = validate(&draft)?;
            emit(&record, cli.pretty)
        }
    }
}

/// `YYYY-MM` → the first day of that month.
fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{s}', expected YYYY-MM"))
}

fn read_json<T: DeserializeOwned>(path: Option<&PathBuf>) -> Result<T> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parsing input JSON")
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}
