mod config;

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use slot_resolver::{
    check_booking, compute_slots_on, parse_date, today_in, AvailabilityPayload,
    AvailabilityWindow, BookingPolicy, BookingRequest, SlotFilter, TimeSlot,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Resolve bookable tutor session slots from an availability payload"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the slots a tutor offers on a date
    List(ListArgs),
    /// Check whether a session can be booked at a given time
    Check(CheckArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Availability payload JSON (file path, or `-` for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Date to resolve (YYYY-MM-DD)
    #[arg(short, long)]
    date: String,

    /// Slot length in minutes [default: SLOTS_DEFAULT_DURATION or 60]
    #[arg(long)]
    duration: Option<i64>,

    /// Treat this date (YYYY-MM-DD) as today for the booking horizon
    #[arg(long)]
    today: Option<String>,

    /// Do not enforce the booking horizon
    #[arg(long)]
    no_horizon: bool,
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Include booked slots, marked unavailable
    #[arg(long)]
    all: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Requested start time (HH:MM)
    #[arg(short, long)]
    time: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Command::List(args) => run_list(args, &config),
        Command::Check(args) => run_check(args, &config),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "slots=warn,slot_resolver=warn".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run_list(args: ListArgs, config: &Config) -> Result<()> {
    let query = prepare(&args.query, config)?;
    let filter = if args.all {
        SlotFilter::All
    } else {
        SlotFilter::OpenOnly
    };

    let slots = compute_slots_on(
        &query.windows,
        query.date,
        query.duration,
        &query.payload.booked_times(),
        filter,
    )?;
    info!(date = %query.date, count = slots.len(), "resolved slots");

    print!("{}", render(&slots, filter, args.format)?);
    Ok(())
}

fn run_check(args: CheckArgs, config: &Config) -> Result<()> {
    let query = prepare(&args.query, config)?;
    let request = BookingRequest::parse(&args.query.date, &args.time, query.duration)?;
    check_booking(&query.windows, &request, &query.payload.booked_times())?;
    println!("ok");
    Ok(())
}

/// Inputs shared by every subcommand once validated.
struct Query {
    payload: AvailabilityPayload,
    windows: Vec<AvailabilityWindow>,
    date: NaiveDate,
    duration: i64,
}

fn prepare(args: &QueryArgs, config: &Config) -> Result<Query> {
    let date = parse_date(&args.date)?;
    let duration = args.duration.unwrap_or(config.default_duration);

    if !args.no_horizon {
        let today = match &args.today {
            Some(today) => parse_date(today).context("--today")?,
            None => today_in(&config.timezone, Utc::now())?,
        };
        let policy = BookingPolicy {
            horizon_days: config.horizon_days,
            allow_same_day: config.allow_same_day,
        };
        policy.check_date(date, today)?;
    }

    let payload = read_payload(&args.input)?;
    let windows = payload.windows()?;
    debug!(
        windows = windows.len(),
        booked = payload.existing_sessions.len(),
        "loaded payload"
    );

    Ok(Query {
        payload,
        windows,
        date,
        duration,
    })
}

fn read_payload(input: &str) -> Result<AvailabilityPayload> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))?
    };
    Ok(AvailabilityPayload::from_json(&text)?)
}

fn render(slots: &[TimeSlot], filter: SlotFilter, format: Format) -> Result<String> {
    let out = match (format, filter) {
        (Format::Json, SlotFilter::All) => serde_json::to_string_pretty(slots)?,
        (Format::Json, SlotFilter::OpenOnly) => {
            let times: Vec<String> = slots.iter().map(TimeSlot::label).collect();
            serde_json::to_string_pretty(&times)?
        }
        (Format::Text, _) => {
            return Ok(slots
                .iter()
                .map(|slot| {
                    if slot.available {
                        format!("{}\n", slot.label())
                    } else {
                        format!("{} (booked)\n", slot.label())
                    }
                })
                .collect());
        }
    };
    Ok(out + "\n")
}
