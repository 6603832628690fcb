//! ecocalc - Command Line Interface
//!
//! This is the main entry point for the economy calculator.
//! Run with `--help` to see all available options.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecocalc::{
    data::load_economy_file,
    display::{display_report, report_to_csv, report_to_json, CardinalityFormat, DisplayPreferences, Report},
    models::RateUnit,
    numeric::{parse_rational, Rational},
    resolver::{ComputationMode, RecipeResolver, ResolverOptions},
    specifier::ProductionSpecifier,
};

/// Output format of the resolved production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Command-line arguments for ecocalc.
#[derive(Parser, Debug)]
#[command(name = "ecocalc")]
#[command(author, version, about = "Economy calculation for factory-building games", long_about = None)]
struct Args {
    /// Economy definition file (JSON)
    #[arg(short, long, value_name = "FILE")]
    economy_definition: PathBuf,

    /// Compute production rates or production counts
    #[arg(short = 'm', long, value_enum, default_value_t = ComputationMode::Rate)]
    computation_mode: ComputationMode,

    /// Unit of production rates
    #[arg(short = 'u', long, value_enum, default_value_t = RateUnit::UnitsPerMinute)]
    rate_unit: RateUnit,

    /// How facility counts are displayed
    #[arg(short = 'f', long, value_enum, default_value_t = CardinalityFormat::Ceil)]
    cardinality_format: CardinalityFormat,

    /// Only use production entity variants enabled in this tier
    #[arg(short, long)]
    tier: Option<String>,

    /// Treat this resource as a base input even if a recipe produces it
    #[arg(short, long = "stop", value_name = "RESOURCE")]
    stop: Vec<String>,

    /// Multiply the resolved production by this value (e.g. 2, 1.5 or 3/4)
    #[arg(short = 'x', long, value_name = "VALUE")]
    multiply: Option<String>,

    /// Scale the production so every facility count is a whole number
    #[arg(short, long)]
    round_up: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Increase verbosity (can be given multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Production specifiers, e.g. "2:yellow_belt iron_plate" or "30 gear @assembler"
    #[arg(required = true, value_name = "PROD_SPECIFIER")]
    prod_specifier: Vec<String>,
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_multiplier(text: &str) -> Result<Rational> {
    parse_rational(text).ok_or_else(|| anyhow!("invalid multiplier \"{}\"", text))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let economy = load_economy_file(&args.economy_definition).with_context(|| {
        format!(
            "failed to load economy definition {}",
            args.economy_definition.display()
        )
    })?;

    let specifiers = args
        .prod_specifier
        .iter()
        .map(|text| {
            ProductionSpecifier::parse(text, &economy)
                .with_context(|| format!("invalid production specifier \"{}\"", text))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut options = ResolverOptions::new(args.computation_mode)
        .with_rate_unit(args.rate_unit)
        .with_stop_resources(args.stop.iter().cloned());
    options.tier = args.tier.clone();

    let resolver = RecipeResolver::new(&economy, options)?;
    let mut sum = resolver.resolve(&specifiers)?;

    let mut factor: Option<Rational> = None;
    if let Some(multiply) = &args.multiply {
        let value = parse_multiplier(multiply)?;
        sum.multiply(&value)?;
        factor = Some(value);
    }
    if args.round_up {
        let rounding = sum.round_up_to_integral();
        info!(factor = %rounding, "scaled to whole facility counts");
        factor = Some(match factor {
            Some(value) => value * rounding,
            None => rounding,
        });
    }

    let prefs = DisplayPreferences::new(args.computation_mode, args.rate_unit, args.cardinality_format);
    let mut report = Report::new(&sum, &economy, &prefs);
    if let Some(factor) = &factor {
        report = report.with_scale_factor(factor);
    }

    match args.output {
        OutputFormat::Text => {
            println!("ecocalc - Economy Calculator");
            println!("================================================================");
            println!();
            println!("Configuration:");
            println!("  Economy:         {}", args.economy_definition.display());
            println!("  Mode:            {:?}", args.computation_mode);
            if args.computation_mode == ComputationMode::Rate {
                println!("  Rate Unit:       {}", prefs.suffix());
            }
            if let Some(tier) = &args.tier {
                println!("  Tier:            {}", tier);
            }
            for specifier in &specifiers {
                println!("  Request:         {}", specifier);
            }
            display_report(&report);
        }
        OutputFormat::Json => println!("{}", report_to_json(&report)?),
        OutputFormat::Csv => print!("{}", report_to_csv(&report)?),
    }

    Ok(())
}
