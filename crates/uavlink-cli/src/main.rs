//! uavlink: inspect object definitions and decode telemetry objects and
//! their metadata from the command line.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use uavlink_objects::{AccessMode, ObjectRegistry, UpdateMode};

mod commands;
mod config;
mod definitions;

use commands::{EncodeRequest, Format};
use config::CliConfig;

/// Telemetry object inspection tool.
#[derive(Parser, Debug)]
#[command(name = "uavlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of JSON object definitions (overrides UAVLINK_DEFINITIONS).
    #[arg(long, global = true)]
    definitions: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the defined objects
    List,
    /// Show the fields and default metadata of an object
    Describe {
        /// Object name or id (decimal or 0x hex)
        object: String,
    },
    /// Decode the wire form of an object
    Decode {
        /// Object name or id; odd ids and `…MetaData` names select metadata
        object: String,
        /// Encoded bytes as hex
        hex: String,
    },
    /// Work with standalone metadata records
    Metadata {
        #[command(subcommand)]
        action: MetadataCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MetadataCommand {
    /// Decode a 19-byte metadata record
    Decode {
        /// Encoded bytes as hex
        hex: String,
    },
    /// Encode a metadata record and print it as hex
    Encode(EncodeArgs),
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Flight-side access (rw, ro, wo)
    #[arg(long)]
    flight_access: Option<AccessMode>,
    /// Ground-side access (rw, ro, wo)
    #[arg(long)]
    gcs_access: Option<AccessMode>,
    /// Acknowledge flight-side updates
    #[arg(long)]
    flight_acked: bool,
    /// Acknowledge ground-side updates
    #[arg(long)]
    gcs_acked: bool,
    /// Flight-side update mode (periodic, onchange, manual, never)
    #[arg(long)]
    flight_mode: Option<UpdateMode>,
    /// Ground-side update mode
    #[arg(long)]
    gcs_mode: Option<UpdateMode>,
    /// Flight-side update period in ms
    #[arg(long, value_name = "MS")]
    flight_period: Option<u32>,
    /// Ground-side update period in ms
    #[arg(long, value_name = "MS")]
    gcs_period: Option<u32>,
    /// Logging update mode
    #[arg(long)]
    logging_mode: Option<UpdateMode>,
    /// Logging period in ms
    #[arg(long, value_name = "MS")]
    logging_period: Option<u32>,
}

impl From<EncodeArgs> for EncodeRequest {
    fn from(args: EncodeArgs) -> Self {
        Self {
            flight_access: args.flight_access,
            gcs_access: args.gcs_access,
            flight_acked: args.flight_acked,
            gcs_acked: args.gcs_acked,
            flight_mode: args.flight_mode,
            gcs_mode: args.gcs_mode,
            flight_period: args.flight_period,
            gcs_period: args.gcs_period,
            logging_mode: args.logging_mode,
            logging_period: args.logging_period,
        }
    }
}

fn load_registry(config: &CliConfig) -> Result<ObjectRegistry> {
    let definitions = definitions::load_dir(&config.definitions_dir)?;
    Ok(ObjectRegistry::from_definitions(definitions)?)
}

fn run(cli: Cli, config: &CliConfig) -> Result<String> {
    let format = if cli.json { Format::Json } else { Format::Text };
    match cli.command {
        Commands::List => commands::list(&load_registry(config)?, format),
        Commands::Describe { object } => {
            commands::describe(&load_registry(config)?, &object, format)
        }
        Commands::Decode { object, hex } => {
            commands::decode(&load_registry(config)?, &object, &hex, format)
        }
        Commands::Metadata { action } => match action {
            MetadataCommand::Decode { hex } => commands::metadata_decode(&hex, format),
            MetadataCommand::Encode(args) => commands::metadata_encode(&args.into(), format),
        },
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_env().with_definitions_dir(cli.definitions.clone());

    // Structured logging on stderr; RUST_LOG wins over UAVLINK_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(definitions = %config.definitions_dir.display(), "starting");
    let output = run(cli, &config)?;
    println!("{}", output.trim_end());
    Ok(())
}
