use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cardreader::{export, hasher, report, CardDecoder, DecoderConfig};

#[derive(Parser, Debug)]
#[command(name = "cardreader")]
#[command(about = "List the saves on a raw PlayStation memory card image")]
struct Args {
    /// The raw memory card file
    input: PathBuf,

    /// Print the decoded card as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Decoder config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the BIOS directory layout instead of the configured one
    #[arg(long)]
    retail: bool,

    /// Write icon frames as PNG files into this directory
    #[arg(long, value_name = "DIR")]
    export_icons: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<ExitCode> {
    let mut config = DecoderConfig::resolve(args.config.as_deref())?;
    if args.retail {
        config.frame = DecoderConfig::retail().frame;
    }

    let data = hasher::read_image(&args.input)?;
    let card = match CardDecoder::new(config).decode(&data) {
        Ok(card) => card,
        Err(e) => {
            error!("{}", e);
            eprintln!("The given file is not a memory card: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        let fingerprint = hasher::hash_bytes(&data);
        print!("{}", report::render_report(&card, Some(&fingerprint)));
    }

    if let Some(dir) = args.export_icons.as_deref() {
        let written = export::export_icons(&card, dir)?;
        info!("Wrote {} icon files", written.len());
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "cardreader=debug"
    } else {
        "cardreader=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
