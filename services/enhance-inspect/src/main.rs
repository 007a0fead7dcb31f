//! enhance-inspect: print the conversion summary and values of manifest variables.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cdm_enhance::EnhanceConfig;
use enhance_inspect::{inspect, Manifest};

#[derive(Parser, Debug)]
#[command(name = "enhance-inspect")]
#[command(about = "Show how packed variables are unpacked and masked")]
struct Args {
    /// JSON manifest of variables
    manifest: PathBuf,

    /// Only inspect this variable
    #[arg(short, long)]
    variable: Option<String>,

    /// Section to read, e.g. "0:1,2:10:2"
    #[arg(short, long, requires = "variable")]
    section: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let manifest = Manifest::load(&args.manifest)?;
    let dataset = manifest.into_dataset(EnhanceConfig::from_env())?;

    let handles = match &args.variable {
        Some(name) => vec![dataset
            .find(name)
            .ok_or_else(|| anyhow!("no variable named '{name}'"))?],
        None => dataset.handles().collect(),
    };
    info!(count = handles.len(), "inspecting variables");

    let mut inspections = Vec::with_capacity(handles.len());
    for handle in handles {
        let inspection = inspect(&dataset, handle, args.section.as_deref())
            .with_context(|| format!("failed to inspect variable {handle}"))?;
        inspections.push(inspection);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inspections)?);
    } else {
        for inspection in &inspections {
            print!("{inspection}");
        }
    }

    Ok(())
}
