//! Audit a barèmes directory and report anomalies as CSV
//!
//! Exits with status 1 when at least one CRITIQUE anomaly is found, so it can
//! gate a barème update in CI.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use simulateurs::baremes::{auditer, loader::DEFAULT_BAREMES_PATH, Gravite};
use simulateurs::Baremes;

#[derive(Debug, Parser)]
#[command(name = "audit_baremes", about = "Check a set of barèmes for inconsistencies")]
struct Args {
    /// Directory holding the barème CSV files
    #[arg(long, default_value = DEFAULT_BAREMES_PATH)]
    baremes: PathBuf,
    /// Expected vintage
    #[arg(long, default_value_t = 2026)]
    annee: u16,
    /// Audit the embedded barèmes instead of a directory
    #[arg(long)]
    embarques: bool,
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let args = Args::parse();
    let baremes = if args.embarques {
        Baremes::officiels_2026()
    } else {
        Baremes::from_csv_path(&args.baremes)
            .with_context(|| format!("loading barèmes from {}", args.baremes.display()))?
    };

    let anomalies = auditer(&baremes, args.annee);
    info!("{} anomalies found", anomalies.len());

    let mut wtr = csv::Writer::from_writer(io::stdout());
    for anomalie in &anomalies {
        wtr.serialize(anomalie)?;
    }
    wtr.flush()?;

    let critiques = anomalies
        .iter()
        .filter(|a| a.gravite == Gravite::Critique)
        .count();
    eprintln!(
        "{} anomalies ({} critical) in barèmes {}",
        anomalies.len(),
        critiques,
        baremes.millesime.annee
    );

    Ok(if critiques > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
