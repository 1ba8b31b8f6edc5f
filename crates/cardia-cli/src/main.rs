use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

use cardia_lib::{
    analyze::{analyze, AnalyzeOptions},
    detectors::ecg::detect_r_peaks,
    io::{csv as csv_io, text as text_io},
    metrics::{hrv::hrv_from_rr_ms, sqi::evaluate_sqi},
    signal::RRSeries,
    sim::{synthetic_ecg, SimConfig},
};

#[derive(Parser)]
#[command(name = "cardia", version, about = "ECG analysis toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline and print the result as JSON
    Analyze {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        /// Newline-delimited samples in mV; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        /// Read this column of a headed CSV instead of plain text
        #[arg(long)]
        csv_column: Option<String>,
        #[arg(long)]
        pretty: bool,
        #[arg(long)]
        verbose: bool,
    },
    /// Detect R-peaks only and print indices plus detection metrics
    FindRpeaks {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Time-domain HRV from newline-delimited RR intervals in seconds
    HrvTime {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Signal quality indices for a recording
    Sqi {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Generate a synthetic ECG recording
    Simulate {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long, default_value_t = 60.0)]
        bpm: f64,
        #[arg(long, default_value_t = 10.0)]
        duration_s: f64,
        #[arg(long, default_value_t = 0.0)]
        noise_mv: f64,
        #[arg(long, default_value_t = 0.0)]
        rr_jitter_s: f64,
        /// Stretch the QRS template to a wide-complex morphology
        #[arg(long)]
        wide_qrs: bool,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Output path; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            fs,
            input,
            csv_column,
            pretty,
            verbose,
        } => cmd_analyze(fs, input.as_deref(), csv_column.as_deref(), pretty, verbose),
        Commands::FindRpeaks { fs, input } => cmd_find_rpeaks(fs, input.as_deref()),
        Commands::HrvTime { input } => cmd_hrv_time(input.as_deref()),
        Commands::Sqi { fs, input } => cmd_sqi(fs, input.as_deref()),
        Commands::Simulate {
            fs,
            bpm,
            duration_s,
            noise_mv,
            rr_jitter_s,
            wide_qrs,
            seed,
            out,
        } => cmd_simulate(fs, bpm, duration_s, noise_mv, rr_jitter_s, wide_qrs, seed, out.as_deref()),
    }
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_series(path),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            text_io::parse_series(&buf)
        }
    }
}

fn cmd_analyze(
    fs: f64,
    input: Option<&Path>,
    csv_column: Option<&str>,
    pretty: bool,
    verbose: bool,
) -> Result<()> {
    let samples = match (input, csv_column) {
        (Some(path), Some(column)) => csv_io::read_csv_column(path, column)?,
        (_, None) => read_samples(input)?,
        (None, Some(_)) => anyhow::bail!("--csv-column requires --input"),
    };
    let result = analyze(&samples, fs, &AnalyzeOptions { verbose })
        .with_context(|| format!("analyzing {} samples at {} Hz", samples.len(), fs))?;
    if pretty {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}

fn cmd_find_rpeaks(fs: f64, input: Option<&Path>) -> Result<()> {
    let samples = read_samples(input)?;
    let cleaned = cardia_lib::preprocess::preprocess(
        &samples,
        fs,
        &cardia_lib::preprocess::PreprocessConfig::default(),
    )?
    .0;
    let (peaks, metrics) = detect_r_peaks(&cleaned, fs);
    let out = serde_json::json!({
        "r_peak_indices": peaks,
        "detection_metrics": metrics,
    });
    println!("{}", out);
    Ok(())
}

fn cmd_hrv_time(input: Option<&Path>) -> Result<()> {
    let rr = RRSeries {
        rr: read_samples(input)?,
    };
    let hrv = hrv_from_rr_ms(&rr.to_ms());
    println!("{}", serde_json::to_string(&hrv)?);
    Ok(())
}

fn cmd_sqi(fs: f64, input: Option<&Path>) -> Result<()> {
    let samples = read_samples(input)?;
    let cleaned = cardia_lib::preprocess::preprocess(
        &samples,
        fs,
        &cardia_lib::preprocess::PreprocessConfig::default(),
    )?
    .0;
    let (peaks, _) = detect_r_peaks(&cleaned, fs);
    let sqi = evaluate_sqi(&cleaned, &peaks, fs);
    println!("{}", serde_json::to_string(&sqi)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_simulate(
    fs: f64,
    bpm: f64,
    duration_s: f64,
    noise_mv: f64,
    rr_jitter_s: f64,
    wide_qrs: bool,
    seed: u64,
    out: Option<&Path>,
) -> Result<()> {
    let cfg = SimConfig {
        fs,
        bpm,
        duration_s,
        noise_mv,
        rr_jitter_s,
        qrs_width_s: if wide_qrs { 0.035 } else { 0.008 },
        amplitude_mv: if wide_qrs { 1.2 } else { 1.0 },
        seed,
        ..SimConfig::default()
    };
    let ts = synthetic_ecg(&cfg);
    match out {
        Some(path) => text_io::write_series(path, &ts.data)?,
        None => {
            for v in &ts.data {
                println!("{}", v);
            }
        }
    }
    Ok(())
}
