use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use utilog::log_data::{LogStats, load_log};
use utilog::utils::logger::setup_logger;
use utilog::{Sampler, SamplerConfig, SamplerError};

#[derive(Parser)]
#[command(name = "utilog", version, about = "Log CPU, RAM, swap and GPU utilisation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample utilisation until the iteration limit or Ctrl-C.
    Record {
        /// Append to this file instead of writing to stdout
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output style: csv or tabular (default: tabular on stdout, csv for files)
        #[arg(short, long)]
        style: Option<String>,
        /// strftime pattern for the time column (default: seconds since epoch)
        #[arg(short, long)]
        date_format: Option<String>,
        /// Sampling interval in seconds
        #[arg(short, long, default_value_t = 1.0)]
        interval: f64,
        /// Number of samples to take (0 runs until interrupted)
        #[arg(short = 'n', long)]
        iterations: Option<u64>,
        /// Do not print a header
        #[arg(long)]
        no_header: bool,
        /// Print the header before every sample
        #[arg(long)]
        repeat_header: bool,
        /// Omit units from column names
        #[arg(long)]
        no_units: bool,
        /// Separator for csv output
        #[arg(long, default_value = ",")]
        sep: String,
    },
    /// Summarise a csv log written by `record`.
    Summary {
        file: PathBuf,
        #[arg(long, default_value = ",")]
        sep: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logger();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Record {
            file,
            style,
            date_format,
            interval,
            iterations,
            no_header,
            repeat_header,
            no_units,
            sep,
        } => {
            let config = record_config(
                file,
                style,
                date_format,
                interval,
                no_header,
                repeat_header,
                no_units,
                sep,
            );
            match config {
                Ok(config) => record(config, iterations).await,
                Err(e) => Err(e),
            }
        }
        Command::Summary { file, sep } => summary(file, &sep),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn record_config(
    file: Option<PathBuf>,
    style: Option<String>,
    date_format: Option<String>,
    interval: f64,
    no_header: bool,
    repeat_header: bool,
    no_units: bool,
    sep: String,
) -> Result<SamplerConfig, SamplerError> {
    let refresh_interval = Duration::try_from_secs_f64(interval)
        .map_err(|e| SamplerError::Config(format!("Invalid interval {}: {}", interval, e)))?;

    let mut config = SamplerConfig::new()
        .with_refresh_interval(refresh_interval)
        .with_show_header(!no_header)
        .with_header_only_once(!repeat_header)
        .with_show_units(!no_units)
        .with_separator(sep);
    if let Some(file) = file {
        config = config.with_file(file);
    }
    if let Some(style) = style {
        config = config.with_style_name(&style)?;
    }
    if let Some(date_format) = date_format {
        config = config.with_date_format(date_format);
    }
    Ok(config)
}

async fn record(config: SamplerConfig, iterations: Option<u64>) -> Result<(), SamplerError> {
    let sampler = Sampler::with_system_collectors(config).await?;
    let handle = sampler.start(iterations)?;

    let stop = handle.stop_signal();
    let stopper = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            stop.request_stop();
        }
    });

    let rows = handle.join().await;
    stopper.abort();
    rows.map(|_| ())
}

fn summary(file: PathBuf, sep: &str) -> Result<(), SamplerError> {
    let separator = match sep.as_bytes() {
        [byte] => *byte,
        _ => {
            return Err(SamplerError::Config(format!(
                "Separator must be a single byte, got {:?}",
                sep
            )));
        }
    };
    let df = load_log(&file, separator)?;
    print!("{}", LogStats::from_frame(&df)?);
    Ok(())
}
