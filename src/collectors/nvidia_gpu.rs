use crate::collectors::{DeviceCollector, GpuDevice};
use crate::sample::{GpuReading, Reading};
use crate::utils::errors::CollectorError;
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use tokio::process::Command;

const GPU_QUERY: &str = "--query-gpu=utilization.gpu,utilization.memory,temperature.gpu";
const GPU_FORMAT: &str = "--format=csv,nounits,noheader";

/// Device metrics read from the `nvidia-smi` command line tool.
pub struct NvidiaGpu {
    binary: String,
}

impl NvidiaGpu {
    pub fn new() -> Self {
        Self::with_binary("nvidia-smi")
    }

    /// Use another executable speaking the same protocol.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String, CollectorError> {
        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CollectorError::Unavailable(self.binary.clone()),
                _ => CollectorError::QueryFailed(format!("{}: {}", self.binary, e)),
            })?;

        if !output.status.success() {
            return Err(CollectorError::QueryFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for NvidiaGpu {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceCollector for NvidiaGpu {
    async fn discover_devices(&self) -> Result<Vec<GpuDevice>, CollectorError> {
        let listing = self.run(&["-L"]).await.map_err(|e| match e {
            // A tool that is installed but cannot talk to a driver is as good as absent.
            CollectorError::QueryFailed(reason) => CollectorError::Unavailable(reason),
            other => other,
        })?;
        Ok(parse_device_list(&listing))
    }

    async fn poll_devices(&self) -> Result<Vec<GpuReading>, CollectorError> {
        let output = self.run(&[GPU_QUERY, GPU_FORMAT]).await?;
        debug!("{} query output: {:?}", self.binary, output);
        parse_query_output(&output)
    }
}

/// One device per non-empty line of `nvidia-smi -L`.
pub fn parse_device_list(listing: &str) -> Vec<GpuDevice> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| GpuDevice {
            index,
            description: line.to_string(),
        })
        .collect()
}

/// Parses headerless, unitless CSV: one line per device, three fields per line.
pub fn parse_query_output(output: &str) -> Result<Vec<GpuReading>, CollectorError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<Reading> = line.split(',').map(parse_field).collect();
            match fields.as_slice() {
                [utilization, memory, temperature] => Ok(GpuReading {
                    utilization: *utilization,
                    memory: *memory,
                    temperature: *temperature,
                }),
                _ => Err(CollectorError::Parse(format!(
                    "expected 3 fields, got {}: {:?}",
                    fields.len(),
                    line
                ))),
            }
        })
        .collect()
}

fn parse_field(field: &str) -> Reading {
    let field = field.trim();
    if field.contains("Not Supported") || field.contains("N/A") {
        return Reading::Unsupported;
    }
    field
        .parse::<f64>()
        .map(Reading::Value)
        .unwrap_or(Reading::Unsupported)
}
