use chrono::{DateTime, Local};
use std::fmt;

/// Marker rendered for a metric the device reports as unsupported.
pub const UNSUPPORTED_MARKER: &str = "N/A";
/// Marker rendered when no reading was obtained for a device this iteration.
pub const MISSING_MARKER: &str = "-";

/// A single device metric as reported by the accelerator tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    /// The device knows the metric but does not currently report it.
    Unsupported,
    /// No reading was obtained this iteration (poll failed or device vanished).
    Missing,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Unsupported => f.write_str(UNSUPPORTED_MARKER),
            Reading::Missing => f.write_str(MISSING_MARKER),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostReading {
    pub cpu: f64,
    pub ram: f64,
    pub swap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuReading {
    pub utilization: Reading,
    pub memory: Reading,
    pub temperature: Reading,
}

impl GpuReading {
    pub fn missing() -> Self {
        Self {
            utilization: Reading::Missing,
            memory: Reading::Missing,
            temperature: Reading::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    /// Seconds since the UNIX epoch.
    Epoch(f64),
    /// Wall-clock time rendered with the configured strftime pattern.
    Formatted(String),
}

impl Timestamp {
    pub fn from_datetime(at: &DateTime<Local>, date_format: Option<&str>) -> Self {
        match date_format {
            Some(fmt) => Timestamp::Formatted(at.format(fmt).to_string()),
            None => Timestamp::Epoch(at.timestamp_micros() as f64 / 1_000_000.0),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Epoch(secs) => write!(f, "{:.3}", secs),
            Timestamp::Formatted(text) => f.write_str(text),
        }
    }
}

/// One row of polled values: time, host metrics, then one entry per discovered device.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub host: HostReading,
    pub gpus: Vec<GpuReading>,
}

impl Sample {
    /// Stringified values in column order. Both renderers format from this list,
    /// so they always agree on the logical values.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(4 + 3 * self.gpus.len());
        cells.push(self.timestamp.to_string());
        cells.push(format!("{:.1}", self.host.cpu));
        cells.push(format!("{:.1}", self.host.ram));
        cells.push(format!("{:.1}", self.host.swap));
        for gpu in &self.gpus {
            cells.push(gpu.utilization.to_string());
            cells.push(gpu.memory.to_string());
            cells.push(gpu.temperature.to_string());
        }
        cells
    }
}
