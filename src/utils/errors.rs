use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Cannot open sink {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Log data error: {0}")]
    LogData(String),
    #[error("Sampler task failed: {0}")]
    Task(String),
}

/// Failures reported by a device collector.
///
/// `Unavailable` is permanent for the session and only expected at discovery time;
/// the other variants are transient and degrade a single sample.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectorError {
    #[error("{0} is not available on this system")]
    Unavailable(String),
    #[error("Device query failed: {0}")]
    QueryFailed(String),
    #[error("Malformed collector output: {0}")]
    Parse(String),
}
