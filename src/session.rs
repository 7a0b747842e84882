//! Background logging sessions: start a file sampler next to a workload, stop it
//! afterwards and load what it wrote.

use crate::collectors::{DeviceCollector, HostCollector, NvidiaGpu, SysinfoHost};
use crate::config::{OutputStyle, SamplerConfig};
use crate::sampler::{Sampler, SamplerHandle};
use crate::utils::errors::SamplerError;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_NAME: &str = "log_compute";
pub const SESSION_INTERVAL: Duration = Duration::from_millis(200);

/// `<name>.csv`, or the default log name when none is given.
pub fn log_path(name: Option<&str>) -> PathBuf {
    PathBuf::from(format!("{}.csv", name.unwrap_or(DEFAULT_LOG_NAME)))
}

/// Session settings: a fresh delimited log sampled every 200 ms.
pub fn session_config(name: Option<&str>) -> SamplerConfig {
    SamplerConfig::new()
        .with_file(log_path(name))
        .with_style(OutputStyle::Delimited)
        .with_refresh_interval(SESSION_INTERVAL)
}

/// Start logging host and accelerator utilisation in the background.
pub async fn start_log(name: Option<&str>) -> Result<SamplerHandle, SamplerError> {
    start_log_with(session_config(name), SysinfoHost::new(), NvidiaGpu::new()).await
}

/// Same as [`start_log`] with explicit settings and collectors.
/// Any previous log at the configured path is replaced.
pub async fn start_log_with<H: HostCollector, D: DeviceCollector>(
    config: SamplerConfig,
    host: H,
    devices: D,
) -> Result<SamplerHandle, SamplerError> {
    if let Some(path) = &config.file {
        if path.is_file() {
            std::fs::remove_file(path).map_err(|source| SamplerError::Sink {
                path: path.clone(),
                source,
            })?;
        }
    }
    let sampler = Sampler::create(config, host, devices).await?;
    let handle = sampler.start(None)?;
    info!("Started logging compute utilisation");
    Ok(handle)
}

/// Stop a background session and return how many rows it wrote.
pub async fn stop_log(handle: SamplerHandle) -> Result<u64, SamplerError> {
    handle.request_stop();
    let rows = handle.join().await?;
    info!("Terminated the compute utilisation logger after {} row(s)", rows);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{DummyGpu, FixedHost};
    use crate::log_data::log_columns;

    #[test]
    fn test_log_path() {
        assert_eq!(log_path(None), PathBuf::from("log_compute.csv"));
        assert_eq!(log_path(Some("run1")), PathBuf::from("run1.csv"));
    }

    #[tokio::test]
    async fn test_session_replaces_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        std::fs::write(&path, "stale contents\n").unwrap();

        let config = SamplerConfig::new()
            .with_file(&path)
            .with_refresh_interval(Duration::from_millis(20));
        let handle = start_log_with(config, FixedHost::default(), DummyGpu::new(2))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let rows = stop_log(handle).await.unwrap();
        assert!(rows >= 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
        assert_eq!(contents.lines().count() as u64, rows + 1);

        let columns = log_columns(&path, b',').unwrap();
        assert_eq!(columns.len(), 4 + 6);
        assert_eq!(columns[4], "0:GPU (%)");
    }
}
