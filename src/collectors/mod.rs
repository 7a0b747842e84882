pub mod dummy;
pub mod host;
pub mod nvidia_gpu;

pub use dummy::{DummyGpu, FixedHost};
pub use host::SysinfoHost;
pub use nvidia_gpu::NvidiaGpu;

use crate::sample::{GpuReading, HostReading};
use crate::utils::errors::CollectorError;
use async_trait::async_trait;
use log::{debug, info, warn};

/// Source of host-wide CPU, RAM and swap utilisation.
pub trait HostCollector: Send + Sync + 'static {
    fn poll_host(&mut self) -> HostReading;
}

/// One accelerator as enumerated at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDevice {
    pub index: usize,
    pub description: String,
}

#[async_trait]
pub trait DeviceCollector: Send + Sync + 'static {
    /// Enumerate devices. `CollectorError::Unavailable` means the tool is absent.
    async fn discover_devices(&self) -> Result<Vec<GpuDevice>, CollectorError>;

    /// Query every device, in discovery order.
    async fn poll_devices(&self) -> Result<Vec<GpuReading>, CollectorError>;
}

/// Outcome of one device poll.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceStatus {
    /// No devices were found at discovery; nothing was queried.
    Unavailable,
    /// The query failed this iteration.
    Failed(CollectorError),
    Polled(Vec<GpuReading>),
}

impl DeviceStatus {
    /// Exactly `device_count` readings: failures and vanished devices become
    /// missing readings, unexpected extra devices are dropped.
    pub fn into_rows(self, device_count: usize) -> Vec<GpuReading> {
        let mut rows = match self {
            DeviceStatus::Polled(rows) => rows,
            DeviceStatus::Unavailable | DeviceStatus::Failed(_) => Vec::new(),
        };
        rows.resize(device_count, GpuReading::missing());
        rows
    }
}

/// Host and device collectors with the device list fixed at construction.
pub struct MetricSource<H: HostCollector, D: DeviceCollector> {
    host: H,
    devices: D,
    discovered: Vec<GpuDevice>,
}

impl<H: HostCollector, D: DeviceCollector> MetricSource<H, D> {
    /// Runs device discovery once. A missing or failing tool yields a host-only source.
    pub async fn discover(host: H, devices: D) -> Self {
        let discovered = match devices.discover_devices().await {
            Ok(found) => {
                info!("Discovered {} accelerator device(s)", found.len());
                for device in &found {
                    debug!("Device {}: {}", device.index, device.description);
                }
                found
            }
            Err(e) => {
                info!("No accelerator metrics available: {}", e);
                Vec::new()
            }
        };
        Self { host, devices, discovered }
    }

    pub fn devices(&self) -> &[GpuDevice] {
        &self.discovered
    }

    pub fn device_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn poll_host(&mut self) -> HostReading {
        self.host.poll_host()
    }

    pub async fn poll_devices(&self) -> DeviceStatus {
        if self.discovered.is_empty() {
            return DeviceStatus::Unavailable;
        }
        match self.devices.poll_devices().await {
            Ok(rows) => {
                if rows.len() != self.discovered.len() {
                    warn!(
                        "Device poll returned {} row(s), expected {}",
                        rows.len(),
                        self.discovered.len()
                    );
                }
                DeviceStatus::Polled(rows)
            }
            Err(e) => {
                warn!("Device poll failed, emitting host metrics only: {}", e);
                DeviceStatus::Failed(e)
            }
        }
    }
}
