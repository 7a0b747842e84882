use crate::collectors::{DeviceCollector, GpuDevice, HostCollector};
use crate::sample::{GpuReading, HostReading, Reading};
use crate::utils::errors::CollectorError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Host collector returning the same reading on every poll.
#[derive(Debug, Clone, Copy)]
pub struct FixedHost {
    pub reading: HostReading,
}

impl FixedHost {
    pub fn new(cpu: f64, ram: f64, swap: f64) -> Self {
        Self {
            reading: HostReading { cpu, ram, swap },
        }
    }
}

impl Default for FixedHost {
    fn default() -> Self {
        Self::new(12.5, 40.0, 0.0)
    }
}

impl HostCollector for FixedHost {
    fn poll_host(&mut self) -> HostReading {
        self.reading
    }
}

/// Scripted accelerator: a fixed device count, deterministic readings and
/// optional failures on chosen poll numbers (counted from 0).
pub struct DummyGpu {
    devices: usize,
    failing_polls: Vec<usize>,
    polls: AtomicUsize,
}

impl DummyGpu {
    pub fn new(devices: usize) -> Self {
        Self {
            devices,
            failing_polls: Vec::new(),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, polls: &[usize]) -> Self {
        self.failing_polls = polls.to_vec();
        self
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::Relaxed)
    }
}

impl Default for DummyGpu {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl DeviceCollector for DummyGpu {
    async fn discover_devices(&self) -> Result<Vec<GpuDevice>, CollectorError> {
        if self.devices == 0 {
            return Err(CollectorError::Unavailable("dummy accelerator".to_string()));
        }
        Ok((0..self.devices)
            .map(|index| GpuDevice {
                index,
                description: format!("Dummy GPU {}", index),
            })
            .collect())
    }

    async fn poll_devices(&self) -> Result<Vec<GpuReading>, CollectorError> {
        let poll = self.polls.fetch_add(1, Ordering::Relaxed);
        if self.failing_polls.contains(&poll) {
            return Err(CollectorError::QueryFailed(format!("scripted failure on poll {}", poll)));
        }
        Ok((0..self.devices)
            .map(|index| GpuReading {
                utilization: Reading::Value(50.0 + index as f64),
                memory: Reading::Value(25.0),
                temperature: if index % 2 == 0 {
                    Reading::Value(60.0)
                } else {
                    Reading::Unsupported
                },
            })
            .collect())
    }
}
