use crate::collectors::HostCollector;
use crate::sample::HostReading;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

/// Host utilisation read through `sysinfo`.
///
/// CPU usage is measured between two refreshes, so the instance is kept for the
/// whole session and primed at construction.
pub struct SysinfoHost {
    system: System,
}

impl SysinfoHost {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::everything()),
        );
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCollector for SysinfoHost {
    fn poll_host(&mut self) -> HostReading {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        HostReading {
            cpu: round_tenths(self.system.global_cpu_usage() as f64),
            ram: percent(self.system.used_memory(), self.system.total_memory()),
            swap: percent(self.system.used_swap(), self.system.total_swap()),
        }
    }
}

/// Percentage rounded to one decimal; an empty pool (e.g. no swap) reads as 0.
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_tenths(used as f64 / total as f64 * 100.0)
}

fn round_tenths(value: f64) -> f64 {
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(5, 4), 100.0);
    }

    #[test]
    fn test_host_reading_in_range() {
        let mut host = SysinfoHost::new();
        let reading = host.poll_host();
        for value in [reading.cpu, reading.ram, reading.swap] {
            assert!(value.is_finite());
            assert!((0.0..=100.0).contains(&value));
        }
    }
}
