pub mod utils {
    pub mod errors;
    pub mod logger;
}

// Metric sources
pub mod collectors;

pub mod config;
pub mod log_data;
pub mod render;
pub mod sample;
pub mod sampler;
pub mod schema;
pub mod session;
pub mod sink;

pub use collectors::{DeviceCollector, HostCollector, MetricSource};
pub use config::{OutputStyle, SamplerConfig};
pub use sampler::{Sampler, SamplerHandle, SamplerState};
pub use schema::ColumnSchema;
pub use utils::errors::{CollectorError, SamplerError};
