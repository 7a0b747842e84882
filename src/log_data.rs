//! Reading delimited logs back for post-hoc analysis.
//!
//! A log written by the delimited renderer is plain CSV with a single header
//! line; the unsupported marker `N/A`, the missing marker `-` and empty cells
//! all load as nulls.

use crate::sample::{MISSING_MARKER, UNSUPPORTED_MARKER};
use crate::utils::errors::SamplerError;
use polars::prelude::*;
use std::fmt;
use std::path::Path;

/// Load a delimited log into a DataFrame, one column per logged field.
pub fn load_log(path: &Path, separator: u8) -> Result<DataFrame, SamplerError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| {
            opts.with_separator(separator).with_null_values(Some(NullValues::AllColumns(vec![
                UNSUPPORTED_MARKER.into(),
                MISSING_MARKER.into(),
            ])))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| SamplerError::LogData(format!("Failed to read {}: {}", path.display(), e)))
}

/// Header names of a log, in file order.
pub fn log_columns(path: &Path, separator: u8) -> Result<Vec<String>, SamplerError> {
    Ok(frame_columns(&load_log(path, separator)?))
}

pub fn frame_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Summary of a loaded log. The first column is the time column.
#[derive(Debug, Clone, PartialEq)]
pub struct LogStats {
    pub row_count: usize,
    /// Covered time in seconds; only known for epoch timestamps.
    pub span_seconds: Option<f64>,
    pub columns: Vec<ColumnStats>,
}

impl LogStats {
    pub fn from_frame(df: &DataFrame) -> Result<Self, SamplerError> {
        let names = frame_columns(df);
        let Some((time, metrics)) = names.split_first() else {
            return Err(SamplerError::LogData("Log has no columns".to_string()));
        };

        let stamps = float_values(df, time)?;
        let span_seconds = match (stamps.min(), stamps.max()) {
            (Some(oldest), Some(newest)) => Some(newest - oldest),
            _ => None,
        };

        let columns = metrics
            .iter()
            .map(|name| {
                let values = float_values(df, name)?;
                Ok(ColumnStats {
                    name: name.clone(),
                    mean: values.mean(),
                    min: values.min(),
                    max: values.max(),
                })
            })
            .collect::<Result<Vec<_>, SamplerError>>()?;

        Ok(Self {
            row_count: df.height(),
            span_seconds,
            columns,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for LogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sample(s)", self.row_count)?;
        if let Some(span) = self.span_seconds {
            write!(f, " over {:.3} s", span)?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>10} {:>10} {:>10}", "column", "mean", "min", "max")?;
        for column in &self.columns {
            writeln!(
                f,
                "{:>12} {:>10} {:>10} {:>10}",
                column.name,
                format_stat(column.mean),
                format_stat(column.min),
                format_stat(column.max)
            )?;
        }
        Ok(())
    }
}

fn format_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| UNSUPPORTED_MARKER.to_string())
}

/// Column values as floats; text that is not a number becomes null.
fn float_values(df: &DataFrame, name: &str) -> Result<Float64Chunked, SamplerError> {
    let column = df
        .column(name)
        .map_err(|e| SamplerError::LogData(format!("Failed to access column {}: {}", name, e)))?;
    let floats = column
        .cast(&DataType::Float64)
        .map_err(|e| SamplerError::LogData(format!("Column {} is not numeric: {}", name, e)))?;
    let values = floats
        .f64()
        .map_err(|e| SamplerError::LogData(format!("Column {} is not numeric: {}", name, e)))?
        .clone();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{DummyGpu, FixedHost};
    use crate::config::SamplerConfig;
    use crate::sampler::Sampler;
    use std::time::Duration;

    async fn write_log(
        path: &Path,
        config: SamplerConfig,
        devices: usize,
        rows: u64,
    ) -> Vec<String> {
        let config = config
            .with_file(path)
            .with_refresh_interval(Duration::ZERO);
        let mut sampler = Sampler::create(config, FixedHost::default(), DummyGpu::new(devices))
            .await
            .unwrap();
        sampler.run(Some(rows)).await.unwrap();
        sampler.schema().labels()
    }

    #[tokio::test]
    async fn test_columns_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let labels = write_log(&path, SamplerConfig::new(), 2, 3).await;

        assert_eq!(log_columns(&path, b',').unwrap(), labels);
    }

    #[tokio::test]
    async fn test_columns_round_trip_with_custom_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let config = SamplerConfig::new().with_separator(";").with_show_units(false);
        let labels = write_log(&path, config, 1, 2).await;

        assert_eq!(log_columns(&path, b';').unwrap(), labels);
    }

    #[tokio::test]
    async fn test_stats_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        write_log(&path, SamplerConfig::new(), 2, 4).await;

        let df = load_log(&path, b',').unwrap();
        let stats = LogStats::from_frame(&df).unwrap();
        assert_eq!(stats.row_count, 4);
        assert!(stats.span_seconds.is_some_and(|s| s >= 0.0));

        let cpu = stats.column("CPU (%)").unwrap();
        assert_eq!(cpu.mean, Some(12.5));
        assert_eq!(cpu.max, Some(12.5));

        assert_eq!(stats.column("1:GPU (%)").unwrap().mean, Some(51.0));
        // Unsupported readings load as nulls.
        assert_eq!(stats.column("1:Temp (C)").unwrap().mean, None);
        assert!(stats.to_string().starts_with("4 sample(s)"));
    }

    #[tokio::test]
    async fn test_formatted_time_has_no_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let config = SamplerConfig::new().with_date_format("%Y-%m-%d %H:%M:%S");
        write_log(&path, config, 0, 2).await;

        let stats = LogStats::from_frame(&load_log(&path, b',').unwrap()).unwrap();
        assert_eq!(stats.span_seconds, None);
        assert_eq!(stats.columns.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_poll_loads_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let config = SamplerConfig::new()
            .with_file(&path)
            .with_refresh_interval(Duration::ZERO);
        let devices = DummyGpu::new(1).failing_on(&[0]);
        let mut sampler = Sampler::create(config, FixedHost::default(), devices)
            .await
            .unwrap();
        sampler.run(Some(2)).await.unwrap();

        let stats = LogStats::from_frame(&load_log(&path, b',').unwrap()).unwrap();
        assert_eq!(stats.row_count, 2);
        let gpu = stats.column("0:GPU (%)").unwrap();
        assert_eq!(gpu.mean, Some(50.0));
        assert_eq!(gpu.min, Some(50.0));
    }

    #[test]
    fn test_missing_log_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_log(&dir.path().join("absent.csv"), b',').unwrap_err();
        assert!(matches!(err, SamplerError::LogData(_)));
    }
}
