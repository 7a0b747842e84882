use crate::schema::reference_stamp;
use crate::utils::errors::SamplerError;
use chrono::format::{Item, StrftimeItems};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// Separator-joined values, suitable for log files.
    Delimited,
    /// Aligned fixed-width table, suitable for terminals.
    Tabular,
}

impl FromStr for OutputStyle {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "delimited" => Ok(OutputStyle::Delimited),
            "tabular" | "table" => Ok(OutputStyle::Tabular),
            other => Err(SamplerError::Config(format!("Unrecognised style: {}", other))),
        }
    }
}

/// Settings for one sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Append to this file; `None` writes to stdout.
    pub file: Option<PathBuf>,
    /// Explicit output style; defaults to tabular on stdout and delimited for files.
    pub style: Option<OutputStyle>,
    /// strftime pattern for the time column; `None` records epoch seconds.
    pub date_format: Option<String>,
    pub refresh_interval: Duration,
    /// Rows per run; `None` or `Some(0)` runs until stopped.
    pub iter_limit: Option<u64>,
    pub show_header: bool,
    /// Emit the header once per sampler instead of before every row.
    pub header_only_once: bool,
    pub show_units: bool,
    pub separator: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            file: None,
            style: None,
            date_format: None,
            refresh_interval: Duration::from_secs(1),
            iter_limit: None,
            show_header: true,
            header_only_once: true,
            show_units: true,
            separator: ",".to_string(),
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Parse the style from text, failing on anything other than a known style.
    pub fn with_style_name(self, style: &str) -> Result<Self, SamplerError> {
        Ok(self.with_style(style.parse()?))
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    pub fn with_iter_limit(mut self, iter_limit: u64) -> Self {
        self.iter_limit = Some(iter_limit);
        self
    }

    pub fn with_show_header(mut self, show_header: bool) -> Self {
        self.show_header = show_header;
        self
    }

    pub fn with_header_only_once(mut self, header_only_once: bool) -> Self {
        self.header_only_once = header_only_once;
        self
    }

    pub fn with_show_units(mut self, show_units: bool) -> Self {
        self.show_units = show_units;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn resolved_style(&self) -> OutputStyle {
        match (self.style, &self.file) {
            (Some(style), _) => style,
            (None, Some(_)) => OutputStyle::Delimited,
            (None, None) => OutputStyle::Tabular,
        }
    }

    /// Reject settings that would only fail once sampling has started.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if let Some(fmt) = &self.date_format {
            if fmt.is_empty() {
                return Err(SamplerError::Config("Empty date format".to_string()));
            }
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(SamplerError::Config(format!("Invalid date format: {:?}", fmt)));
            }
            let stamp = reference_stamp(fmt);
            if stamp.contains('\n') {
                return Err(SamplerError::Config(format!(
                    "Date format {:?} produces a line break",
                    fmt
                )));
            }
            if self.resolved_style() == OutputStyle::Delimited
                && !self.separator.is_empty()
                && stamp.contains(self.separator.as_str())
            {
                return Err(SamplerError::Config(format!(
                    "Date format {:?} produces the separator {:?}",
                    fmt, self.separator
                )));
            }
        }
        if self.resolved_style() == OutputStyle::Delimited && self.separator.is_empty() {
            return Err(SamplerError::Config("Separator must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_defaults_follow_sink() {
        assert_eq!(SamplerConfig::new().resolved_style(), OutputStyle::Tabular);
        assert_eq!(
            SamplerConfig::new().with_file("log.csv").resolved_style(),
            OutputStyle::Delimited
        );
        assert_eq!(
            SamplerConfig::new()
                .with_file("log.txt")
                .with_style(OutputStyle::Tabular)
                .resolved_style(),
            OutputStyle::Tabular
        );
    }

    #[test]
    fn test_style_names() {
        assert_eq!("csv".parse::<OutputStyle>().unwrap(), OutputStyle::Delimited);
        assert_eq!("Tabular".parse::<OutputStyle>().unwrap(), OutputStyle::Tabular);
        let err = SamplerConfig::new().with_style_name("fancy").unwrap_err();
        assert!(matches!(err, SamplerError::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(SamplerConfig::new().validate().is_ok());
        assert!(SamplerConfig::new().with_date_format("%Y-%m-%d %H:%M:%S").validate().is_ok());
        assert!(matches!(
            SamplerConfig::new().with_date_format("%Q").validate(),
            Err(SamplerError::Config(_))
        ));
        assert!(matches!(
            SamplerConfig::new().with_file("x.csv").with_separator("").validate(),
            Err(SamplerError::Config(_))
        ));
    }

    #[test]
    fn test_date_format_must_not_split_fields() {
        let comma_stamp = SamplerConfig::new()
            .with_file("x.csv")
            .with_date_format("%d %b, %H:%M:%S");
        assert!(matches!(comma_stamp.validate(), Err(SamplerError::Config(_))));

        // Another separator makes the same pattern safe.
        assert!(comma_stamp.clone().with_separator(";").validate().is_ok());

        // The table layout has no separator to collide with.
        assert!(comma_stamp.with_style(OutputStyle::Tabular).validate().is_ok());

        let line_break = SamplerConfig::new().with_date_format("%H:%M%n%S");
        assert!(matches!(line_break.validate(), Err(SamplerError::Config(_))));
    }
}
