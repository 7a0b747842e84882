use crate::sample::Sample;
use crate::schema::{ColumnGroup, ColumnSchema};
use itertools::Itertools;

/// Turns samples into text. Implementations are built once from a schema and
/// apply the same layout to the header and every row.
pub trait Renderer: Send + Sync {
    /// Header text including its trailing newline.
    fn render_header(&self) -> String;

    /// One sample as a single line including its trailing newline.
    fn render_row(&self, sample: &Sample) -> String;
}

/// Values joined by a separator, without padding.
pub struct DelimitedRenderer {
    labels: Vec<String>,
    separator: String,
}

impl DelimitedRenderer {
    pub fn new(schema: &ColumnSchema, separator: impl Into<String>) -> Self {
        Self {
            labels: schema.labels(),
            separator: separator.into(),
        }
    }
}

impl Renderer for DelimitedRenderer {
    fn render_header(&self) -> String {
        format!("{}\n", self.labels.iter().join(&self.separator))
    }

    fn render_row(&self, sample: &Sample) -> String {
        format!("{}\n", sample.cells().iter().join(&self.separator))
    }
}

/// Right-aligned fixed-width columns separated by `|`, with a dashed rule under the header.
pub struct TabularRenderer {
    labels: Vec<String>,
    widths: Vec<usize>,
    /// Whether column `i` opens a new column group.
    group_starts: Vec<bool>,
}

impl TabularRenderer {
    pub fn new(schema: &ColumnSchema) -> Self {
        let mut previous: Option<ColumnGroup> = None;
        let group_starts = schema
            .columns()
            .iter()
            .map(|column| {
                let starts = previous != Some(column.group);
                previous = Some(column.group);
                starts
            })
            .collect();

        Self {
            labels: schema.labels(),
            widths: schema.widths(),
            group_starts,
        }
    }

    fn line<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut line = String::new();
        for (i, width) in self.widths.iter().enumerate() {
            if i > 0 {
                line.push('|');
                if self.group_starts[i] {
                    line.push('|');
                }
            }
            let cell = cells.get(i).map(|c| c.as_ref()).unwrap_or("");
            line.push_str(&format!("{:>width$} ", cell, width = *width));
        }
        line.push('\n');
        line
    }

    fn rule(&self) -> String {
        let mut rule = String::new();
        for (i, width) in self.widths.iter().enumerate() {
            if i > 0 {
                rule.push('+');
                if self.group_starts[i] {
                    rule.push('+');
                }
            }
            rule.push_str(&"-".repeat(width + 1));
        }
        rule.push('\n');
        rule
    }
}

impl Renderer for TabularRenderer {
    fn render_header(&self) -> String {
        let mut header = self.line(&self.labels);
        header.push_str(&self.rule());
        header
    }

    fn render_row(&self, sample: &Sample) -> String {
        self.line(&sample.cells())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{GpuReading, HostReading, Reading, Timestamp};

    fn sample(gpus: Vec<GpuReading>) -> Sample {
        Sample {
            timestamp: Timestamp::Epoch(1_700_000_000.5),
            host: HostReading { cpu: 12.5, ram: 40.0, swap: 0.0 },
            gpus,
        }
    }

    fn gpu() -> GpuReading {
        GpuReading {
            utilization: Reading::Value(87.0),
            memory: Reading::Value(31.0),
            temperature: Reading::Unsupported,
        }
    }

    #[test]
    fn test_delimited_header_without_devices() {
        let schema = ColumnSchema::build(None, true, 0);
        let renderer = DelimitedRenderer::new(&schema, ",");
        assert_eq!(
            renderer.render_header(),
            "Timestamp (s),CPU (%),RAM (%),Swap (%)\n"
        );
    }

    #[test]
    fn test_delimited_uses_separator_for_header_and_rows() {
        let schema = ColumnSchema::build(None, false, 1);
        let renderer = DelimitedRenderer::new(&schema, ";");
        assert_eq!(
            renderer.render_header(),
            "Timestamp;CPU;RAM;Swap;0:GPU;0:Mem;0:Temp\n"
        );
        assert_eq!(
            renderer.render_row(&sample(vec![gpu()])),
            "1700000000.500;12.5;40.0;0.0;87;31;N/A\n"
        );
    }

    #[test]
    fn test_tabular_header_with_one_device() {
        let schema = ColumnSchema::build(None, true, 1);
        let renderer = TabularRenderer::new(&schema);
        let header = renderer.render_header();
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0].matches("0:GPU (%)").count(), 1);
        assert_eq!(lines[0].matches("0:Mem (%)").count(), 1);
        assert_eq!(lines[0].matches("0:Temp (C)").count(), 1);
        assert!(!lines[0].contains("1:GPU"));

        let segments: Vec<&str> = lines[1].split('+').filter(|s| !s.is_empty()).collect();
        assert_eq!(segments.len(), schema.len());
        for (segment, width) in segments.iter().zip(schema.widths()) {
            assert_eq!(segment.len(), width + 1);
            assert!(segment.chars().all(|c| c == '-'));
        }
    }

    #[test]
    fn test_tabular_layout_matches_rule() {
        let schema = ColumnSchema::build(None, true, 1);
        let renderer = TabularRenderer::new(&schema);
        let header = renderer.render_header();
        let mut lines = header.lines();
        let names = lines.next().unwrap();
        let rule = lines.next().unwrap();
        let row = renderer.render_row(&sample(vec![gpu()]));
        let row = row.trim_end_matches('\n');

        assert_eq!(names.len(), rule.len());
        assert_eq!(row.len(), rule.len());
        assert_eq!(
            row,
            " 1700000000.500 ||      12.5 |      40.0 |       0.0 ||        87 |        31 |       N/A "
        );
    }

    #[test]
    fn test_renderers_agree_on_values() {
        let schema = ColumnSchema::build(None, true, 2);
        let delimited = DelimitedRenderer::new(&schema, ",");
        let tabular = TabularRenderer::new(&schema);
        let sample = sample(vec![gpu(), GpuReading::missing()]);

        let from_delimited: Vec<String> = delimited
            .render_row(&sample)
            .trim_end()
            .split(',')
            .map(|s| s.to_string())
            .collect();
        let from_tabular: Vec<String> = tabular
            .render_row(&sample)
            .trim_end_matches('\n')
            .split('|')
            .filter(|s| !s.is_empty())
            .map(|s| s.trim().to_string())
            .collect();

        assert_eq!(from_delimited.len(), schema.len());
        assert_eq!(from_delimited, from_tabular);
    }
}
