use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Minimum display width of every metric column.
pub const COLUMN_WIDTH: usize = 10;
/// Display width of an epoch timestamp rendered with three decimals.
pub const EPOCH_TIME_WIDTH: usize = 15;

const HOST_FIELDS: [(&str, &str); 3] = [("CPU", "%"), ("RAM", "%"), ("Swap", "%")];
const GPU_FIELDS: [(&str, &str); 3] = [("GPU", "%"), ("Mem", "%"), ("Temp", "C")];

/// Columns are laid out in groups; the tabular renderer doubles the separator
/// at every group boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    Time,
    Host,
    Device(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub width: usize,
    pub group: ColumnGroup,
    /// Header text: device prefix, name and unit suffix as configured.
    pub label: String,
}

/// Ordered column layout of one sampling session. Built once, never resized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    device_count: usize,
}

impl ColumnSchema {
    pub fn build(date_format: Option<&str>, show_units: bool, device_count: usize) -> Self {
        let mut columns = Vec::with_capacity(4 + 3 * device_count);

        let (time_name, time_unit, time_width) = match date_format {
            Some(fmt) => ("Time", None, COLUMN_WIDTH.max(formatted_width(fmt))),
            None => ("Timestamp", Some("s"), EPOCH_TIME_WIDTH),
        };
        columns.push(column(time_name, time_unit, time_width, ColumnGroup::Time, None, show_units));

        for (name, unit) in HOST_FIELDS {
            columns.push(column(
                name,
                Some(unit),
                COLUMN_WIDTH,
                ColumnGroup::Host,
                None,
                show_units,
            ));
        }

        for device in 0..device_count {
            for (name, unit) in GPU_FIELDS {
                columns.push(column(
                    name,
                    Some(unit),
                    COLUMN_WIDTH,
                    ColumnGroup::Device(device),
                    Some(device),
                    show_units,
                ));
            }
        }

        Self { columns, device_count }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn widths(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.width).collect()
    }
}

fn column(
    name: &'static str,
    unit: Option<&'static str>,
    width: usize,
    group: ColumnGroup,
    device: Option<usize>,
    show_units: bool,
) -> Column {
    let mut label = match device {
        Some(index) => format!("{}:{}", index, name),
        None => name.to_string(),
    };
    if let (true, Some(unit)) = (show_units, unit) {
        label.push_str(&format!(" ({})", unit));
    }
    Column { name, unit, width, group, label }
}

/// `fmt` applied to a fixed reference time chosen so that month and weekday
/// names take their longest form and `%.f` prints all nine fraction digits.
pub fn reference_stamp(fmt: &str) -> String {
    let reference: DateTime<Local> = NaiveDate::from_ymd_opt(2000, 9, 27)
        .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or_else(Local::now);
    reference.format(fmt).to_string()
}

fn formatted_width(fmt: &str) -> usize {
    reference_stamp(fmt).chars().count()
}
