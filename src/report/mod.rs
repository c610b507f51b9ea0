//! Delimited-text rendering of the daily report.

use crate::config::Delimiter;
use crate::site::models::{ListingRecord, DATE_FORMAT};

/// Report column names, in order.
pub const HEADER: [&str; 6] =
    ["FechaDescarga", "Barrio", "Valor", "NumHabitaciones", "NumBanos", "mts2"];

/// Renders listing records as delimited text.
pub struct ReportWriter {
    delimiter: Delimiter,
}

impl ReportWriter {
    /// Creates a new writer.
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Header row.
    pub fn header(&self) -> String {
        HEADER.join(self.delimiter.as_str())
    }

    /// Full report: header plus one row per record, newline-terminated.
    pub fn render(&self, records: &[ListingRecord]) -> String {
        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(self.header());
        lines.extend(records.iter().map(|record| self.row(record)));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn row(&self, record: &ListingRecord) -> String {
        let fields = [
            record.fetch_date.format(DATE_FORMAT).to_string(),
            record.neighborhood.to_string(),
            record.price.to_string(),
            record.bedroom_count.to_string(),
            record.bathroom_count.to_string(),
            record.area_value.to_string(),
        ];

        fields
            .iter()
            .map(|field| self.escape(field))
            .collect::<Vec<_>>()
            .join(self.delimiter.as_str())
    }

    fn escape(&self, s: &str) -> String {
        if s.contains(self.delimiter.as_char())
            || s.contains('"')
            || s.contains('\n')
            || s.contains('\r')
        {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
