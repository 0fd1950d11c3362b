// Export Projection - yearly CSV report
// Person, January..December, Total Paid; one row per person in grid order.

use crate::error::{TrackerError, TrackerResult};
use crate::ledger::Ledger;
use crate::month::Month;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_MIME_TYPE: &str = "text/csv;charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub year: i32,
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

pub fn report_filename(year: i32) -> String {
    format!("Monthly_Payment_Tracker_{}.csv", year)
}

pub fn report_header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(Month::ALL.len() + 2);
    header.push("Person");
    header.extend(Month::ALL.iter().map(|m| m.name()));
    header.push("Total Paid");
    header
}

/// Build the report for `year`. Output is deterministic for a given ledger.
pub fn export_year(ledger: &Ledger, year: i32) -> TrackerResult<Report> {
    let record = match ledger.year(year) {
        Some(record) if !record.is_empty() => record,
        _ => return Err(TrackerError::EmptyReport { year }),
    };

    // Necessary quoting wraps names with commas, quotes or line breaks
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(report_header()).map_err(csv_error)?;

    for (name, person) in record.iter() {
        let mut row: Vec<String> = Vec::with_capacity(Month::ALL.len() + 2);
        row.push(name.to_string());
        row.extend(Month::ALL.iter().map(|&m| person.status(m).label().to_string()));
        row.push(person.paid_count().to_string());
        wtr.write_record(&row).map_err(csv_error)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| TrackerError::Export(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| TrackerError::Export(e.to_string()))?;

    Ok(Report {
        year,
        filename: report_filename(year),
        mime_type: REPORT_MIME_TYPE,
        content,
    })
}

fn csv_error(e: csv::Error) -> TrackerError {
    TrackerError::Export(e.to_string())
}

// ============================================================================
// EXPORT SINK
// ============================================================================

/// Receives a finished report and performs the user-facing save
pub trait ExportSink {
    fn deliver(&mut self, report: &Report) -> TrackerResult<PathBuf>;
}

/// Writes reports into a directory under their suggested filename
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectoryExportSink {
    fn deliver(&mut self, report: &Report) -> TrackerResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| TrackerError::Export(e.to_string()))?;
        let path = self.dir.join(&report.filename);
        fs::write(&path, &report.content).map_err(|e| TrackerError::Export(e.to_string()))?;
        info!(path = ?path, year = report.year, "report exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .year_entry(2024)
            .get_or_insert("Alice")
            .toggle(Month::March);
        ledger
    }

    #[test]
    fn test_empty_year_is_reported() {
        let mut ledger = Ledger::new();
        ledger.ensure_year(2024);

        let err = export_year(&ledger, 2024).unwrap_err();
        assert!(matches!(err, TrackerError::EmptyReport { year: 2024 }));
        assert_eq!(err.to_string(), "No data available for year 2024 to download.");
        assert!(export_year(&ledger, 2030).is_err());
    }

    #[test]
    fn test_header_and_row_layout() {
        let report = export_year(&alice_ledger(), 2024).unwrap();
        let lines: Vec<&str> = report.content.lines().collect();

        assert_eq!(
            lines[0],
            "Person,January,February,March,April,May,June,July,August,September,October,November,December,Total Paid"
        );
        assert_eq!(
            lines[1],
            "Alice,Not Paid,Not Paid,Paid,Not Paid,Not Paid,Not Paid,Not Paid,Not Paid,Not Paid,Not Paid,Not Paid,Not Paid,1"
        );
        assert_eq!(lines.len(), 2);
        assert!(report.content.ends_with('\n'));
        assert_eq!(report.filename, "Monthly_Payment_Tracker_2024.csv");
        assert_eq!(report.mime_type, REPORT_MIME_TYPE);
    }

    #[test]
    fn test_names_with_separators_are_quoted() {
        let mut ledger = Ledger::new();
        ledger.year_entry(2024).get_or_insert("Smith, John");
        ledger.year_entry(2024).get_or_insert("The \"Boss\"");

        let report = export_year(&ledger, 2024).unwrap();
        let lines: Vec<&str> = report.content.lines().collect();
        assert!(lines[1].starts_with("\"Smith, John\",Not Paid,"));
        assert!(lines[2].starts_with("\"The \"\"Boss\"\"\",Not Paid,"));

        // A csv reader sees the original names again
        let mut rdr = csv::Reader::from_reader(report.content.as_bytes());
        let names: Vec<String> = rdr
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(names, vec!["Smith, John", "The \"Boss\""]);
    }

    #[test]
    fn test_export_is_deterministic() {
        let ledger = alice_ledger();
        let first = export_year(&ledger, 2024).unwrap();
        let second = export_year(&ledger, 2024).unwrap();
        assert_eq!(first.content.as_bytes(), second.content.as_bytes());
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectoryExportSink::new(dir.path().join("reports"));
        let report = export_year(&alice_ledger(), 2024).unwrap();

        let path = sink.deliver(&report).unwrap();
        assert_eq!(path, dir.path().join("reports").join("Monthly_Payment_Tracker_2024.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), report.content);
    }
}
