// View Projection
// (Ledger, year, today) -> GridView / SummaryView
// Always recomputed from the ledger, never cached.

use crate::ledger::{Ledger, PaymentStatus, PersonRecord};
use crate::month::Month;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const EMPTY_GRID_MESSAGE: &str = "No persons added yet. Add a person above to get started!";
pub const EMPTY_SUMMARY_MESSAGE: &str = "No data to display. Add persons to track their payments.";

// ============================================================================
// GRID
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthHeader {
    pub month: Month,
    pub label: &'static str,
    /// Presentation hint only: real-world current month of the viewed year
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub month: Month,
    pub paid: bool,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRow {
    pub person_name: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "rows", rename_all = "snake_case")]
pub enum GridBody {
    /// No persons for the year: render a placeholder, not an empty table
    Empty,
    Rows(Vec<PersonRow>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
    pub year: i32,
    pub headers: Vec<MonthHeader>,
    pub body: GridBody,
}

impl GridView {
    pub fn is_empty(&self) -> bool {
        matches!(self.body, GridBody::Empty)
    }

    pub fn rows(&self) -> &[PersonRow] {
        match &self.body {
            GridBody::Empty => &[],
            GridBody::Rows(rows) => rows,
        }
    }

    pub fn current_month(&self) -> Option<Month> {
        self.headers.iter().find(|h| h.is_current).map(|h| h.month)
    }
}

/// The month to highlight, if the viewed year is the real-world current year
pub fn highlighted_month(year: i32, today: NaiveDate) -> Option<Month> {
    if year == today.year() {
        Some(Month::from_chrono(&today))
    } else {
        None
    }
}

pub fn build_grid(ledger: &Ledger, year: i32, today: NaiveDate) -> GridView {
    let current = highlighted_month(year, today);

    let headers = Month::ALL
        .iter()
        .map(|&month| MonthHeader {
            month,
            label: month.name(),
            is_current: current == Some(month),
        })
        .collect();

    let body = match ledger.year(year) {
        Some(record) if !record.is_empty() => GridBody::Rows(
            record
                .iter()
                .map(|(name, person)| person_row(name, person, current))
                .collect(),
        ),
        _ => GridBody::Empty,
    };

    GridView {
        year,
        headers,
        body,
    }
}

fn person_row(name: &str, person: &PersonRecord, current: Option<Month>) -> PersonRow {
    let cells = Month::ALL
        .iter()
        .map(|&month| GridCell {
            month,
            paid: person.status(month) == PaymentStatus::Paid,
            is_current: current == Some(month),
        })
        .collect();

    PersonRow {
        person_name: name.to_string(),
        cells,
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub person_name: String,
    pub paid_count: usize,
}

impl SummaryEntry {
    pub fn line(&self) -> String {
        format!(
            "{}: {} of {} months paid",
            self.person_name,
            self.paid_count,
            Month::ALL.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "entries", rename_all = "snake_case")]
pub enum SummaryView {
    Empty,
    Entries(Vec<SummaryEntry>),
}

impl SummaryView {
    pub fn is_empty(&self) -> bool {
        matches!(self, SummaryView::Empty)
    }

    pub fn entries(&self) -> &[SummaryEntry] {
        match self {
            SummaryView::Empty => &[],
            SummaryView::Entries(entries) => entries,
        }
    }

    /// Text lines for plain renderers, placeholder included
    pub fn lines(&self) -> Vec<String> {
        match self {
            SummaryView::Empty => vec![EMPTY_SUMMARY_MESSAGE.to_string()],
            SummaryView::Entries(entries) => entries.iter().map(|e| e.line()).collect(),
        }
    }
}

pub fn build_summary(ledger: &Ledger, year: i32) -> SummaryView {
    match ledger.year(year) {
        Some(record) if !record.is_empty() => SummaryView::Entries(
            record
                .iter()
                .map(|(name, person)| SummaryEntry {
                    person_name: name.to_string(),
                    paid_count: person.paid_count(),
                })
                .collect(),
        ),
        _ => SummaryView::Empty,
    }
}
