// Calendar Months - fixed 12-column axis of the payment grid
// Ordering is calendar order, never insertion order.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Full English label, also used as storage key and report header
    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn short_name(&self) -> &'static str {
        &self.name()[..3]
    }

    /// 0-based position in the calendar
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Month> {
        Month::ALL.get(index).copied()
    }

    /// Month of a chrono date (chrono months are 1-based)
    pub fn from_chrono<D: Datelike>(date: &D) -> Month {
        Month::ALL[date.month0() as usize]
    }

    pub fn next(&self) -> Month {
        Month::ALL[(self.index() + 1) % 12]
    }

    pub fn previous(&self) -> Month {
        Month::ALL[(self.index() + 11) % 12]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown month: {0}")]
pub struct ParseMonthError(pub String);

impl FromStr for Month {
    type Err = ParseMonthError;

    /// Accepts full names or 3-letter abbreviations, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Month::ALL
            .iter()
            .find(|m| {
                let full = m.name().to_lowercase();
                wanted == full || (wanted.len() == 3 && full.starts_with(&wanted))
            })
            .copied()
            .ok_or_else(|| ParseMonthError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_calendar_order() {
        let names: Vec<&str> = Month::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names[0], "January");
        assert_eq!(names[2], "March");
        assert_eq!(names[11], "December");
        assert!(Month::January < Month::December);
    }

    #[test]
    fn test_parse_full_and_short_names() {
        assert_eq!("March".parse::<Month>().unwrap(), Month::March);
        assert_eq!("march".parse::<Month>().unwrap(), Month::March);
        assert_eq!(" SEP ".parse::<Month>().unwrap(), Month::September);
        assert!("Marc".parse::<Month>().is_err());
        assert!("".parse::<Month>().is_err());
    }

    #[test]
    fn test_from_chrono() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(Month::from_chrono(&date), Month::March);
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(Month::from_chrono(&date), Month::December);
    }

    #[test]
    fn test_wraparound_navigation() {
        assert_eq!(Month::December.next(), Month::January);
        assert_eq!(Month::January.previous(), Month::December);
        assert_eq!(Month::from_index(12), None);
    }

    #[test]
    fn test_serializes_as_full_name() {
        assert_eq!(serde_json::to_string(&Month::June).unwrap(), "\"June\"");
    }
}
