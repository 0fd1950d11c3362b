// Ledger Data Model
// year -> person -> month -> paid flag
//
// A missing month and an explicit `false` mean the same thing: NotPaid.
// Person order inside a year is insertion order and survives serialization.

use crate::month::Month;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Longest accepted person name, in characters
pub const MAX_NAME_LEN: usize = 50;

// ============================================================================
// PAYMENT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentStatus {
    Paid,
    #[default]
    NotPaid,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    pub fn toggled(&self) -> PaymentStatus {
        match self {
            PaymentStatus::Paid => PaymentStatus::NotPaid,
            PaymentStatus::NotPaid => PaymentStatus::Paid,
        }
    }

    /// Token used in the exported report
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::NotPaid => "Not Paid",
        }
    }
}

impl From<bool> for PaymentStatus {
    fn from(paid: bool) -> Self {
        if paid {
            PaymentStatus::Paid
        } else {
            PaymentStatus::NotPaid
        }
    }
}

// Stored as a plain JSON boolean
impl Serialize for PaymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_paid())
    }
}

impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer).map(PaymentStatus::from)
    }
}

// ============================================================================
// PERSON RECORD
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonRecord {
    months: BTreeMap<Month, PaymentStatus>,
}

impl PersonRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, month: Month) -> PaymentStatus {
        self.months.get(&month).copied().unwrap_or_default()
    }

    pub fn is_paid(&self, month: Month) -> bool {
        self.status(month).is_paid()
    }

    /// Flip one month, creating the entry if it was absent. Returns the new status.
    pub fn toggle(&mut self, month: Month) -> PaymentStatus {
        let entry = self.months.entry(month).or_default();
        *entry = entry.toggled();
        *entry
    }

    pub fn set(&mut self, month: Month, status: PaymentStatus) {
        self.months.insert(month, status);
    }

    pub fn paid_count(&self) -> usize {
        self.months.values().filter(|s| s.is_paid()).count()
    }

    /// All 12 months in calendar order
    pub fn statuses(&self) -> [PaymentStatus; 12] {
        Month::ALL.map(|m| self.status(m))
    }
}

impl PartialEq for PersonRecord {
    fn eq(&self, other: &Self) -> bool {
        self.statuses() == other.statuses()
    }
}

impl Eq for PersonRecord {}

// ============================================================================
// YEAR RECORD
// ============================================================================

/// Persons tracked for one year, kept in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearRecord {
    persons: Vec<(String, PersonRecord)>,
}

impl YearRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&PersonRecord> {
        self.position(name).map(|i| &self.persons[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PersonRecord> {
        match self.position(name) {
            Some(i) => Some(&mut self.persons[i].1),
            None => None,
        }
    }

    /// Returns the record for `name`, appending an empty one if absent
    pub fn get_or_insert(&mut self, name: &str) -> &mut PersonRecord {
        let index = match self.position(name) {
            Some(i) => i,
            None => {
                self.persons.push((name.to_string(), PersonRecord::new()));
                self.persons.len() - 1
            }
        };
        &mut self.persons[index].1
    }

    /// Insert or replace; a replaced person keeps its position
    pub fn insert(&mut self, name: impl Into<String>, record: PersonRecord) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.persons[i].1 = record,
            None => self.persons.push((name, record)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PersonRecord> {
        self.position(name).map(|i| self.persons.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PersonRecord)> {
        self.persons.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.persons.iter().map(|(n, _)| n.as_str())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.persons.iter().position(|(n, _)| n == name)
    }
}

impl Serialize for YearRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.persons.len()))?;
        for (name, record) in &self.persons {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

struct YearRecordVisitor;

impl<'de> Visitor<'de> for YearRecordVisitor {
    type Value = YearRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of person name to monthly payment flags")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut year = YearRecord::new();
        while let Some((name, record)) = access.next_entry::<String, PersonRecord>()? {
            year.insert(name, record);
        }
        Ok(year)
    }
}

impl<'de> Deserialize<'de> for YearRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(YearRecordVisitor)
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    years: BTreeMap<i32, YearRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(&self, year: i32) -> Option<&YearRecord> {
        self.years.get(&year)
    }

    pub fn year_mut(&mut self, year: i32) -> Option<&mut YearRecord> {
        self.years.get_mut(&year)
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    /// Lazily creates the year. Returns true if it was created.
    pub fn ensure_year(&mut self, year: i32) -> bool {
        if self.years.contains_key(&year) {
            return false;
        }
        self.years.insert(year, YearRecord::new());
        true
    }

    /// Year record, created on first access
    pub fn year_entry(&mut self, year: i32) -> &mut YearRecord {
        self.years.entry(year).or_default()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn person_count(&self, year: i32) -> usize {
        self.year(year).map(|y| y.len()).unwrap_or(0)
    }
}
