// Tracker - owned ledger state plus the selected-year cursor
//
// Every content mutation is applied in memory, then the whole ledger is
// persisted before the call returns. A failed save is reported as
// StorageError; the in-memory state stays authoritative for the rest of the
// session. Creating an empty year and moving the cursor never write.

use crate::error::{TrackerError, TrackerResult, ValidationError};
use crate::export::{self, Report};
use crate::ledger::{Ledger, PaymentStatus, MAX_NAME_LEN};
use crate::month::Month;
use crate::prompt::UserPrompt;
use crate::storage::{encode_ledger, load_ledger, LedgerStore};
use crate::view::{self, GridView, SummaryView};
use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;
use tracing::{debug, error, info};

/// Years offered around the current one by the year selector
pub const YEAR_WINDOW: i32 = 5;

/// Outcome of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Person was not present; nothing changed
    NotFound,
    /// User declined the confirmation
    Cancelled,
}

pub struct Tracker<S: LedgerStore> {
    ledger: Ledger,
    selected_year: i32,
    store: S,
}

impl<S: LedgerStore> Tracker<S> {
    /// Load the ledger from `store` and select the year of `today`.
    /// An absent or unreadable blob starts an empty ledger; nothing is written.
    pub fn open(store: S, today: NaiveDate) -> TrackerResult<Self> {
        let ledger = load_ledger(&store)?;
        let mut tracker = Tracker {
            ledger,
            selected_year: today.year(),
            store,
        };
        tracker.ensure_year(today.year());
        info!(
            year = tracker.selected_year,
            years = tracker.ledger.years().count(),
            "ledger loaded"
        );
        Ok(tracker)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn selected_year(&self) -> i32 {
        self.selected_year
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Create the year if absent. Idempotent, in memory only.
    pub fn ensure_year(&mut self, year: i32) {
        if self.ledger.ensure_year(year) {
            debug!(year, "year created");
        }
    }

    pub fn add_person(&mut self, name: &str) -> TrackerResult<String> {
        self.add_person_in(self.selected_year, name)
    }

    /// Returns the stored (trimmed) name
    pub fn add_person_in(&mut self, year: i32, name: &str) -> TrackerResult<String> {
        let name = validate_name(name)?;

        let record = self.ledger.year_entry(year);
        if record.contains(name) {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                year,
            }
            .into());
        }
        record.get_or_insert(name);

        info!(year, person = name, "person added");
        self.persist()?;
        Ok(name.to_string())
    }

    pub fn delete_person(
        &mut self,
        name: &str,
        prompt: &mut dyn UserPrompt,
    ) -> TrackerResult<DeleteOutcome> {
        self.delete_person_in(self.selected_year, name, prompt)
    }

    /// Asks for confirmation first; declining is a silent abort
    pub fn delete_person_in(
        &mut self,
        year: i32,
        name: &str,
        prompt: &mut dyn UserPrompt,
    ) -> TrackerResult<DeleteOutcome> {
        let name = name.trim();
        let message = format!("Are you sure you want to delete \"{}\"?", name);
        if !prompt.confirm(&message) {
            debug!(year, person = name, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let removed = self
            .ledger
            .year_mut(year)
            .and_then(|record| record.remove(name))
            .is_some();

        if !removed {
            return Ok(DeleteOutcome::NotFound);
        }

        info!(year, person = name, "person deleted");
        self.persist()?;
        Ok(DeleteOutcome::Deleted)
    }

    pub fn toggle_payment(&mut self, name: &str, month: Month) -> TrackerResult<PaymentStatus> {
        self.toggle_payment_in(self.selected_year, name, month)
    }

    /// Flip one month; an absent value counts as NotPaid, so the first toggle pays.
    /// Missing person/month entries are created on the way.
    pub fn toggle_payment_in(
        &mut self,
        year: i32,
        name: &str,
        month: Month,
    ) -> TrackerResult<PaymentStatus> {
        let name = name.trim();
        let status = self.ledger.year_entry(year).get_or_insert(name).toggle(month);
        info!(year, person = name, month = %month, paid = status.is_paid(), "payment toggled");
        self.persist()?;
        Ok(status)
    }

    /// Move the cursor, creating the year in memory if it is missing
    pub fn switch_year(&mut self, year: i32) {
        self.selected_year = year;
        debug!(year, "year selected");
        self.ensure_year(year);
    }

    // ========================================================================
    // PROJECTIONS
    // ========================================================================

    pub fn grid(&self, today: NaiveDate) -> GridView {
        view::build_grid(&self.ledger, self.selected_year, today)
    }

    pub fn summary(&self) -> SummaryView {
        view::build_summary(&self.ledger, self.selected_year)
    }

    pub fn export(&self) -> TrackerResult<Report> {
        export::export_year(&self.ledger, self.selected_year)
    }

    fn persist(&mut self) -> TrackerResult<()> {
        let blob = encode_ledger(&self.ledger)?;
        if let Err(e) = self.store.save(&blob) {
            error!(error = %e, "failed to save ledger");
            return Err(TrackerError::Storage(e));
        }
        Ok(())
    }
}

/// Years shown by the selector: current year ± YEAR_WINDOW
pub fn year_options(today: NaiveDate) -> RangeInclusive<i32> {
    let year = today.year();
    (year - YEAR_WINDOW)..=(year + YEAR_WINDOW)
}

/// Trims and checks a person name, returning the trimmed form
pub fn validate_name(raw: &str) -> Result<&str, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { len });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use crate::storage::{decode_ledger, MemoryStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn tracker() -> Tracker<MemoryStore> {
        Tracker::open(MemoryStore::new(), today()).unwrap()
    }

    fn stored(tracker: &Tracker<MemoryStore>) -> Ledger {
        decode_ledger(tracker.store().blob().unwrap()).unwrap()
    }

    #[test]
    fn test_open_selects_current_year_and_creates_it() {
        let tracker = tracker();
        assert_eq!(tracker.selected_year(), 2024);
        assert!(tracker.ledger().has_year(2024));
        assert_eq!(tracker.store().save_count(), 0);
    }

    #[test]
    fn test_open_keeps_loaded_ledger_when_saves_fail() {
        let mut store = MemoryStore::with_blob(r#"{"2023":{"Alice":{"March":true}}}"#);
        store.set_fail_saves(true);

        let tracker = Tracker::open(store, today()).unwrap();
        assert_eq!(tracker.selected_year(), 2024);
        assert!(tracker.ledger().has_year(2024));
        assert!(tracker.ledger().year(2023).unwrap().get("Alice").unwrap().is_paid(Month::March));
    }

    #[test]
    fn test_open_existing_year_does_not_write() {
        let store = MemoryStore::with_blob(r#"{"2024":{"Alice":{"March":true}}}"#);
        let tracker = Tracker::open(store, today()).unwrap();
        assert_eq!(tracker.store().save_count(), 0);
        assert_eq!(tracker.summary().entries()[0].paid_count, 1);
    }

    #[test]
    fn test_open_with_corrupt_blob_starts_empty() {
        let store = MemoryStore::with_blob("not json at all");
        let tracker = Tracker::open(store, today()).unwrap();
        assert_eq!(tracker.ledger().person_count(2024), 0);
    }

    #[test]
    fn test_add_person_trims_and_persists() {
        let mut tracker = tracker();
        let name = tracker.add_person("  Alice  ").unwrap();
        assert_eq!(name, "Alice");
        assert!(stored(&tracker).year(2024).unwrap().contains("Alice"));
    }

    #[test]
    fn test_add_person_validation() {
        let mut tracker = tracker();

        let err = tracker.add_person("   ").unwrap_err();
        assert!(matches!(err, TrackerError::Validation(ValidationError::EmptyName)));

        let long = "x".repeat(51);
        let err = tracker.add_person(&long).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation(ValidationError::NameTooLong { len: 51 })
        ));

        // Exactly 50 characters is fine, multi-byte included
        assert!(tracker.add_person(&"é".repeat(50)).is_ok());

        tracker.add_person("Bob").unwrap();
        let saves = tracker.store().save_count();
        let err = tracker.add_person("Bob").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(tracker.store().save_count(), saves);
        assert_eq!(tracker.ledger().person_count(2024), 2);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut tracker = tracker();
        tracker.add_person("Alice").unwrap();

        let mut no = ScriptedPrompt::answering(false);
        assert_eq!(
            tracker.delete_person("Alice", &mut no).unwrap(),
            DeleteOutcome::Cancelled
        );
        assert!(tracker.ledger().year(2024).unwrap().contains("Alice"));
        assert_eq!(no.confirmations, vec!["Are you sure you want to delete \"Alice\"?"]);

        let mut yes = ScriptedPrompt::answering(true);
        assert_eq!(
            tracker.delete_person("Alice", &mut yes).unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(!stored(&tracker).year(2024).unwrap().contains("Alice"));
        assert_eq!(
            tracker.delete_person("Alice", &mut yes).unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn test_toggle_payment_flips_and_persists() {
        let mut tracker = tracker();
        tracker.add_person("Alice").unwrap();

        assert_eq!(
            tracker.toggle_payment("Alice", Month::March).unwrap(),
            PaymentStatus::Paid
        );
        assert!(stored(&tracker).year(2024).unwrap().get("Alice").unwrap().is_paid(Month::March));

        assert_eq!(
            tracker.toggle_payment("Alice", Month::March).unwrap(),
            PaymentStatus::NotPaid
        );
        assert_eq!(tracker.summary().entries()[0].paid_count, 0);
    }

    #[test]
    fn test_switch_year_creates_target_only() {
        let mut tracker = tracker();
        tracker.add_person("Alice").unwrap();
        tracker.toggle_payment("Alice", Month::May).unwrap();
        let before = tracker.ledger().year(2024).cloned();

        let saves = tracker.store().save_count();
        tracker.switch_year(2026);
        assert_eq!(tracker.selected_year(), 2026);
        assert!(tracker.ledger().has_year(2026));
        assert!(tracker.grid(today()).is_empty());
        assert_eq!(tracker.ledger().year(2024).cloned(), before);

        tracker.switch_year(2024);
        assert_eq!(tracker.store().save_count(), saves);

        // The empty year is stored along with the next real change
        tracker.toggle_payment("Alice", Month::June).unwrap();
        assert!(stored(&tracker).has_year(2026));
    }

    #[test]
    fn test_switch_year_with_failing_store() {
        let mut tracker = tracker();
        tracker.store_mut().set_fail_saves(true);

        tracker.switch_year(2027);
        assert_eq!(tracker.selected_year(), 2027);
        assert!(tracker.ledger().has_year(2027));
        assert_eq!(tracker.store().save_count(), 0);
    }

    #[test]
    fn test_delete_and_toggle_use_trimmed_name() {
        let mut tracker = tracker();
        tracker.add_person(" Alice ").unwrap();

        tracker.toggle_payment("Alice  ", Month::April).unwrap();
        let record = tracker.ledger().year(2024).unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.get("Alice").unwrap().is_paid(Month::April));

        let mut yes = ScriptedPrompt::answering(true);
        assert_eq!(
            tracker.delete_person("  Alice", &mut yes).unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(yes.confirmations, vec!["Are you sure you want to delete \"Alice\"?"]);
        assert!(tracker.ledger().year(2024).unwrap().is_empty());
    }

    #[test]
    fn test_storage_failure_is_reported_but_state_kept() {
        let mut tracker = tracker();
        tracker.store_mut().set_fail_saves(true);

        let err = tracker.add_person("Alice").unwrap_err();
        assert!(matches!(err, TrackerError::Storage(_)));
        assert!(err.to_string().starts_with("Error saving data"));
        assert!(tracker.ledger().year(2024).unwrap().contains("Alice"));
    }

    #[test]
    fn test_year_options_window() {
        let years: Vec<i32> = year_options(today()).collect();
        assert_eq!(years.len(), 11);
        assert_eq!(years.first(), Some(&2019));
        assert_eq!(years.last(), Some(&2029));
    }
}
