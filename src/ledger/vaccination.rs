// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-dependent vaccine dose tracking.
//!
//! The recorded chapter of a vaccine only ever increases. Reporting chapter
//! `N` backfills every unrecorded chapter up to `N` with the reported date;
//! a report at or below the recorded chapter is accepted and ignored.

use std::collections::{BTreeMap, HashMap};

use super::{Account, DependentId, LedgerError, LedgerResult, RelationshipRegistry};

/// A single dose report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationUpdate {
    pub vaccine_name: String,
    pub chapter: u8,
    /// Seconds since the Unix epoch.
    pub administered_date: u64,
}

impl VaccinationUpdate {
    pub fn new(vaccine_name: impl Into<String>, chapter: u8, administered_date: u64) -> Self {
        Self {
            vaccine_name: vaccine_name.into(),
            chapter,
            administered_date,
        }
    }

    fn validate(&self) -> LedgerResult<()> {
        if self.vaccine_name.trim().is_empty() {
            return Err(LedgerError::SchemaMismatch(
                "vaccineName must not be empty".to_string(),
            ));
        }
        if self.chapter == 0 {
            return Err(LedgerError::SchemaMismatch(format!(
                "vaccineChapter for {} must be at least 1",
                self.vaccine_name
            )));
        }
        Ok(())
    }
}

/// Progress on one vaccine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaccineProgress {
    /// Highest chapter recorded.
    pub chapter: u8,
    /// Date attached to the highest chapter.
    pub administered_date: u64,
    /// Every completed chapter and the date it was recorded with.
    pub doses: BTreeMap<u8, u64>,
}

/// Snapshot of a dependent's vaccinations, keyed by vaccine name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaccinationStatus {
    pub vaccines: BTreeMap<String, VaccineProgress>,
}

impl VaccinationStatus {
    pub fn is_empty(&self) -> bool {
        self.vaccines.is_empty()
    }

    pub fn get(&self, vaccine_name: &str) -> Option<&VaccineProgress> {
        self.vaccines.get(vaccine_name)
    }

    fn apply(&mut self, update: VaccinationUpdate) -> VaccinationChange {
        let progress = self
            .vaccines
            .entry(update.vaccine_name.clone())
            .or_default();
        let previous = progress.chapter;

        if update.chapter > previous {
            for chapter in previous + 1..=update.chapter {
                progress.doses.insert(chapter, update.administered_date);
            }
            progress.chapter = update.chapter;
            progress.administered_date = update.administered_date;
        }

        VaccinationChange {
            vaccine_name: update.vaccine_name,
            previous,
            current: progress.chapter,
            administered_date: update.administered_date,
        }
    }
}

/// What a single update did to the recorded chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationChange {
    pub vaccine_name: String,
    pub previous: u8,
    pub current: u8,
    pub administered_date: u64,
}

impl VaccinationChange {
    /// `false` for stale reports that left the status untouched.
    pub fn applied(&self) -> bool {
        self.current > self.previous
    }
}

#[derive(Debug, Default, Clone)]
pub struct VaccinationTracker {
    statuses: HashMap<DependentId, VaccinationStatus>,
}

impl VaccinationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, dependent: DependentId) {
        self.statuses.entry(dependent).or_default();
    }

    pub fn update(
        &mut self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
        update: VaccinationUpdate,
    ) -> LedgerResult<VaccinationChange> {
        registry.ensure_guardian(requester, dependent)?;
        update.validate()?;

        let change = self.statuses.entry(dependent).or_default().apply(update);
        tracing::debug!(
            dependent = %dependent,
            vaccine = %change.vaccine_name,
            previous = change.previous,
            current = change.current,
            "vaccination reported"
        );
        Ok(change)
    }

    /// Apply `updates` in order. Every entry is validated first, so a single
    /// bad entry rejects the whole batch.
    pub fn update_batch(
        &mut self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
        updates: Vec<VaccinationUpdate>,
    ) -> LedgerResult<Vec<VaccinationChange>> {
        registry.ensure_guardian(requester, dependent)?;
        for update in &updates {
            update.validate()?;
        }

        let status = self.statuses.entry(dependent).or_default();
        let changes: Vec<_> = updates.into_iter().map(|u| status.apply(u)).collect();
        tracing::debug!(
            dependent = %dependent,
            entries = changes.len(),
            applied = changes.iter().filter(|c| c.applied()).count(),
            "vaccination batch reported"
        );
        Ok(changes)
    }

    pub fn status(
        &self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<VaccinationStatus> {
        registry.ensure_guardian(requester, dependent)?;
        Ok(self.statuses.get(&dependent).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    const OCT_10_2024: u64 = 1_728_518_400;
    const DEC_10_2024: u64 = 1_733_788_800;

    fn setup() -> (RelationshipRegistry, VaccinationTracker, Account, DependentId) {
        let mut registry = RelationshipRegistry::new();
        let mut tracker = VaccinationTracker::new();
        let parent = Address::repeat_byte(1);
        let child = registry.create_dependent(parent, "Kim", 0).unwrap();
        tracker.initialize(child);
        (registry, tracker, parent, child)
    }

    #[test]
    fn reporting_a_later_chapter_backfills() {
        let (registry, mut tracker, parent, child) = setup();

        let change = tracker
            .update(&registry, parent, child, VaccinationUpdate::new("DTap", 2, OCT_10_2024))
            .unwrap();
        assert_eq!((change.previous, change.current), (0, 2));

        let status = tracker.status(&registry, parent, child).unwrap();
        let dtap = status.get("DTap").unwrap();
        assert_eq!(dtap.chapter, 2);
        assert_eq!(dtap.administered_date, OCT_10_2024);
        assert_eq!(
            dtap.doses,
            BTreeMap::from([(1, OCT_10_2024), (2, OCT_10_2024)])
        );
    }

    #[test]
    fn stale_report_is_a_no_op() {
        let (registry, mut tracker, parent, child) = setup();
        tracker
            .update(&registry, parent, child, VaccinationUpdate::new("DTap", 2, OCT_10_2024))
            .unwrap();
        let before = tracker.status(&registry, parent, child).unwrap();

        for chapter in [1, 2] {
            let change = tracker
                .update(
                    &registry,
                    parent,
                    child,
                    VaccinationUpdate::new("DTap", chapter, DEC_10_2024),
                )
                .unwrap();
            assert!(!change.applied());
        }

        assert_eq!(tracker.status(&registry, parent, child).unwrap(), before);
    }

    #[test]
    fn later_chapter_keeps_earlier_dates() {
        let (registry, mut tracker, parent, child) = setup();
        tracker
            .update(&registry, parent, child, VaccinationUpdate::new("Hep B", 1, OCT_10_2024))
            .unwrap();
        tracker
            .update(&registry, parent, child, VaccinationUpdate::new("Hep B", 3, DEC_10_2024))
            .unwrap();

        let status = tracker.status(&registry, parent, child).unwrap();
        assert_eq!(
            status.get("Hep B").unwrap().doses,
            BTreeMap::from([(1, OCT_10_2024), (2, DEC_10_2024), (3, DEC_10_2024)])
        );
    }

    #[test]
    fn batch_applies_in_order() {
        let (registry, mut tracker, parent, child) = setup();

        let changes = tracker
            .update_batch(
                &registry,
                parent,
                child,
                vec![
                    VaccinationUpdate::new("BCG", 1, OCT_10_2024),
                    VaccinationUpdate::new("DTap", 3, OCT_10_2024),
                    VaccinationUpdate::new("DTap", 2, DEC_10_2024),
                ],
            )
            .unwrap();

        let applied: Vec<_> = changes.iter().map(VaccinationChange::applied).collect();
        assert_eq!(applied, [true, true, false]);
        let status = tracker.status(&registry, parent, child).unwrap();
        assert_eq!(status.vaccines.len(), 2);
        assert_eq!(status.get("DTap").unwrap().chapter, 3);
    }

    #[test]
    fn invalid_entry_rejects_whole_batch() {
        let (registry, mut tracker, parent, child) = setup();

        let err = tracker
            .update_batch(
                &registry,
                parent,
                child,
                vec![
                    VaccinationUpdate::new("BCG", 1, OCT_10_2024),
                    VaccinationUpdate::new("", 1, OCT_10_2024),
                ],
            )
            .unwrap_err();

        assert_eq!(err.code(), "SCHEMA_MISMATCH");
        assert!(tracker.status(&registry, parent, child).unwrap().is_empty());
    }

    #[test]
    fn chapter_zero_is_rejected() {
        let (registry, mut tracker, parent, child) = setup();
        assert!(matches!(
            tracker.update(&registry, parent, child, VaccinationUpdate::new("BCG", 0, 0)),
            Err(LedgerError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn non_guardian_batch_writes_nothing() {
        let (registry, mut tracker, parent, child) = setup();
        let stranger = Address::repeat_byte(2);

        let err = tracker
            .update_batch(
                &registry,
                stranger,
                child,
                vec![VaccinationUpdate::new("BCG", 1, OCT_10_2024)],
            )
            .unwrap_err();

        assert!(matches!(err, LedgerError::UnauthorizedAccess { .. }));
        assert!(tracker.status(&registry, parent, child).unwrap().is_empty());
        assert!(tracker.status(&registry, stranger, child).is_err());
    }
}
