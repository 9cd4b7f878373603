// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Guardian/dependent relationship graph.
//!
//! The registry is the only authority on "may account X touch dependent Y".
//! Every other store calls [`RelationshipRegistry::ensure_guardian`] before
//! reading or writing dependent data.
//!
//! Dependents live in an arena indexed by a monotonically issued sequence
//! number. The public identity of a dependent is an address derived from
//! `keccak256(creator ‖ sequence ‖ name)`, which is what guardians sign over
//! as `childAddress`.

use std::collections::{HashMap, HashSet};

use alloy::primitives::{keccak256, Address};
use chrono::{DateTime, Datelike};
use unicode_normalization::UnicodeNormalization;

use super::{Account, DependentId, LedgerError, LedgerResult};

/// A dependent and the accounts linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentRecord {
    pub id: DependentId,
    pub name: String,
    /// Seconds since the Unix epoch.
    pub birth_date: u64,
    pub creator: Account,
    /// Guardians in link order; the creator is always first.
    pub guardians: Vec<Account>,
    pub sequence: u64,
}

impl DependentRecord {
    pub fn has_guardian(&self, account: Account) -> bool {
        self.guardians.contains(&account)
    }

    /// Age in whole months at `now` (seconds since epoch).
    pub fn age_in_months(&self, now: u64) -> u32 {
        age_in_months(self.birth_date, now)
    }
}

#[derive(Debug, Default, Clone)]
pub struct RelationshipRegistry {
    arena: Vec<DependentRecord>,
    index: HashMap<DependentId, usize>,
    by_guardian: HashMap<Account, Vec<usize>>,
    /// (creator, normalized name) pairs already taken.
    names: HashSet<(Account, String)>,
}

impl RelationshipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Create a dependent with `creator` as its only guardian.
    ///
    /// Names are unique per creator after NFC normalization and trimming.
    pub fn create_dependent(
        &mut self,
        creator: Account,
        name: &str,
        birth_date: u64,
    ) -> LedgerResult<DependentId> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(LedgerError::SchemaMismatch(
                "dependent name must not be empty".to_string(),
            ));
        }
        if self.names.contains(&(creator, key.clone())) {
            return Err(LedgerError::DuplicateIdentity {
                creator,
                name: name.to_string(),
            });
        }

        let sequence = self.arena.len() as u64;
        let id = derive_dependent_id(creator, sequence, name);
        if self.index.contains_key(&id) {
            return Err(LedgerError::DuplicateIdentity {
                creator,
                name: name.to_string(),
            });
        }

        let slot = self.arena.len();
        self.arena.push(DependentRecord {
            id,
            name: name.to_string(),
            birth_date,
            creator,
            guardians: vec![creator],
            sequence,
        });
        self.index.insert(id, slot);
        self.by_guardian.entry(creator).or_default().push(slot);
        self.names.insert((creator, key));

        tracing::debug!(dependent = %id, creator = %creator, "dependent created");
        Ok(id)
    }

    /// Add `requester` to the dependent's guardians.
    ///
    /// Returns `false` if `requester` was already linked. No consent from
    /// existing guardians is required.
    pub fn link_guardian(&mut self, requester: Account, dependent: DependentId) -> LedgerResult<bool> {
        let slot = *self
            .index
            .get(&dependent)
            .ok_or_else(|| LedgerError::DependentNotFound(dependent.to_string()))?;

        let record = &mut self.arena[slot];
        if record.has_guardian(requester) {
            return Ok(false);
        }
        record.guardians.push(requester);
        self.by_guardian.entry(requester).or_default().push(slot);

        tracing::debug!(dependent = %dependent, guardian = %requester, "guardian linked");
        Ok(true)
    }

    pub fn is_guardian(&self, account: Account, dependent: DependentId) -> bool {
        self.get(dependent)
            .map(|record| record.has_guardian(account))
            .unwrap_or(false)
    }

    pub fn get(&self, dependent: DependentId) -> Option<&DependentRecord> {
        self.index.get(&dependent).map(|&slot| &self.arena[slot])
    }

    /// Access gate used by every dependent-scoped read and write.
    pub fn ensure_guardian(
        &self,
        account: Account,
        dependent: DependentId,
    ) -> LedgerResult<&DependentRecord> {
        let record = self
            .get(dependent)
            .ok_or_else(|| LedgerError::DependentNotFound(dependent.to_string()))?;
        if !record.has_guardian(account) {
            return Err(LedgerError::UnauthorizedAccess { account, dependent });
        }
        Ok(record)
    }

    /// Dependents `account` guards, in link order.
    pub fn dependents_of(&self, account: Account) -> Vec<&DependentRecord> {
        self.by_guardian
            .get(&account)
            .map(|slots| slots.iter().map(|&slot| &self.arena[slot]).collect())
            .unwrap_or_default()
    }

    /// Ids of the dependents `account` guards.
    pub fn list_dependents(&self, account: Account) -> Vec<DependentId> {
        self.dependents_of(account)
            .into_iter()
            .map(|record| record.id)
            .collect()
    }

    /// Find a dependent by name among those `requester` guards.
    pub fn dependent_by_name(&self, requester: Account, name: &str) -> LedgerResult<&DependentRecord> {
        let key = normalize_name(name);
        self.dependents_of(requester)
            .into_iter()
            .find(|record| normalize_name(&record.name) == key)
            .ok_or_else(|| LedgerError::DependentNotFound(name.to_string()))
    }
}

/// Canonical form used for name comparisons.
fn normalize_name(name: &str) -> String {
    name.trim().nfc().collect()
}

fn derive_dependent_id(creator: Account, sequence: u64, name: &str) -> DependentId {
    let mut preimage = Vec::with_capacity(20 + 8 + name.len());
    preimage.extend_from_slice(creator.as_slice());
    preimage.extend_from_slice(&sequence.to_be_bytes());
    preimage.extend_from_slice(name.as_bytes());
    let hash = keccak256(&preimage);
    Address::from_slice(&hash[12..])
}

/// Whole months elapsed between two Unix timestamps (0 if `now` precedes birth).
pub fn age_in_months(birth_date: u64, now: u64) -> u32 {
    let (Some(birth), Some(now)) = (
        DateTime::from_timestamp(birth_date.min(i64::MAX as u64) as i64, 0),
        DateTime::from_timestamp(now.min(i64::MAX as u64) as i64, 0),
    ) else {
        return 0;
    };
    if now <= birth {
        return 0;
    }

    let mut months = (now.year() - birth.year()) * 12 + now.month() as i32 - birth.month() as i32;
    if now.day() < birth.day() {
        months -= 1;
    }
    months.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOV_1_2024: u64 = 1_730_419_200;

    fn account(byte: u8) -> Account {
        Address::repeat_byte(byte)
    }

    #[test]
    fn creator_is_first_guardian() {
        let mut registry = RelationshipRegistry::new();
        let parent = account(1);

        let id = registry.create_dependent(parent, "Kim", NOV_1_2024).unwrap();
        let record = registry.get(id).unwrap();

        assert_eq!(record.guardians, vec![parent]);
        assert_eq!(record.creator, parent);
        assert_eq!(record.sequence, 0);
        assert!(registry.is_guardian(parent, id));
        assert_eq!(registry.list_dependents(parent), vec![id]);
    }

    #[test]
    fn names_are_unique_per_creator() {
        let mut registry = RelationshipRegistry::new();
        let first = account(1);
        let second = account(2);

        registry.create_dependent(first, "Kim", NOV_1_2024).unwrap();
        let err = registry
            .create_dependent(first, "  Kim ", NOV_1_2024)
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_IDENTITY");

        // Another creator may reuse the name.
        assert!(registry.create_dependent(second, "Kim", NOV_1_2024).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_check_uses_nfc() {
        let mut registry = RelationshipRegistry::new();
        let parent = account(1);

        // Precomposed vs. decomposed "é".
        registry.create_dependent(parent, "Ren\u{e9}", 0).unwrap();
        let err = registry
            .create_dependent(parent, "Rene\u{301}", 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateIdentity { .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut registry = RelationshipRegistry::new();
        let err = registry.create_dependent(account(1), "   ", 0).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MISMATCH");
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_differ_for_same_name_across_creators() {
        let mut registry = RelationshipRegistry::new();
        let a = registry.create_dependent(account(1), "Kim", 0).unwrap();
        let b = registry.create_dependent(account(2), "Kim", 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn link_guardian_is_idempotent() {
        let mut registry = RelationshipRegistry::new();
        let parent = account(1);
        let other = account(2);
        let id = registry.create_dependent(parent, "Kim", 0).unwrap();

        assert!(registry.link_guardian(other, id).unwrap());
        assert!(!registry.link_guardian(other, id).unwrap());
        assert!(!registry.link_guardian(parent, id).unwrap());

        assert_eq!(registry.get(id).unwrap().guardians, vec![parent, other]);
        assert_eq!(registry.list_dependents(other), vec![id]);
    }

    #[test]
    fn link_unknown_dependent_fails() {
        let mut registry = RelationshipRegistry::new();
        let missing = account(9);
        assert_eq!(
            registry.link_guardian(account(1), missing).unwrap_err(),
            LedgerError::DependentNotFound(missing.to_string())
        );
    }

    #[test]
    fn ensure_guardian_distinguishes_missing_and_unauthorized() {
        let mut registry = RelationshipRegistry::new();
        let parent = account(1);
        let id = registry.create_dependent(parent, "Kim", 0).unwrap();

        assert!(registry.ensure_guardian(parent, id).is_ok());
        assert!(matches!(
            registry.ensure_guardian(account(2), id),
            Err(LedgerError::UnauthorizedAccess { .. })
        ));
        assert!(matches!(
            registry.ensure_guardian(parent, account(3)),
            Err(LedgerError::DependentNotFound(_))
        ));
    }

    #[test]
    fn lookup_by_name_is_scoped_to_requester() {
        let mut registry = RelationshipRegistry::new();
        let parent = account(1);
        let other = account(2);
        let id = registry.create_dependent(parent, "고현림", 0).unwrap();

        assert_eq!(registry.dependent_by_name(parent, "고현림").unwrap().id, id);
        assert!(registry.dependent_by_name(other, "고현림").is_err());

        registry.link_guardian(other, id).unwrap();
        assert_eq!(registry.dependent_by_name(other, "고현림").unwrap().id, id);
    }

    #[test]
    fn age_counts_whole_months() {
        // 2024-11-01 -> 2025-01-31 is two whole months.
        assert_eq!(age_in_months(NOV_1_2024, 1_738_281_600), 2);
        // 2024-11-01 -> 2025-11-01 is twelve.
        assert_eq!(age_in_months(NOV_1_2024, 1_761_955_200), 12);
        assert_eq!(age_in_months(NOV_1_2024, NOV_1_2024 - 1), 0);
    }
}
