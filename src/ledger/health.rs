// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Height/weight snapshot per dependent.
//!
//! Values are fixed-point integers scaled by 10 (one decimal digit), so
//! `120.1 cm` is stored as `1201`. Each update overwrites the record.

use std::collections::HashMap;
use std::fmt;

use super::{Account, DependentId, LedgerError, LedgerResult, RelationshipRegistry};

/// A measurement in tenths of its unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Measurement(u16);

impl Measurement {
    /// Fixed-point scale factor.
    pub const SCALE: u16 = 10;

    pub const fn from_scaled(value: u16) -> Self {
        Self(value)
    }

    pub const fn scaled(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthRecord {
    pub height: Measurement,
    pub weight: Measurement,
}

impl HealthRecord {
    /// Build from pre-scaled values.
    pub const fn new(height: u16, weight: u16) -> Self {
        Self {
            height: Measurement::from_scaled(height),
            weight: Measurement::from_scaled(weight),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct HealthRecordStore {
    records: HashMap<DependentId, HealthRecord>,
}

impl HealthRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the record for a newly created dependent.
    pub fn initialize(&mut self, dependent: DependentId, record: HealthRecord) {
        self.records.insert(dependent, record);
    }

    pub fn get(
        &self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<HealthRecord> {
        registry.ensure_guardian(requester, dependent)?;
        self.records
            .get(&dependent)
            .copied()
            .ok_or_else(|| LedgerError::DependentNotFound(dependent.to_string()))
    }

    /// Overwrite the record. Last write wins.
    pub fn set(
        &mut self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
        record: HealthRecord,
    ) -> LedgerResult<()> {
        registry.ensure_guardian(requester, dependent)?;
        self.records.insert(dependent, record);
        Ok(())
    }
}
