// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only medical visit history per dependent.

use std::collections::HashMap;

use super::{Account, DependentId, LedgerResult, RelationshipRegistry};

/// One visit. Entries are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalHistoryEntry {
    /// Visit category as carried on the wire (`uint8`).
    pub medical_type: u8,
    pub visited_name: String,
    /// Caller-supplied timestamp, kept verbatim.
    pub timestamp: String,
    pub doctor_name: String,
    pub symptoms: String,
    pub diagnosis_details: String,
}

#[derive(Debug, Default, Clone)]
pub struct MedicalHistoryLedger {
    entries: HashMap<DependentId, Vec<MedicalHistoryEntry>>,
}

impl MedicalHistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, dependent: DependentId) {
        self.entries.entry(dependent).or_default();
    }

    /// Append an entry; returns its position in the sequence.
    pub fn append(
        &mut self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
        entry: MedicalHistoryEntry,
    ) -> LedgerResult<usize> {
        registry.ensure_guardian(requester, dependent)?;
        let history = self.entries.entry(dependent).or_default();
        history.push(entry);
        Ok(history.len() - 1)
    }

    /// All entries in append order.
    pub fn list(
        &self,
        registry: &RelationshipRegistry,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<&[MedicalHistoryEntry]> {
        registry.ensure_guardian(requester, dependent)?;
        Ok(self
            .entries
            .get(&dependent)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }
}
