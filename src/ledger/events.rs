// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger event log.
//!
//! Every accepted step is assigned a sequence number and the events it
//! emitted are appended under that number. A step may emit nothing (for
//! example a stale vaccination report) and still consumes a sequence.

use alloy::primitives::B256;
use serde_json::{json, Value};

use super::{Account, DependentId};

/// Types of ledger events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    DependentCreated {
        dependent: DependentId,
        creator: Account,
        name: String,
        birth_date: u64,
        height: u16,
        weight: u16,
    },
    GuardianLinked {
        dependent: DependentId,
        guardian: Account,
    },
    HealthInfoUpdated {
        dependent: DependentId,
        by: Account,
        height: u16,
        weight: u16,
    },
    MedicalHistoryAdded {
        dependent: DependentId,
        by: Account,
        index: u64,
    },
    VaccinationUpdated {
        dependent: DependentId,
        by: Account,
        vaccine_name: String,
        chapter: u8,
        administered_date: u64,
    },
}

impl LedgerEvent {
    /// The dependent this event belongs to.
    pub fn dependent(&self) -> DependentId {
        match self {
            LedgerEvent::DependentCreated { dependent, .. }
            | LedgerEvent::GuardianLinked { dependent, .. }
            | LedgerEvent::HealthInfoUpdated { dependent, .. }
            | LedgerEvent::MedicalHistoryAdded { dependent, .. }
            | LedgerEvent::VaccinationUpdated { dependent, .. } => *dependent,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::DependentCreated { .. } => "DependentCreated",
            LedgerEvent::GuardianLinked { .. } => "GuardianLinked",
            LedgerEvent::HealthInfoUpdated { .. } => "HealthInfoUpdated",
            LedgerEvent::MedicalHistoryAdded { .. } => "MedicalHistoryAdded",
            LedgerEvent::VaccinationUpdated { .. } => "VaccinationUpdated",
        }
    }

    /// JSON form reported in relay receipts: `{"event": <name>, "args": {..}}`.
    pub fn to_json(&self) -> Value {
        let args = match self {
            LedgerEvent::DependentCreated {
                dependent,
                creator,
                name,
                birth_date,
                height,
                weight,
            } => json!({
                "childAddress": dependent.to_string(),
                "parent": creator.to_string(),
                "name": name,
                "birthDate": birth_date,
                "height": height,
                "weight": weight,
            }),
            LedgerEvent::GuardianLinked {
                dependent,
                guardian,
            } => json!({
                "childAddress": dependent.to_string(),
                "parent": guardian.to_string(),
            }),
            LedgerEvent::HealthInfoUpdated {
                dependent,
                by,
                height,
                weight,
            } => json!({
                "childAddress": dependent.to_string(),
                "parent": by.to_string(),
                "height": height,
                "weight": weight,
            }),
            LedgerEvent::MedicalHistoryAdded {
                dependent,
                by,
                index,
            } => json!({
                "childAddress": dependent.to_string(),
                "parent": by.to_string(),
                "index": index,
            }),
            LedgerEvent::VaccinationUpdated {
                dependent,
                by,
                vaccine_name,
                chapter,
                administered_date,
            } => json!({
                "childAddress": dependent.to_string(),
                "parent": by.to_string(),
                "vaccineName": vaccine_name,
                "vaccineChapter": chapter,
                "administeredDate": administered_date,
            }),
        };
        json!({ "event": self.name(), "args": args })
    }
}

/// An event as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub sequence: u64,
    pub transaction_hash: B256,
    pub event: LedgerEvent,
}

#[derive(Debug, Default, Clone)]
pub struct EventLog {
    steps: u64,
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence the next recorded step will receive.
    pub fn next_sequence(&self) -> u64 {
        self.steps + 1
    }

    /// Append the events of one accepted step and return its sequence.
    pub fn record(&mut self, transaction_hash: B256, events: Vec<LedgerEvent>) -> u64 {
        self.steps += 1;
        let sequence = self.steps;
        self.records
            .extend(events.into_iter().map(|event| EventRecord {
                sequence,
                transaction_hash,
                event,
            }));
        sequence
    }

    pub fn for_dependent(&self, dependent: DependentId) -> Vec<&EventRecord> {
        self.records
            .iter()
            .filter(|record| record.event.dependent() == dependent)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn linked(dependent: u8, guardian: u8) -> LedgerEvent {
        LedgerEvent::GuardianLinked {
            dependent: Address::repeat_byte(dependent),
            guardian: Address::repeat_byte(guardian),
        }
    }

    #[test]
    fn empty_steps_still_advance_sequence() {
        let mut log = EventLog::new();

        assert_eq!(log.next_sequence(), 1);
        assert_eq!(log.record(B256::repeat_byte(1), Vec::new()), 1);
        assert_eq!(log.record(B256::repeat_byte(2), vec![linked(9, 1)]), 2);
        assert_eq!(log.next_sequence(), 3);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn filters_by_dependent() {
        let mut log = EventLog::new();
        log.record(B256::repeat_byte(1), vec![linked(9, 1), linked(8, 1)]);
        log.record(B256::repeat_byte(2), vec![linked(9, 2)]);

        let history = log.for_dependent(Address::repeat_byte(9));
        let sequences: Vec<_> = history.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, [1, 2]);
        assert_eq!(history[1].transaction_hash, B256::repeat_byte(2));
    }

    #[test]
    fn json_uses_wire_field_names() {
        let event = LedgerEvent::VaccinationUpdated {
            dependent: Address::repeat_byte(9),
            by: Address::repeat_byte(1),
            vaccine_name: "DTap".into(),
            chapter: 2,
            administered_date: 1_728_518_400,
        };

        let value = event.to_json();
        assert_eq!(value["event"], "VaccinationUpdated");
        assert_eq!(value["args"]["vaccineName"], "DTap");
        assert_eq!(value["args"]["vaccineChapter"], 2);
        assert_eq!(
            value["args"]["childAddress"],
            Address::repeat_byte(9).to_string()
        );
    }
}
