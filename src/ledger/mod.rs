// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Guardian Ledger State
//!
//! In-process model of the ledger-resident state: per-account nonces, the
//! guardian/dependent relationship graph, and the three per-dependent record
//! stores (health, medical history, vaccination).
//!
//! ## Atomicity
//!
//! Every mutation runs as a single step with two phases:
//!
//! 1. **Guard** - nonce, existence, guardianship and payload checks. Any
//!    failure returns an error and nothing has been written.
//! 2. **Commit** - infallible writes to the stores, the nonce bump and the
//!    event log.
//!
//! Callers serialize steps by holding `&mut Ledger` (the relay keeps it
//! behind a `RwLock`), so no intermediate state is ever observable.

pub mod events;
pub mod health;
pub mod medical;
pub mod nonce;
pub mod registry;
pub mod vaccination;

use alloy::primitives::{keccak256, Address, B256, U256};

pub use events::{EventLog, EventRecord, LedgerEvent};
pub use health::{HealthRecord, HealthRecordStore, Measurement};
pub use medical::{MedicalHistoryEntry, MedicalHistoryLedger};
pub use nonce::NonceLedger;
pub use registry::{age_in_months, DependentRecord, RelationshipRegistry};
pub use vaccination::{
    VaccinationChange, VaccinationStatus, VaccinationTracker, VaccinationUpdate, VaccineProgress,
};

/// An account identity (20-byte address).
pub type Account = Address;

/// Identity of a dependent, issued by the [`RelationshipRegistry`].
pub type DependentId = Address;

/// Rejection reasons shared by the ledger and the meta-transaction gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Payload does not match schema: {0}")]
    SchemaMismatch(String),

    #[error("Signer mismatch for {claimed}: {reason}")]
    SignerMismatch { claimed: Address, reason: String },

    #[error("Nonce mismatch for {account}: expected {expected}, got {provided}")]
    NonceMismatch {
        account: Address,
        expected: U256,
        provided: U256,
    },

    #[error("Account {account} is not a guardian of dependent {dependent}")]
    UnauthorizedAccess { account: Address, dependent: Address },

    #[error("Dependent not found: {0}")]
    DependentNotFound(String),

    #[error("Dependent named '{name}' already exists for creator {creator}")]
    DuplicateIdentity { creator: Address, name: String },
}

impl LedgerError {
    /// Stable machine-readable code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            LedgerError::SignerMismatch { .. } => "SIGNER_MISMATCH",
            LedgerError::NonceMismatch { .. } => "NONCE_MISMATCH",
            LedgerError::UnauthorizedAccess { .. } => "UNAUTHORIZED_ACCESS",
            LedgerError::DependentNotFound(_) => "DEPENDENT_NOT_FOUND",
            LedgerError::DuplicateIdentity { .. } => "DUPLICATE_IDENTITY",
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A state transition requested by an already-identified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateDependent {
        name: String,
        birth_date: u64,
        health: HealthRecord,
    },
    LinkGuardian {
        dependent: DependentId,
    },
    SetHealth {
        dependent: DependentId,
        record: HealthRecord,
    },
    AddMedicalHistory {
        dependent: DependentId,
        entry: MedicalHistoryEntry,
    },
    UpdateVaccination {
        dependent: DependentId,
        update: VaccinationUpdate,
    },
    UpdateVaccinationBatch {
        dependent: DependentId,
        updates: Vec<VaccinationUpdate>,
    },
}

impl Mutation {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateDependent { .. } => "create_dependent",
            Mutation::LinkGuardian { .. } => "link_guardian",
            Mutation::SetHealth { .. } => "set_health",
            Mutation::AddMedicalHistory { .. } => "add_medical_history",
            Mutation::UpdateVaccination { .. } => "update_vaccination",
            Mutation::UpdateVaccinationBatch { .. } => "update_vaccination_batch",
        }
    }
}

/// Outcome of an accepted state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Identifier of the accepted step.
    pub transaction_hash: B256,
    /// Position of the step in ledger order (starts at 1).
    pub sequence: u64,
    /// The account the step was executed for.
    pub caller: Account,
    /// Dependent the step touched (the new id for creations).
    pub dependent: DependentId,
    /// Events emitted by the step, in emission order.
    pub events: Vec<LedgerEvent>,
}

/// The full ledger state.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    nonces: NonceLedger,
    registry: RelationshipRegistry,
    health: HealthRecordStore,
    medical: MedicalHistoryLedger,
    vaccination: VaccinationTracker,
    events: EventLog,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Apply a signature-authorized mutation for `signer`.
    ///
    /// `nonce` must equal the signer's current counter. The counter is bumped
    /// only if the mutation itself is accepted.
    pub fn apply_meta(
        &mut self,
        signer: Account,
        nonce: U256,
        mutation: Mutation,
        transaction_hash: B256,
    ) -> LedgerResult<Receipt> {
        self.nonces.ensure_current(signer, nonce)?;
        let (dependent, events) = self.dispatch(signer, mutation)?;
        self.nonces.advance(signer);
        Ok(self.seal(transaction_hash, signer, dependent, events))
    }

    /// Apply a mutation on behalf of an already-authenticated caller.
    ///
    /// Same guardianship rules as [`Ledger::apply_meta`]; nonces are untouched.
    pub fn submit(&mut self, caller: Account, mutation: Mutation) -> LedgerResult<Receipt> {
        let (dependent, events) = self.dispatch(caller, mutation)?;
        let sequence = self.events.next_sequence();
        let mut preimage = Vec::with_capacity(28);
        preimage.extend_from_slice(caller.as_slice());
        preimage.extend_from_slice(&sequence.to_be_bytes());
        let transaction_hash = keccak256(&preimage);
        Ok(self.seal(transaction_hash, caller, dependent, events))
    }

    /// Route a mutation to its store. Each store call guards before writing.
    fn dispatch(
        &mut self,
        caller: Account,
        mutation: Mutation,
    ) -> LedgerResult<(DependentId, Vec<LedgerEvent>)> {
        match mutation {
            Mutation::CreateDependent {
                name,
                birth_date,
                health,
            } => {
                let id = self.registry.create_dependent(caller, &name, birth_date)?;
                self.health.initialize(id, health);
                self.medical.initialize(id);
                self.vaccination.initialize(id);
                Ok((
                    id,
                    vec![LedgerEvent::DependentCreated {
                        dependent: id,
                        creator: caller,
                        name,
                        birth_date,
                        height: health.height.scaled(),
                        weight: health.weight.scaled(),
                    }],
                ))
            }
            Mutation::LinkGuardian { dependent } => {
                let added = self.registry.link_guardian(caller, dependent)?;
                let events = if added {
                    vec![LedgerEvent::GuardianLinked {
                        dependent,
                        guardian: caller,
                    }]
                } else {
                    Vec::new()
                };
                Ok((dependent, events))
            }
            Mutation::SetHealth { dependent, record } => {
                self.health.set(&self.registry, caller, dependent, record)?;
                Ok((
                    dependent,
                    vec![LedgerEvent::HealthInfoUpdated {
                        dependent,
                        by: caller,
                        height: record.height.scaled(),
                        weight: record.weight.scaled(),
                    }],
                ))
            }
            Mutation::AddMedicalHistory { dependent, entry } => {
                let index = self
                    .medical
                    .append(&self.registry, caller, dependent, entry)?;
                Ok((
                    dependent,
                    vec![LedgerEvent::MedicalHistoryAdded {
                        dependent,
                        by: caller,
                        index: index as u64,
                    }],
                ))
            }
            Mutation::UpdateVaccination { dependent, update } => {
                let change = self
                    .vaccination
                    .update(&self.registry, caller, dependent, update)?;
                Ok((dependent, vaccination_events(dependent, caller, [change])))
            }
            Mutation::UpdateVaccinationBatch { dependent, updates } => {
                let changes =
                    self.vaccination
                        .update_batch(&self.registry, caller, dependent, updates)?;
                Ok((dependent, vaccination_events(dependent, caller, changes)))
            }
        }
    }

    fn seal(
        &mut self,
        transaction_hash: B256,
        caller: Account,
        dependent: DependentId,
        events: Vec<LedgerEvent>,
    ) -> Receipt {
        let sequence = self.events.record(transaction_hash, events.clone());
        Receipt {
            transaction_hash,
            sequence,
            caller,
            dependent,
            events,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current nonce of `account` (0 if it never submitted).
    pub fn nonce_of(&self, account: Account) -> U256 {
        self.nonces.current_nonce(account)
    }

    pub fn is_guardian(&self, account: Account, dependent: DependentId) -> bool {
        self.registry.is_guardian(account, dependent)
    }

    /// Dependents `account` guards, in link order.
    pub fn dependents_of(&self, account: Account) -> Vec<&DependentRecord> {
        self.registry.dependents_of(account)
    }

    pub fn dependent(
        &self,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<&DependentRecord> {
        self.registry.ensure_guardian(requester, dependent)
    }

    pub fn dependent_by_name(
        &self,
        requester: Account,
        name: &str,
    ) -> LedgerResult<&DependentRecord> {
        self.registry.dependent_by_name(requester, name)
    }

    pub fn health(&self, requester: Account, dependent: DependentId) -> LedgerResult<HealthRecord> {
        self.health.get(&self.registry, requester, dependent)
    }

    pub fn medical_history(
        &self,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<&[MedicalHistoryEntry]> {
        self.medical.list(&self.registry, requester, dependent)
    }

    pub fn vaccination_status(
        &self,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<VaccinationStatus> {
        self.vaccination.status(&self.registry, requester, dependent)
    }

    /// Events touching `dependent`, in ledger order. Guardians only.
    pub fn events_for(
        &self,
        requester: Account,
        dependent: DependentId,
    ) -> LedgerResult<Vec<&EventRecord>> {
        self.registry.ensure_guardian(requester, dependent)?;
        Ok(self.events.for_dependent(dependent))
    }

    /// Number of dependents ever created.
    pub fn dependent_count(&self) -> usize {
        self.registry.len()
    }
}

fn vaccination_events(
    dependent: DependentId,
    by: Account,
    changes: impl IntoIterator<Item = VaccinationChange>,
) -> Vec<LedgerEvent> {
    changes
        .into_iter()
        .filter(VaccinationChange::applied)
        .map(|change| LedgerEvent::VaccinationUpdated {
            dependent,
            by,
            vaccine_name: change.vaccine_name,
            chapter: change.current,
            administered_date: change.administered_date,
        })
        .collect()
}
