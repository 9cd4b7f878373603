// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures of the relay. Every response is wrapped
//! in the `{success, data}` envelope ([`ApiResponse`]); failures use the
//! `{success: false, error, errorCode}` body produced by
//! [`ApiError`](crate::error::ApiError).
//!
//! Field names are camelCase to match the signed message schemas.
//!
//! ## Model Categories
//!
//! - **Receipts**: outcome of an accepted write (transaction hash + events)
//! - **Dependents**: summaries, health, medical history, vaccinations
//! - **Signing context**: nonce and EIP-712 domain for clients

use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::gateway::{MetaTxGateway, OperationTag};
use crate::ledger::{
    DependentRecord, EventRecord, HealthRecord, MedicalHistoryEntry, Receipt, VaccinationStatus,
};

// =============================================================================
// Account Address Type
// =============================================================================

/// Account address as it arrives on the wire.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct AccountAddress(pub String);

impl AccountAddress {
    /// Parse into an [`Address`]; `field` names the input in the error.
    pub fn parse(&self, field: &str) -> Result<Address, ApiError> {
        Address::from_str(self.0.trim())
            .map_err(|_| ApiError::bad_request(format!("{field}: invalid address {}", self.0)))
    }
}

impl std::fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountAddress {
    fn from(value: &str) -> Self {
        AccountAddress(value.to_string())
    }
}

impl From<Address> for AccountAddress {
    fn from(value: Address) -> Self {
        AccountAddress(value.to_string())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body of `GET /contract/test`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestData {
    pub value: String,
}

// =============================================================================
// Receipts
// =============================================================================

/// Outcome of an accepted meta-transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub transaction_hash: String,
    /// Position of the step in ledger order.
    pub sequence: u64,
    /// The signer the step was executed for.
    pub signer: AccountAddress,
    /// Dependent touched by the step (the new id for creations).
    pub child_address: AccountAddress,
    /// Emitted events as `{event, args}` objects.
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<Value>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash.to_string(),
            sequence: receipt.sequence,
            signer: receipt.caller.into(),
            child_address: receipt.dependent.into(),
            events: receipt.events.iter().map(|event| event.to_json()).collect(),
        }
    }
}

/// A logged event for one dependent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub sequence: u64,
    pub transaction_hash: String,
    #[schema(value_type = Object)]
    pub event: Value,
}

impl From<&EventRecord> for EventResponse {
    fn from(record: &EventRecord) -> Self {
        Self {
            sequence: record.sequence,
            transaction_hash: record.transaction_hash.to_string(),
            event: record.event.to_json(),
        }
    }
}

// =============================================================================
// Signing Context
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    pub account: AccountAddress,
    /// Decimal string; sign over exactly this value.
    pub nonce: String,
}

/// EIP-712 domain and schemas clients must sign against.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainResponse {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: AccountAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// `encodeType` string per operation.
    pub types: Vec<SchemaType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    pub operation: OperationTag,
    pub encode_type: String,
}

impl From<&MetaTxGateway> for DomainResponse {
    fn from(gateway: &MetaTxGateway) -> Self {
        let config = gateway.config();
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            chain_id: config.chain_id,
            verifying_contract: config.verifying_contract.into(),
            network: config.network_name().map(str::to_string),
            types: OperationTag::ALL
                .into_iter()
                .map(|operation| SchemaType {
                    operation,
                    encode_type: operation.encode_type(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Dependent Models
// =============================================================================

/// A dependent as seen by one of its guardians.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DependentSummary {
    pub child_address: AccountAddress,
    pub name: String,
    /// Seconds since the Unix epoch.
    pub birth_date: u64,
    /// Whole months since birth at request time.
    pub age_months: u32,
    pub creator: AccountAddress,
    /// Guardians in link order.
    pub guardians: Vec<AccountAddress>,
}

impl DependentSummary {
    pub fn new(record: &DependentRecord, now: u64) -> Self {
        Self {
            child_address: record.id.into(),
            name: record.name.clone(),
            birth_date: record.birth_date,
            age_months: record.age_in_months(now),
            creator: record.creator.into(),
            guardians: record.guardians.iter().copied().map(Into::into).collect(),
        }
    }
}

/// Health record with raw scaled values and their decimal rendering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecordResponse {
    /// Height in tenths of a centimetre.
    pub height: u16,
    /// Weight in tenths of a kilogram.
    pub weight: u16,
    pub height_display: String,
    pub weight_display: String,
}

impl From<HealthRecord> for HealthRecordResponse {
    fn from(record: HealthRecord) -> Self {
        Self {
            height: record.height.scaled(),
            weight: record.weight.scaled(),
            height_display: record.height.to_string(),
            weight_display: record.weight.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryItem {
    pub index: usize,
    pub medical_type: u8,
    pub visited_name: String,
    pub timestamp: String,
    pub doctor_name: String,
    pub symptoms: String,
    pub diagnosis_details: String,
}

impl MedicalHistoryItem {
    pub fn new(index: usize, entry: &MedicalHistoryEntry) -> Self {
        Self {
            index,
            medical_type: entry.medical_type,
            visited_name: entry.visited_name.clone(),
            timestamp: entry.timestamp.clone(),
            doctor_name: entry.doctor_name.clone(),
            symptoms: entry.symptoms.clone(),
            diagnosis_details: entry.diagnosis_details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DoseResponse {
    pub chapter: u8,
    pub administered_date: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaccineResponse {
    pub vaccine_name: String,
    /// Highest chapter recorded.
    pub chapter: u8,
    pub administered_date: u64,
    pub doses: Vec<DoseResponse>,
}

pub fn vaccination_response(status: VaccinationStatus) -> Vec<VaccineResponse> {
    status
        .vaccines
        .into_iter()
        .map(|(vaccine_name, progress)| VaccineResponse {
            vaccine_name,
            chapter: progress.chapter,
            administered_date: progress.administered_date,
            doses: progress
                .doses
                .into_iter()
                .map(|(chapter, administered_date)| DoseResponse {
                    chapter,
                    administered_date,
                })
                .collect(),
        })
        .collect()
}
