// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The six signed message schemas and their JSON wire form.
//!
//! Field order inside each `sol!` struct is part of the type hash. Reordering,
//! renaming or retyping a field invalidates every signature produced against
//! the deployed schema.

use std::str::FromStr;

use alloy::{
    primitives::{Address, B256, U256},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::ledger::{
    HealthRecord, LedgerError, LedgerResult, MedicalHistoryEntry, Mutation, VaccinationUpdate,
};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct CreateChild {
        address parent;
        string name;
        uint256 birthDate;
        uint16 height;
        uint16 weight;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ConnectChild {
        address parent;
        address childAddress;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct SetHealthInfo {
        address parent;
        address childAddress;
        uint16 height;
        uint16 weight;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct AddMedicalHistory {
        address parent;
        address childAddress;
        uint8 medicalType;
        string visitedName;
        string timestamp;
        string doctorName;
        string symptoms;
        string diagnosisDetails;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct UpdateVaccination {
        address parent;
        address childAddress;
        string vaccineName;
        uint8 vaccineChapter;
        uint256 administeredDate;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct VaccinationRecord {
        string vaccineName;
        uint8 vaccineChapter;
        uint256 administerDate;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct UpdateMultipleVaccination {
        address parent;
        address childAddress;
        VaccinationRecord[] vaccinations;
        uint256 nonce;
    }
}

/// Operation tag naming one of the six schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OperationTag {
    #[serde(alias = "CreateDependent")]
    CreateChild,
    #[serde(alias = "ConnectDependent")]
    ConnectChild,
    SetHealthInfo,
    AddMedicalHistory,
    UpdateVaccination,
    #[serde(alias = "UpdateVaccinationBatch")]
    UpdateMultipleVaccination,
}

impl OperationTag {
    pub const ALL: [OperationTag; 6] = [
        OperationTag::CreateChild,
        OperationTag::ConnectChild,
        OperationTag::SetHealthInfo,
        OperationTag::AddMedicalHistory,
        OperationTag::UpdateVaccination,
        OperationTag::UpdateMultipleVaccination,
    ];

    /// The EIP-712 primary type name.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationTag::CreateChild => "CreateChild",
            OperationTag::ConnectChild => "ConnectChild",
            OperationTag::SetHealthInfo => "SetHealthInfo",
            OperationTag::AddMedicalHistory => "AddMedicalHistory",
            OperationTag::UpdateVaccination => "UpdateVaccination",
            OperationTag::UpdateMultipleVaccination => "UpdateMultipleVaccination",
        }
    }

    /// Canonical `encodeType` string for this schema.
    pub fn encode_type(self) -> String {
        match self {
            OperationTag::CreateChild => CreateChild::eip712_encode_type().into_owned(),
            OperationTag::ConnectChild => ConnectChild::eip712_encode_type().into_owned(),
            OperationTag::SetHealthInfo => SetHealthInfo::eip712_encode_type().into_owned(),
            OperationTag::AddMedicalHistory => {
                AddMedicalHistory::eip712_encode_type().into_owned()
            }
            OperationTag::UpdateVaccination => {
                UpdateVaccination::eip712_encode_type().into_owned()
            }
            OperationTag::UpdateMultipleVaccination => {
                UpdateMultipleVaccination::eip712_encode_type().into_owned()
            }
        }
    }
}

impl std::fmt::Display for OperationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generic relay submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransactionRequest {
    /// Which schema `payload` follows.
    pub operation: OperationTag,
    /// Message fields as JSON. `nonce` may be omitted.
    #[schema(value_type = Object)]
    pub payload: Value,
    /// 65-byte `r ‖ s ‖ v` signature, hex.
    pub signature: String,
}

impl MetaTransactionRequest {
    /// Split a flat body (`{...fields, "signature": "0x.."}`) into a request.
    pub fn from_flat(operation: OperationTag, body: Value) -> LedgerResult<Self> {
        let Value::Object(mut fields) = body else {
            return Err(LedgerError::SchemaMismatch(
                "request body must be a JSON object".to_string(),
            ));
        };
        let signature = match fields.remove("signature") {
            Some(Value::String(signature)) => signature,
            _ => {
                return Err(LedgerError::SchemaMismatch(
                    "missing field `signature`".to_string(),
                ))
            }
        };
        Ok(Self {
            operation,
            payload: Value::Object(fields),
            signature,
        })
    }
}

/// Unsigned integers arrive as JSON numbers or decimal/hex strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireUint {
    Number(u64),
    Text(String),
}

impl WireUint {
    fn to_u256(&self, field: &str) -> LedgerResult<U256> {
        match self {
            WireUint::Number(n) => Ok(U256::from(*n)),
            WireUint::Text(text) => U256::from_str(text.trim())
                .map_err(|_| LedgerError::SchemaMismatch(format!("{field}: not an unsigned integer"))),
        }
    }

    /// Seconds since epoch, or an 8-digit `YYYYMMDD` string at UTC midnight.
    fn to_timestamp(&self, field: &str) -> LedgerResult<U256> {
        match self {
            WireUint::Text(text)
                if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) =>
            {
                yyyymmdd_to_unix(text).map(U256::from).ok_or_else(|| {
                    LedgerError::SchemaMismatch(format!("{field}: invalid date {text}"))
                })
            }
            other => other.to_u256(field),
        }
    }
}

/// `"20241101"` -> seconds at 2024-11-01T00:00:00Z.
pub fn yyyymmdd_to_unix(date: &str) -> Option<u64> {
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let seconds = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
    u64::try_from(seconds).ok()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateChildFields {
    parent: String,
    #[serde(alias = "childName")]
    name: String,
    birth_date: WireUint,
    height: WireUint,
    weight: WireUint,
    nonce: Option<WireUint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectChildFields {
    parent: String,
    child_address: String,
    nonce: Option<WireUint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetHealthInfoFields {
    parent: String,
    child_address: String,
    height: WireUint,
    weight: WireUint,
    nonce: Option<WireUint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMedicalHistoryFields {
    parent: String,
    child_address: String,
    medical_type: WireUint,
    visited_name: String,
    timestamp: String,
    doctor_name: String,
    symptoms: String,
    diagnosis_details: String,
    nonce: Option<WireUint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateVaccinationFields {
    parent: String,
    child_address: String,
    vaccine_name: String,
    vaccine_chapter: WireUint,
    administered_date: WireUint,
    nonce: Option<WireUint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaccinationRecordFields {
    vaccine_name: String,
    vaccine_chapter: WireUint,
    #[serde(alias = "administeredDate")]
    administer_date: WireUint,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMultipleVaccinationFields {
    parent: String,
    child_address: String,
    vaccinations: Vec<VaccinationRecordFields>,
    nonce: Option<WireUint>,
}

/// A decoded message in one of the six schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaOperation {
    CreateChild(CreateChild),
    ConnectChild(ConnectChild),
    SetHealthInfo(SetHealthInfo),
    AddMedicalHistory(AddMedicalHistory),
    UpdateVaccination(UpdateVaccination),
    UpdateMultipleVaccination(UpdateMultipleVaccination),
}

impl MetaOperation {
    /// Parse `payload` against the schema named by `tag`.
    ///
    /// A missing `nonce` is filled from `current_nonce(parent)`.
    pub fn decode(
        tag: OperationTag,
        payload: Value,
        current_nonce: impl FnOnce(Address) -> U256,
    ) -> LedgerResult<Self> {
        let operation = match tag {
            OperationTag::CreateChild => {
                let f: CreateChildFields = fields(tag, payload)?;
                let parent = parse_address("parent", &f.parent)?;
                MetaOperation::CreateChild(CreateChild {
                    parent,
                    name: f.name,
                    birthDate: f.birth_date.to_timestamp("birthDate")?,
                    height: narrow(&f.height, "height")?,
                    weight: narrow(&f.weight, "weight")?,
                    nonce: fill_nonce(f.nonce, parent, current_nonce)?,
                })
            }
            OperationTag::ConnectChild => {
                let f: ConnectChildFields = fields(tag, payload)?;
                let parent = parse_address("parent", &f.parent)?;
                MetaOperation::ConnectChild(ConnectChild {
                    parent,
                    childAddress: parse_address("childAddress", &f.child_address)?,
                    nonce: fill_nonce(f.nonce, parent, current_nonce)?,
                })
            }
            OperationTag::SetHealthInfo => {
                let f: SetHealthInfoFields = fields(tag, payload)?;
                let parent = parse_address("parent", &f.parent)?;
                MetaOperation::SetHealthInfo(SetHealthInfo {
                    parent,
                    childAddress: parse_address("childAddress", &f.child_address)?,
                    height: narrow(&f.height, "height")?,
                    weight: narrow(&f.weight, "weight")?,
                    nonce: fill_nonce(f.nonce, parent, current_nonce)?,
                })
            }
            OperationTag::AddMedicalHistory => {
                let f: AddMedicalHistoryFields = fields(tag, payload)?;
                let parent = parse_address("parent", &f.parent)?;
                MetaOperation::AddMedicalHistory(AddMedicalHistory {
                    parent,
                    childAddress: parse_address("childAddress", &f.child_address)?,
                    medicalType: narrow(&f.medical_type, "medicalType")?,
                    visitedName: f.visited_name,
                    timestamp: f.timestamp,
                    doctorName: f.doctor_name,
                    symptoms: f.symptoms,
                    diagnosisDetails: f.diagnosis_details,
                    nonce: fill_nonce(f.nonce, parent, current_nonce)?,
                })
            }
            OperationTag::UpdateVaccination => {
                let f: UpdateVaccinationFields = fields(tag, payload)?;
                let parent = parse_address("parent", &f.parent)?;
                MetaOperation::UpdateVaccination(UpdateVaccination {
                    parent,
                    childAddress: parse_address("childAddress", &f.child_address)?,
                    vaccineName: f.vaccine_name,
                    vaccineChapter: narrow(&f.vaccine_chapter, "vaccineChapter")?,
                    administeredDate: f.administered_date.to_timestamp("administeredDate")?,
                    nonce: fill_nonce(f.nonce, parent, current_nonce)?,
                })
            }
            OperationTag::UpdateMultipleVaccination => {
                let f: UpdateMultipleVaccinationFields = fields(tag, payload)?;
                let parent = parse_address("parent", &f.parent)?;
                let vaccinations = f
                    .vaccinations
                    .iter()
                    .map(|entry| {
                        Ok(VaccinationRecord {
                            vaccineName: entry.vaccine_name.clone(),
                            vaccineChapter: narrow(&entry.vaccine_chapter, "vaccineChapter")?,
                            administerDate: entry.administer_date.to_timestamp("administerDate")?,
                        })
                    })
                    .collect::<LedgerResult<Vec<_>>>()?;
                MetaOperation::UpdateMultipleVaccination(UpdateMultipleVaccination {
                    parent,
                    childAddress: parse_address("childAddress", &f.child_address)?,
                    vaccinations,
                    nonce: fill_nonce(f.nonce, parent, current_nonce)?,
                })
            }
        };
        Ok(operation)
    }

    pub fn tag(&self) -> OperationTag {
        match self {
            MetaOperation::CreateChild(_) => OperationTag::CreateChild,
            MetaOperation::ConnectChild(_) => OperationTag::ConnectChild,
            MetaOperation::SetHealthInfo(_) => OperationTag::SetHealthInfo,
            MetaOperation::AddMedicalHistory(_) => OperationTag::AddMedicalHistory,
            MetaOperation::UpdateVaccination(_) => OperationTag::UpdateVaccination,
            MetaOperation::UpdateMultipleVaccination(_) => OperationTag::UpdateMultipleVaccination,
        }
    }

    /// The `parent` field: the account the signature must recover to.
    pub fn actor(&self) -> Address {
        match self {
            MetaOperation::CreateChild(m) => m.parent,
            MetaOperation::ConnectChild(m) => m.parent,
            MetaOperation::SetHealthInfo(m) => m.parent,
            MetaOperation::AddMedicalHistory(m) => m.parent,
            MetaOperation::UpdateVaccination(m) => m.parent,
            MetaOperation::UpdateMultipleVaccination(m) => m.parent,
        }
    }

    pub fn nonce(&self) -> U256 {
        match self {
            MetaOperation::CreateChild(m) => m.nonce,
            MetaOperation::ConnectChild(m) => m.nonce,
            MetaOperation::SetHealthInfo(m) => m.nonce,
            MetaOperation::AddMedicalHistory(m) => m.nonce,
            MetaOperation::UpdateVaccination(m) => m.nonce,
            MetaOperation::UpdateMultipleVaccination(m) => m.nonce,
        }
    }

    /// `keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(message))`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        match self {
            MetaOperation::CreateChild(m) => m.eip712_signing_hash(domain),
            MetaOperation::ConnectChild(m) => m.eip712_signing_hash(domain),
            MetaOperation::SetHealthInfo(m) => m.eip712_signing_hash(domain),
            MetaOperation::AddMedicalHistory(m) => m.eip712_signing_hash(domain),
            MetaOperation::UpdateVaccination(m) => m.eip712_signing_hash(domain),
            MetaOperation::UpdateMultipleVaccination(m) => m.eip712_signing_hash(domain),
        }
    }

    /// The ledger mutation this message authorizes.
    pub fn to_mutation(&self) -> LedgerResult<Mutation> {
        let mutation = match self {
            MetaOperation::CreateChild(m) => Mutation::CreateDependent {
                name: m.name.clone(),
                birth_date: to_u64(m.birthDate, "birthDate")?,
                health: HealthRecord::new(m.height, m.weight),
            },
            MetaOperation::ConnectChild(m) => Mutation::LinkGuardian {
                dependent: m.childAddress,
            },
            MetaOperation::SetHealthInfo(m) => Mutation::SetHealth {
                dependent: m.childAddress,
                record: HealthRecord::new(m.height, m.weight),
            },
            MetaOperation::AddMedicalHistory(m) => Mutation::AddMedicalHistory {
                dependent: m.childAddress,
                entry: MedicalHistoryEntry {
                    medical_type: m.medicalType,
                    visited_name: m.visitedName.clone(),
                    timestamp: m.timestamp.clone(),
                    doctor_name: m.doctorName.clone(),
                    symptoms: m.symptoms.clone(),
                    diagnosis_details: m.diagnosisDetails.clone(),
                },
            },
            MetaOperation::UpdateVaccination(m) => Mutation::UpdateVaccination {
                dependent: m.childAddress,
                update: VaccinationUpdate::new(
                    m.vaccineName.clone(),
                    m.vaccineChapter,
                    to_u64(m.administeredDate, "administeredDate")?,
                ),
            },
            MetaOperation::UpdateMultipleVaccination(m) => Mutation::UpdateVaccinationBatch {
                dependent: m.childAddress,
                updates: m
                    .vaccinations
                    .iter()
                    .map(|entry| {
                        Ok(VaccinationUpdate::new(
                            entry.vaccineName.clone(),
                            entry.vaccineChapter,
                            to_u64(entry.administerDate, "administerDate")?,
                        ))
                    })
                    .collect::<LedgerResult<_>>()?,
            },
        };
        Ok(mutation)
    }

    /// JSON payload in wire form. Large integers are rendered as strings.
    pub fn to_payload(&self) -> Value {
        match self {
            MetaOperation::CreateChild(m) => json!({
                "parent": m.parent.to_string(),
                "name": m.name,
                "birthDate": m.birthDate.to_string(),
                "height": m.height,
                "weight": m.weight,
                "nonce": m.nonce.to_string(),
            }),
            MetaOperation::ConnectChild(m) => json!({
                "parent": m.parent.to_string(),
                "childAddress": m.childAddress.to_string(),
                "nonce": m.nonce.to_string(),
            }),
            MetaOperation::SetHealthInfo(m) => json!({
                "parent": m.parent.to_string(),
                "childAddress": m.childAddress.to_string(),
                "height": m.height,
                "weight": m.weight,
                "nonce": m.nonce.to_string(),
            }),
            MetaOperation::AddMedicalHistory(m) => json!({
                "parent": m.parent.to_string(),
                "childAddress": m.childAddress.to_string(),
                "medicalType": m.medicalType,
                "visitedName": m.visitedName,
                "timestamp": m.timestamp,
                "doctorName": m.doctorName,
                "symptoms": m.symptoms,
                "diagnosisDetails": m.diagnosisDetails,
                "nonce": m.nonce.to_string(),
            }),
            MetaOperation::UpdateVaccination(m) => json!({
                "parent": m.parent.to_string(),
                "childAddress": m.childAddress.to_string(),
                "vaccineName": m.vaccineName,
                "vaccineChapter": m.vaccineChapter,
                "administeredDate": m.administeredDate.to_string(),
                "nonce": m.nonce.to_string(),
            }),
            MetaOperation::UpdateMultipleVaccination(m) => json!({
                "parent": m.parent.to_string(),
                "childAddress": m.childAddress.to_string(),
                "vaccinations": m.vaccinations.iter().map(|entry| json!({
                    "vaccineName": entry.vaccineName,
                    "vaccineChapter": entry.vaccineChapter,
                    "administerDate": entry.administerDate.to_string(),
                })).collect::<Vec<_>>(),
                "nonce": m.nonce.to_string(),
            }),
        }
    }
}

fn fields<T: serde::de::DeserializeOwned>(tag: OperationTag, payload: Value) -> LedgerResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| LedgerError::SchemaMismatch(format!("{tag}: {e}")))
}

fn parse_address(field: &str, value: &str) -> LedgerResult<Address> {
    Address::from_str(value.trim())
        .map_err(|_| LedgerError::SchemaMismatch(format!("{field}: invalid address {value}")))
}

/// Narrow a wire integer to its schema width (`uint8`, `uint16`).
fn narrow<T: TryFrom<U256>>(value: &WireUint, field: &str) -> LedgerResult<T> {
    let wide = value.to_u256(field)?;
    T::try_from(wide)
        .map_err(|_| LedgerError::SchemaMismatch(format!("{field}: {wide} is out of range")))
}

fn to_u64(value: U256, field: &str) -> LedgerResult<u64> {
    u64::try_from(value)
        .map_err(|_| LedgerError::SchemaMismatch(format!("{field}: {value} is out of range")))
}

fn fill_nonce(
    nonce: Option<WireUint>,
    parent: Address,
    current_nonce: impl FnOnce(Address) -> U256,
) -> LedgerResult<U256> {
    match nonce {
        Some(nonce) => nonce.to_u256("nonce"),
        None => Ok(current_nonce(parent)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENT: &str = "0x1111111111111111111111111111111111111111";
    const CHILD: &str = "0x2222222222222222222222222222222222222222";

    fn no_nonce(_: Address) -> U256 {
        panic!("nonce should not be looked up")
    }

    #[test]
    fn encode_types_follow_field_order() {
        assert_eq!(
            OperationTag::CreateChild.encode_type(),
            "CreateChild(address parent,string name,uint256 birthDate,uint16 height,uint16 weight,uint256 nonce)"
        );
        assert_eq!(
            OperationTag::ConnectChild.encode_type(),
            "ConnectChild(address parent,address childAddress,uint256 nonce)"
        );
        assert_eq!(
            OperationTag::SetHealthInfo.encode_type(),
            "SetHealthInfo(address parent,address childAddress,uint16 height,uint16 weight,uint256 nonce)"
        );
        assert_eq!(
            OperationTag::AddMedicalHistory.encode_type(),
            "AddMedicalHistory(address parent,address childAddress,uint8 medicalType,string visitedName,string timestamp,string doctorName,string symptoms,string diagnosisDetails,uint256 nonce)"
        );
        assert_eq!(
            OperationTag::UpdateVaccination.encode_type(),
            "UpdateVaccination(address parent,address childAddress,string vaccineName,uint8 vaccineChapter,uint256 administeredDate,uint256 nonce)"
        );
        assert_eq!(
            OperationTag::UpdateMultipleVaccination.encode_type(),
            "UpdateMultipleVaccination(address parent,address childAddress,VaccinationRecord[] vaccinations,uint256 nonce)VaccinationRecord(string vaccineName,uint8 vaccineChapter,uint256 administerDate)"
        );
    }

    #[test]
    fn tags_accept_descriptive_aliases() {
        let tag: OperationTag = serde_json::from_value(json!("CreateDependent")).unwrap();
        assert_eq!(tag, OperationTag::CreateChild);
        let tag: OperationTag = serde_json::from_value(json!("UpdateVaccinationBatch")).unwrap();
        assert_eq!(tag, OperationTag::UpdateMultipleVaccination);
        assert!(serde_json::from_value::<OperationTag>(json!("DeleteChild")).is_err());
    }

    #[test]
    fn create_child_accepts_relay_shapes() {
        let payload = json!({
            "parent": PARENT,
            "childName": "고현림",
            "birthDate": "20241101",
            "height": 1201,
            "weight": "503",
        });

        let op = MetaOperation::decode(OperationTag::CreateChild, payload, |_| U256::from(4))
            .unwrap();
        let MetaOperation::CreateChild(message) = &op else {
            panic!("wrong variant: {op:?}");
        };
        assert_eq!(message.name, "고현림");
        assert_eq!(message.birthDate, U256::from(1_730_419_200u64));
        assert_eq!(message.height, 1201);
        assert_eq!(message.weight, 503);
        assert_eq!(message.nonce, U256::from(4));
    }

    #[test]
    fn supplied_nonce_is_used_verbatim() {
        let payload = json!({ "parent": PARENT, "childAddress": CHILD, "nonce": "7" });
        let op = MetaOperation::decode(OperationTag::ConnectChild, payload, no_nonce).unwrap();
        assert_eq!(op.nonce(), U256::from(7));
        assert_eq!(op.actor(), Address::from_str(PARENT).unwrap());
    }

    #[test]
    fn out_of_range_values_are_schema_mismatch() {
        let payload = json!({
            "parent": PARENT, "childAddress": CHILD,
            "height": 70000, "weight": 10, "nonce": 0,
        });
        let err = MetaOperation::decode(OperationTag::SetHealthInfo, payload, no_nonce).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MISMATCH");

        let payload = json!({
            "parent": PARENT, "childAddress": CHILD, "vaccineName": "DTap",
            "vaccineChapter": 256, "administeredDate": 0, "nonce": 0,
        });
        let err =
            MetaOperation::decode(OperationTag::UpdateVaccination, payload, no_nonce).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn malformed_payloads_are_schema_mismatch() {
        let cases = [
            (OperationTag::ConnectChild, json!({ "parent": PARENT })),
            (OperationTag::ConnectChild, json!({ "parent": "0x12", "childAddress": CHILD })),
            (OperationTag::SetHealthInfo, json!({
                "parent": PARENT, "childAddress": CHILD, "height": 120.1, "weight": 1,
            })),
            (OperationTag::CreateChild, json!({
                "parent": PARENT, "name": "Kim", "birthDate": "20241399",
                "height": 1, "weight": 1,
            })),
            (OperationTag::UpdateMultipleVaccination, json!("not an object")),
        ];
        for (tag, payload) in cases {
            let err = MetaOperation::decode(tag, payload.clone(), |_| U256::ZERO).unwrap_err();
            assert!(matches!(err, LedgerError::SchemaMismatch(_)), "{tag}: {payload}");
        }
    }

    #[test]
    fn batch_items_decode_in_order() {
        let payload = json!({
            "parent": PARENT,
            "childAddress": CHILD,
            "vaccinations": [
                { "vaccineName": "DTap", "vaccineChapter": 1, "administerDate": "20241010" },
                { "vaccineName": "IPV", "vaccineChapter": 2, "administeredDate": 1_728_518_400u64 },
            ],
            "nonce": 0,
        });

        let op = MetaOperation::decode(OperationTag::UpdateMultipleVaccination, payload, no_nonce)
            .unwrap();
        let Mutation::UpdateVaccinationBatch { updates, .. } = op.to_mutation().unwrap() else {
            panic!("wrong mutation");
        };
        assert_eq!(
            updates,
            vec![
                VaccinationUpdate::new("DTap", 1, 1_728_518_400),
                VaccinationUpdate::new("IPV", 2, 1_728_518_400),
            ]
        );
    }

    #[test]
    fn payload_round_trips_through_decode() {
        let op = MetaOperation::AddMedicalHistory(AddMedicalHistory {
            parent: Address::from_str(PARENT).unwrap(),
            childAddress: Address::from_str(CHILD).unwrap(),
            medicalType: 2,
            visitedName: "Seoul Children's Clinic".into(),
            timestamp: "2024-12-01T09:30:00Z".into(),
            doctorName: "Dr. Park".into(),
            symptoms: "fever".into(),
            diagnosisDetails: "common cold".into(),
            nonce: U256::from(3),
        });

        let decoded =
            MetaOperation::decode(OperationTag::AddMedicalHistory, op.to_payload(), no_nonce)
                .unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn flat_body_splits_off_signature() {
        let request = MetaTransactionRequest::from_flat(
            OperationTag::ConnectChild,
            json!({ "parent": PARENT, "childAddress": CHILD, "signature": "0xabc" }),
        )
        .unwrap();
        assert_eq!(request.signature, "0xabc");
        assert!(request.payload.get("signature").is_none());

        let err = MetaTransactionRequest::from_flat(
            OperationTag::ConnectChild,
            json!({ "parent": PARENT, "childAddress": CHILD }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn date_helper_uses_utc_midnight() {
        assert_eq!(yyyymmdd_to_unix("20241101"), Some(1_730_419_200));
        assert_eq!(yyyymmdd_to_unix("19700101"), Some(0));
        assert_eq!(yyyymmdd_to_unix("20240230"), None);
    }
}
