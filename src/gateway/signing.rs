// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature recovery and key loading.
//!
//! The gateway only ever *recovers* signers. The signing helpers exist for
//! the relay's own key (which identifies the gateway) and for clients and
//! tests that need to produce guardian signatures.

use std::str::FromStr;

use alloy::{
    hex,
    primitives::{Address, Signature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use k256::SecretKey;

use crate::ledger::LedgerError;

/// Key loading and signing errors.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Parse a signature given as hex (with or without `0x`): either 65-byte
/// `r ‖ s ‖ v` or 64-byte EIP-2098 compact `r ‖ yParityAndS`.
pub fn parse_signature(signature: &str) -> Result<Signature, String> {
    let bytes = hex::decode(signature.trim()).map_err(|e| format!("invalid hex: {e}"))?;
    match bytes.len() {
        65 => Signature::from_raw(&bytes).map_err(|e| e.to_string()),
        64 => Ok(Signature::from_erc2098(&bytes)),
        len => Err(format!("expected 65 or 64 bytes, got {len}")),
    }
}

/// Recover the signer of `signing_hash` and require it to be `claimed`.
pub fn recover_signer(
    signing_hash: B256,
    signature: &str,
    claimed: Address,
) -> Result<Address, LedgerError> {
    let mismatch = |reason: String| LedgerError::SignerMismatch { claimed, reason };

    let signature = parse_signature(signature).map_err(&mismatch)?;
    let recovered = signature
        .recover_address_from_prehash(&signing_hash)
        .map_err(|e| mismatch(format!("unrecoverable signature: {e}")))?;

    if recovered != claimed {
        return Err(mismatch(format!("signature recovers to {recovered}")));
    }
    Ok(recovered)
}

/// Sign an EIP-712 signing hash; returns the `0x`-prefixed 65-byte signature.
pub fn sign_hash(signer: &PrivateKeySigner, signing_hash: B256) -> Result<String, SigningError> {
    let signature = signer
        .sign_hash_sync(&signing_hash)
        .map_err(|e| SigningError::SigningFailed(e.to_string()))?;
    Ok(hex::encode_prefixed(signature.as_bytes()))
}

/// Create a signer from a hex private key (with or without `0x`).
pub fn signer_from_hex(private_key: &str) -> Result<PrivateKeySigner, SigningError> {
    PrivateKeySigner::from_str(private_key.trim())
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
}

/// Create a signer from a PEM private key (SEC1 `EC PRIVATE KEY` or PKCS#8).
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SigningError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    PrivateKeySigner::from_slice(&secret_key.to_bytes())
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}
