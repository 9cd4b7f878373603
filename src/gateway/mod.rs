// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Meta-Transaction Gateway
//!
//! Turns a guardian's off-band EIP-712 signature into a ledger step:
//!
//! 1. **Decode** the payload against the schema named by the operation tag.
//! 2. **Domain-bind**: hash `(domain, schema, payload)` into the signing hash.
//! 3. **Recover** the signer; it must equal the payload's `parent`.
//! 4. **Nonce**: the payload nonce must be the signer's current nonce.
//! 5. **Dispatch** to the target store with `requester = signer`.
//!
//! Steps 4 and 5 run inside [`Ledger::apply_meta`], so the nonce is consumed
//! if and only if the store mutation is applied.

pub mod domain;
pub mod schema;
pub mod signing;

use alloy::{
    primitives::{keccak256, Address, B256},
    signers::local::PrivateKeySigner,
    sol_types::Eip712Domain,
};

use crate::ledger::{Ledger, LedgerResult, Receipt};

pub use domain::{DomainConfig, NetworkConfig, HARDHAT, MAINNET, SEPOLIA};
pub use schema::{MetaOperation, MetaTransactionRequest, OperationTag};
pub use signing::SigningError;

/// Validates signed requests and applies them to a [`Ledger`].
#[derive(Debug, Clone)]
pub struct MetaTxGateway {
    config: DomainConfig,
    domain: Eip712Domain,
}

impl MetaTxGateway {
    pub fn new(config: DomainConfig) -> Self {
        let domain = config.to_eip712_domain();
        Self { config, domain }
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// The gateway's own identity (`verifyingContract`).
    pub fn address(&self) -> Address {
        self.config.verifying_contract
    }

    pub fn signing_hash(&self, operation: &MetaOperation) -> B256 {
        operation.signing_hash(&self.domain)
    }

    /// Sign `operation` for this gateway's domain.
    pub fn sign(
        &self,
        signer: &PrivateKeySigner,
        operation: &MetaOperation,
    ) -> Result<String, SigningError> {
        signing::sign_hash(signer, self.signing_hash(operation))
    }

    /// Decode and execute a relay submission.
    pub fn execute(
        &self,
        ledger: &mut Ledger,
        request: MetaTransactionRequest,
    ) -> LedgerResult<Receipt> {
        let tag = request.operation;
        let operation = MetaOperation::decode(tag, request.payload, |account| {
            ledger.nonce_of(account)
        })
        .inspect_err(|err| {
            tracing::warn!(
                operation = %tag,
                code = err.code(),
                error = %err,
                "meta-transaction rejected"
            );
        })?;
        self.execute_operation(ledger, &operation, &request.signature)
    }

    /// Execute an already-decoded message.
    pub fn execute_operation(
        &self,
        ledger: &mut Ledger,
        operation: &MetaOperation,
        signature: &str,
    ) -> LedgerResult<Receipt> {
        let tag = operation.tag();
        let claimed = operation.actor();
        let nonce = operation.nonce();

        match self.run(ledger, operation, signature) {
            Ok(receipt) => {
                tracing::info!(
                    operation = %tag,
                    signer = %claimed,
                    nonce = %nonce,
                    dependent = %receipt.dependent,
                    tx_hash = %receipt.transaction_hash,
                    "meta-transaction accepted"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(
                    operation = %tag,
                    claimed = %claimed,
                    nonce = %nonce,
                    code = err.code(),
                    error = %err,
                    "meta-transaction rejected"
                );
                Err(err)
            }
        }
    }

    fn run(
        &self,
        ledger: &mut Ledger,
        operation: &MetaOperation,
        signature: &str,
    ) -> LedgerResult<Receipt> {
        let mutation = operation.to_mutation()?;
        let signing_hash = self.signing_hash(operation);
        let signer = signing::recover_signer(signing_hash, signature, operation.actor())?;
        tracing::debug!(signer = %signer, mutation = mutation.name(), "signature verified");

        let mut preimage = Vec::with_capacity(32 + 20);
        preimage.extend_from_slice(signing_hash.as_slice());
        preimage.extend_from_slice(signer.as_slice());
        let transaction_hash = keccak256(&preimage);

        ledger.apply_meta(signer, operation.nonce(), mutation, transaction_hash)
    }
}
