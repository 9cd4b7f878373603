// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::RwLock;

use crate::gateway::{DomainConfig, MetaTxGateway};
use crate::ledger::Ledger;

/// Shared relay state.
///
/// The ledger sits behind a single write lock: holding it for the whole
/// gateway step serializes submissions, so each step is applied atomically.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub gateway: Arc<MetaTxGateway>,
    /// The relay's own account.
    pub relayer: Address,
}

impl AppState {
    pub fn new(ledger: Ledger, gateway: MetaTxGateway, relayer: Address) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            gateway: Arc::new(gateway),
            relayer,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Ledger::new(),
            MetaTxGateway::new(DomainConfig::hardhat(Address::ZERO)),
            Address::ZERO,
        )
    }
}
