// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account replay counters.
//!
//! Every account starts at nonce 0. A signed request is valid only for the
//! account's current value, and acceptance bumps the counter by exactly one,
//! so a signature can never be applied twice.

use std::collections::HashMap;

use alloy::primitives::U256;

use super::{Account, LedgerError, LedgerResult};

#[derive(Debug, Default, Clone)]
pub struct NonceLedger {
    counters: HashMap<Account, U256>,
}

impl NonceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_nonce(&self, account: Account) -> U256 {
        self.counters.get(&account).copied().unwrap_or(U256::ZERO)
    }

    /// Guard: `expected` must be the account's current counter.
    pub fn ensure_current(&self, account: Account, expected: U256) -> LedgerResult<()> {
        let current = self.current_nonce(account);
        if expected != current {
            return Err(LedgerError::NonceMismatch {
                account,
                expected: current,
                provided: expected,
            });
        }
        Ok(())
    }

    /// Commit: bump the counter by one.
    pub fn advance(&mut self, account: Account) {
        let counter = self.counters.entry(account).or_insert(U256::ZERO);
        *counter = counter.saturating_add(U256::from(1));
    }

    /// Check and bump in one call, for callers with no other state to commit.
    pub fn consume(&mut self, account: Account, expected: U256) -> LedgerResult<()> {
        self.ensure_current(account, expected)?;
        self.advance(account);
        Ok(())
    }
}
