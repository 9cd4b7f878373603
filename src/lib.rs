// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Guardian Ledger - Shared Dependent Records with a Meta-Transaction Relay
//!
//! Guardians keep shared records (health, medical history, vaccinations)
//! for the dependents they are linked to. Writes arrive as EIP-712 signed
//! messages that the relay verifies and applies on the signer's behalf.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `gateway` - EIP-712 domain, schemas, and signature recovery
//! - `ledger` - Nonces, guardianship, and per-dependent record stores
//! - `config` - Environment configuration

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod state;
