// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 domain separation and network presets.

use std::borrow::Cow;

use alloy::primitives::{Address, U256};
use alloy::sol_types::Eip712Domain;

/// Default EIP-712 domain name.
pub const DEFAULT_DOMAIN_NAME: &str = "ParentChildRelationshipWithMeta";

/// Default EIP-712 domain version.
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// EVM network identification.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
}

/// Ethereum Sepolia testnet.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Sepolia",
    chain_id: 11_155_111,
};

/// Local Hardhat node.
pub const HARDHAT: NetworkConfig = NetworkConfig {
    name: "Hardhat",
    chain_id: 31_337,
};

/// Ethereum mainnet.
pub const MAINNET: NetworkConfig = NetworkConfig {
    name: "Ethereum Mainnet",
    chain_id: 1,
};

/// Look up a preset by chain id.
pub fn network_for_chain(chain_id: u64) -> Option<NetworkConfig> {
    [SEPOLIA, HARDHAT, MAINNET]
        .into_iter()
        .find(|network| network.chain_id == chain_id)
}

/// The signing context every guardian signature is bound to.
///
/// Changing any field yields a different separator, so signatures produced
/// for one deployment are useless against another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    /// Identity of the gateway itself.
    pub verifying_contract: Address,
}

impl DomainConfig {
    /// Default name/version on `network`.
    pub fn for_network(network: &NetworkConfig, verifying_contract: Address) -> Self {
        Self {
            name: DEFAULT_DOMAIN_NAME.to_string(),
            version: DEFAULT_DOMAIN_VERSION.to_string(),
            chain_id: network.chain_id,
            verifying_contract,
        }
    }

    pub fn sepolia(verifying_contract: Address) -> Self {
        Self::for_network(&SEPOLIA, verifying_contract)
    }

    pub fn hardhat(verifying_contract: Address) -> Self {
        Self::for_network(&HARDHAT, verifying_contract)
    }

    /// Display name of the configured network, if it is a known preset.
    pub fn network_name(&self) -> Option<&'static str> {
        network_for_chain(self.chain_id).map(|network| network.name)
    }

    pub fn to_eip712_domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_changes_the_separator() {
        let base = DomainConfig::sepolia(Address::repeat_byte(0x42));
        let separator = base.to_eip712_domain().separator();

        let variants = [
            DomainConfig {
                name: "Other".into(),
                ..base.clone()
            },
            DomainConfig {
                version: "2".into(),
                ..base.clone()
            },
            DomainConfig {
                chain_id: HARDHAT.chain_id,
                ..base.clone()
            },
            DomainConfig {
                verifying_contract: Address::repeat_byte(0x43),
                ..base.clone()
            },
        ];
        for variant in variants {
            assert_ne!(variant.to_eip712_domain().separator(), separator);
        }
    }

    #[test]
    fn presets_resolve_by_chain_id() {
        assert_eq!(network_for_chain(11_155_111).map(|n| n.name), Some("Sepolia"));
        assert_eq!(
            DomainConfig::hardhat(Address::ZERO).network_name(),
            Some("Hardhat")
        );
        assert!(network_for_chain(43_114).is_none());
    }
}
