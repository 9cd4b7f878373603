// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`RelayConfig`] loaded from
//! them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `HTTP_PORT` | Plain HTTP port | `8080` |
//! | `HTTPS_PORT` | HTTPS port (only with TLS configured) | `8081` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | unset (HTTP only) |
//! | `DOMAIN_NAME` | Public host name, for logs | unset |
//! | `CORS_ORIGIN` | Allowed browser origin | `http://localhost:3000` |
//! | `EIP712_NAME` | Signing domain name | `ParentChildRelationshipWithMeta` |
//! | `EIP712_VERSION` | Signing domain version | `1` |
//! | `CHAIN_ID` | Signing domain chain id | `11155111` (Sepolia) |
//! | `VERIFYING_CONTRACT` | Gateway identity | derived from the relayer account |
//! | `RELAYER_PRIVATE_KEY` | Relayer key, hex | Required unless `RELAYER_KEY_PEM` is set |
//! | `RELAYER_KEY_PEM` | Path to relayer key, PEM (SEC1 or PKCS#8) | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::gateway::domain::{DEFAULT_DOMAIN_NAME, DEFAULT_DOMAIN_VERSION, SEPOLIA};
use crate::gateway::{signing, DomainConfig};

pub const HOST_ENV: &str = "HOST";
pub const HTTP_PORT_ENV: &str = "HTTP_PORT";
pub const HTTPS_PORT_ENV: &str = "HTTPS_PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const DOMAIN_NAME_ENV: &str = "DOMAIN_NAME";
pub const CORS_ORIGIN_ENV: &str = "CORS_ORIGIN";
pub const EIP712_NAME_ENV: &str = "EIP712_NAME";
pub const EIP712_VERSION_ENV: &str = "EIP712_VERSION";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const VERIFYING_CONTRACT_ENV: &str = "VERIFYING_CONTRACT";
pub const RELAYER_PRIVATE_KEY_ENV: &str = "RELAYER_PRIVATE_KEY";
pub const RELAYER_KEY_PEM_ENV: &str = "RELAYER_KEY_PEM";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_HTTPS_PORT: u16 = 8081;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{set} is set but {missing} is not")]
    Incomplete {
        set: &'static str,
        missing: &'static str,
    },

    #[error("Failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Where the relayer key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum RelayerKey {
    Hex(String),
    PemFile(PathBuf),
}

impl std::fmt::Debug for RelayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayerKey::Hex(_) => f.write_str("Hex(<redacted>)"),
            RelayerKey::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub http_port: u16,
    pub https_port: u16,
    pub tls: Option<TlsPaths>,
    pub domain_name: Option<String>,
    pub cors_origin: String,
    pub eip712_name: String,
    pub eip712_version: String,
    pub chain_id: u64,
    /// `None` derives the gateway identity from the relayer account.
    pub verifying_contract: Option<Address>,
    pub relayer_key: RelayerKey,
    pub log_format: LogFormat,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: TLS_CERT_PATH_ENV,
                    missing: TLS_KEY_PATH_ENV,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: TLS_KEY_PATH_ENV,
                    missing: TLS_CERT_PATH_ENV,
                })
            }
        };

        let cors_origin = get(CORS_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        url::Url::parse(&cors_origin).map_err(|e| ConfigError::Invalid {
            name: CORS_ORIGIN_ENV,
            reason: e.to_string(),
        })?;

        let relayer_key = match (get(RELAYER_PRIVATE_KEY_ENV), get(RELAYER_KEY_PEM_ENV)) {
            (Some(hex), _) => RelayerKey::Hex(hex),
            (None, Some(path)) => RelayerKey::PemFile(path.into()),
            (None, None) => return Err(ConfigError::Missing(RELAYER_PRIVATE_KEY_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        let config = Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            http_port: parse_or(get(HTTP_PORT_ENV), HTTP_PORT_ENV, DEFAULT_HTTP_PORT)?,
            https_port: parse_or(get(HTTPS_PORT_ENV), HTTPS_PORT_ENV, DEFAULT_HTTPS_PORT)?,
            tls,
            domain_name: get(DOMAIN_NAME_ENV),
            cors_origin,
            eip712_name: get(EIP712_NAME_ENV).unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string()),
            eip712_version: get(EIP712_VERSION_ENV)
                .unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()),
            chain_id: parse_or(get(CHAIN_ID_ENV), CHAIN_ID_ENV, SEPOLIA.chain_id)?,
            verifying_contract: get(VERIFYING_CONTRACT_ENV)
                .map(|value| parse_value(&value, VERIFYING_CONTRACT_ENV))
                .transpose()?,
            relayer_key,
            log_format,
        };
        config.http_addr()?;
        Ok(config)
    }

    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.socket_addr(self.http_port)
    }

    pub fn https_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.socket_addr(self.https_port)
    }

    fn socket_addr(&self, port: u16) -> Result<SocketAddr, ConfigError> {
        format!("{}:{port}", self.host)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            })
    }

    /// Load the relayer's signing key.
    pub fn relayer_signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        match &self.relayer_key {
            RelayerKey::Hex(hex) => signing::signer_from_hex(hex).map_err(|e| ConfigError::Invalid {
                name: RELAYER_PRIVATE_KEY_ENV,
                reason: e.to_string(),
            }),
            RelayerKey::PemFile(path) => {
                let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                signing::signer_from_pem(&bytes).map_err(|e| ConfigError::Invalid {
                    name: RELAYER_KEY_PEM_ENV,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Signing domain; without `VERIFYING_CONTRACT` the gateway identity is
    /// the first contract address of `relayer`.
    pub fn domain(&self, relayer: Address) -> DomainConfig {
        DomainConfig {
            name: self.eip712_name.clone(),
            version: self.eip712_version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self
                .verifying_contract
                .unwrap_or_else(|| relayer.create(0)),
        }
    }
}

fn parse_value<T>(value: &str, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |value| parse_value(&value, name))
}
