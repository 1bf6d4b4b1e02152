//! Credential and settings resolution for azmon.
//!
//! Credentials come only from the four `AZURE_*` environment variables and
//! are validated before anything touches the network. Everything else
//! (endpoints, display limit, lookback) is layered with figment: built-in
//! defaults, then an optional TOML file, then `AZMON_*` variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use azmon_api::{ClientSecretCredential, CloudEndpoints, TlsMode, TransportConfig};

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";

/// Every variable [`Credentials::from_lookup`] requires, in reporting order.
pub const REQUIRED_VARS: [&str; 4] = [
    TENANT_ID_VAR,
    CLIENT_ID_VAR,
    CLIENT_SECRET_VAR,
    SUBSCRIPTION_ID_VAR,
];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment configuration: {}", .missing.join(", "))]
    MissingEnvironment { missing: Vec<&'static str> },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Credentials ─────────────────────────────────────────────────────

/// The only place azmon reads `AZURE_*` variables from the process.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Service principal identity plus the subscription the client is bound to.
///
/// Read once at startup and never written anywhere.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub subscription_id: String,
}

impl Credentials {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Validate the four required values from an arbitrary lookup.
    ///
    /// Absent, empty and whitespace-only values are all rejected, and the
    /// error lists every offending variable rather than the first.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        match (
            read(TENANT_ID_VAR),
            read(CLIENT_ID_VAR),
            read(CLIENT_SECRET_VAR),
            read(SUBSCRIPTION_ID_VAR),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret), Some(subscription_id)) => {
                Ok(Self {
                    tenant_id,
                    client_id,
                    client_secret: SecretString::from(client_secret),
                    subscription_id,
                })
            }
            (tenant, client, secret, subscription) => {
                let missing = [
                    (TENANT_ID_VAR, tenant.is_none()),
                    (CLIENT_ID_VAR, client.is_none()),
                    (CLIENT_SECRET_VAR, secret.is_none()),
                    (SUBSCRIPTION_ID_VAR, subscription.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(ConfigError::MissingEnvironment { missing })
            }
        }
    }

    pub fn client_secret_credential(&self) -> ClientSecretCredential {
        ClientSecretCredential {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Non-secret runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Identity provider host, e.g. `https://login.microsoftonline.com/`.
    pub authority_host: String,

    /// Resource manager host, e.g. `https://management.azure.com/`.
    pub resource_manager_url: String,

    pub metrics_api_version: String,

    pub definitions_api_version: String,

    /// Records shown per list; the rest are silently dropped.
    pub display_limit: usize,

    /// How far back the timespan reaches, in humantime form (`"3h"`).
    pub lookback: String,

    /// Per-request timeout. Unset means no timeout at all.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Extra CA certificate (PEM) to trust.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let endpoints = CloudEndpoints::default();
        Self {
            authority_host: endpoints.authority_host.to_string(),
            resource_manager_url: endpoints.resource_manager.to_string(),
            metrics_api_version: endpoints.metrics_api_version,
            definitions_api_version: endpoints.definitions_api_version,
            display_limit: 5,
            lookback: "3h".into(),
            timeout_secs: None,
            ca_cert: None,
        }
    }
}

impl Settings {
    pub fn endpoints(&self) -> Result<CloudEndpoints, ConfigError> {
        let authority = parse_url("authority_host", &self.authority_host)?;
        let resource_manager = parse_url("resource_manager_url", &self.resource_manager_url)?;
        Ok(CloudEndpoints {
            metrics_api_version: self.metrics_api_version.clone(),
            definitions_api_version: self.definitions_api_version.clone(),
            ..CloudEndpoints::new(authority, resource_manager)
        })
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = self
            .ca_cert
            .clone()
            .map_or(TlsMode::System, TlsMode::CustomCa);
        let transport = TransportConfig { tls, timeout: None };
        match self.timeout_secs {
            Some(secs) => transport.with_timeout(Duration::from_secs(secs)),
            None => transport,
        }
    }

    pub fn lookback(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.lookback).map_err(|e| ConfigError::Validation {
            field: "lookback".into(),
            reason: format!("{e} (got {:?})", self.lookback),
        })
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL {raw:?}: {e}"),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "azmon", "azmon").map_or_else(
        || PathBuf::from(".azmon.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Settings loading ────────────────────────────────────────────────

/// Load settings from defaults, the TOML file (explicit path or
/// [`config_path`]), then `AZMON_*` environment variables.
///
/// A missing file is not an error; a malformed one is.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("AZMON_"));

    Ok(figment.extract()?)
}
