//! CLI error types with miette diagnostics.
//!
//! Maps `azmon_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use azmon_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Credentials ──────────────────────────────────────────────────

    #[error("Missing required environment configuration: {missing}")]
    #[diagnostic(
        code(azmon::missing_environment),
        help(
            "Please provide environment variables for AZURE_TENANT_ID, AZURE_CLIENT_ID, \
             AZURE_CLIENT_SECRET and AZURE_SUBSCRIPTION_ID."
        )
    )]
    MissingEnvironment { missing: String },

    #[error("Authentication failed for tenant '{tenant}'")]
    #[diagnostic(
        code(azmon::auth_failed),
        help(
            "Verify AZURE_CLIENT_ID and AZURE_CLIENT_SECRET, and that the app\n\
             registration exists in the tenant and has a valid secret."
        )
    )]
    AuthFailed {
        tenant: String,
        #[source]
        source: azmon_api::Error,
    },

    // ── Remote calls ─────────────────────────────────────────────────

    #[error("{operation} failed")]
    #[diagnostic(code(azmon::request_failed), help("{hint}"))]
    Request {
        operation: String,
        hint: String,
        #[source]
        source: azmon_api::Error,
    },

    // ── Settings ─────────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(azmon::invalid_setting),
        help("Check the settings file or the matching AZMON_* environment variable.")
    )]
    InvalidSetting { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(azmon::config))]
    Config(Box<figment::Error>),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(azmon::validation))]
    Validation { field: String, reason: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(azmon::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingEnvironment { missing } => Self::MissingEnvironment {
                missing: missing.join(", "),
            },
            ConfigError::Validation { field, reason } => Self::InvalidSetting { field, reason },
            ConfigError::Figment(err) => Self::Config(err),
        }
    }
}

impl CliError {
    /// Wrap a failed API call, picking help text from the failure kind.
    pub fn request(operation: impl Into<String>, source: azmon_api::Error) -> Self {
        let hint = if source.is_auth() {
            "The bearer token was rejected or has expired. Run azmon again to sign in anew."
        } else if source.is_not_found() {
            "Check the resource id. It must be the full ARM id starting with /subscriptions/."
        } else if source.is_forbidden() {
            "The service principal needs the Monitoring Reader role on the resource."
        } else if source.is_connection() {
            "Check network access to the resource manager endpoint (resource_manager_url)."
        } else {
            "Re-run with -vv to see the request that failed."
        };
        Self::Request {
            operation: operation.into(),
            hint: hint.into(),
            source,
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingEnvironment { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Request { source, .. } => {
                if source.is_auth() {
                    exit_code::AUTH
                } else if source.is_not_found() {
                    exit_code::NOT_FOUND
                } else if source.is_forbidden() {
                    exit_code::PERMISSION
                } else if source.is_connection() {
                    exit_code::CONNECTION
                } else {
                    exit_code::GENERAL
                }
            }
            Self::Validation { .. } => exit_code::USAGE,
            Self::InvalidSetting { .. } | Self::Config(_) | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }
}
