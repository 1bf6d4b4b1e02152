// Entra ID client-secret authentication
//
// One-shot client-credentials grant against the v2.0 token endpoint.
// The resulting bearer token lives as long as the client holding it;
// nothing here refreshes or retries.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, body_preview};

const PUBLIC_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";
const PUBLIC_RESOURCE_MANAGER: &str = "https://management.azure.com/";
const DEFAULT_API_VERSION: &str = "2018-01-01";

/// Where to authenticate and where to send metrics requests.
///
/// Defaults target the public cloud. Sovereign clouds (or a mock server in
/// tests) swap both hosts.
#[derive(Debug, Clone)]
pub struct CloudEndpoints {
    pub authority_host: Url,
    pub resource_manager: Url,
    pub metrics_api_version: String,
    pub definitions_api_version: String,
}

impl Default for CloudEndpoints {
    fn default() -> Self {
        Self {
            authority_host: Url::parse(PUBLIC_AUTHORITY_HOST).expect("static URL is valid"),
            resource_manager: Url::parse(PUBLIC_RESOURCE_MANAGER).expect("static URL is valid"),
            metrics_api_version: DEFAULT_API_VERSION.into(),
            definitions_api_version: DEFAULT_API_VERSION.into(),
        }
    }
}

impl CloudEndpoints {
    /// Build endpoints from two base URLs, keeping the default API versions.
    ///
    /// Both URLs are normalized to end in `/` so relative joins append
    /// instead of replacing the last path segment.
    pub fn new(authority_host: Url, resource_manager: Url) -> Self {
        Self {
            authority_host: with_trailing_slash(authority_host),
            resource_manager: with_trailing_slash(resource_manager),
            ..Self::default()
        }
    }

    /// `{authority}/{tenant}/oauth2/v2.0/token`
    pub fn token_url(&self, tenant_id: &str) -> Result<Url, Error> {
        Ok(self
            .authority_host
            .join(&format!("{tenant_id}/oauth2/v2.0/token"))?)
    }

    /// The `.default` scope of the resource manager audience,
    /// e.g. `https://management.azure.com/.default`.
    pub fn scope(&self) -> String {
        format!("{}.default", self.resource_manager)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Service principal identity for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct ClientSecretCredential {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

/// A bearer token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    secret: SecretString,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: SecretString, expires_on: DateTime<Utc>) -> Self {
        Self { secret, expires_on }
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_on
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: ExpiresIn,
}

/// The v2.0 endpoint sends a number; older v1 endpoints send a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<i64, Error> {
        match self {
            Self::Seconds(secs) => Ok(*secs),
            Self::Text(text) => text.trim().parse().map_err(|_| Error::Authentication {
                message: format!("token response has non-numeric expires_in: {text:?}"),
            }),
        }
    }
}

/// `{"error": "invalid_client", "error_description": "AADSTS7000215: ..."}`
#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ClientSecretCredential {
    /// Exchange the client secret for an access token.
    ///
    /// `POST {authority}/{tenant}/oauth2/v2.0/token` with a
    /// `grant_type=client_credentials` form body. Any non-2xx answer is an
    /// [`Error::Authentication`] carrying the identity provider's message.
    pub async fn request_token(
        &self,
        http: &reqwest::Client,
        endpoints: &CloudEndpoints,
    ) -> Result<AccessToken, Error> {
        let url = endpoints.token_url(&self.tenant_id)?;
        let scope = endpoints.scope();

        debug!(client_id = %self.client_id, %scope, "requesting token at {url}");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", scope.as_str()),
        ];

        let resp = http.post(url).form(&form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => format!("token request failed (HTTP {status}): {}", body_preview(&body)),
            };
            return Err(Error::Authentication { message });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (token response)"),
                body: String::new(),
            })?;

        let lifetime = TimeDelta::try_seconds(token.expires_in.seconds()?).ok_or_else(|| {
            Error::Authentication {
                message: "token lifetime out of range".into(),
            }
        })?;
        let expires_on = Utc::now() + lifetime;

        debug!(%expires_on, "token acquired");
        Ok(AccessToken::new(
            SecretString::from(token.access_token),
            expires_on,
        ))
    }
}
