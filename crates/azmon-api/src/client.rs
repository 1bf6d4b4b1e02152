// Async HTTP client for the Azure Monitor metrics API.
//
// Base path: {resource_manager}/{resourceUri}/providers/microsoft.insights/
// Auth: bearer token from the client-credentials grant

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::auth::{AccessToken, ClientSecretCredential, CloudEndpoints};
use crate::error::{Error, body_preview};
use crate::models::{Collection, MetricDefinition, MetricsResponse};
use crate::query::MetricsQuery;
use crate::transport::TransportConfig;

// ── Error response shape from Azure Resource Manager ─────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Read-only client for metric definitions and metrics.
///
/// Holds one bearer token for its whole life and is bound to a single
/// subscription. Every call is a plain GET; nothing is cached or retried.
pub struct MonitorClient {
    http: reqwest::Client,
    endpoints: CloudEndpoints,
    subscription_id: String,
    token: AccessToken,
}

impl MonitorClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Authenticate with a client secret and bind the client to `subscription_id`.
    pub async fn login(
        credential: &ClientSecretCredential,
        subscription_id: impl Into<String>,
        endpoints: CloudEndpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let token = credential.request_token(&http, &endpoints).await?;
        Ok(Self::with_token(http, endpoints, subscription_id, token))
    }

    /// Wrap an existing `reqwest::Client` and an already-issued token.
    pub fn with_token(
        http: reqwest::Client,
        endpoints: CloudEndpoints,
        subscription_id: impl Into<String>,
        token: AccessToken,
    ) -> Self {
        Self {
            http,
            endpoints,
            subscription_id: subscription_id.into(),
            token,
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn token_expires_on(&self) -> DateTime<Utc> {
        self.token.expires_on()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{resource_manager}/{resource}/providers/microsoft.insights/{path}`
    ///
    /// The resource id is appended segment by segment, so it is always a path
    /// under the resource manager host: `?`, `#` and `:` are percent-encoded
    /// and an absolute URL cannot redirect the request.
    fn resource_url(&self, resource_uri: &str, path: &str) -> Result<Url, Error> {
        let resource = resource_uri.trim_matches('/');
        if resource.is_empty() {
            return Err(Error::InvalidQuery("resource id must not be empty".into()));
        }

        let mut url = self.endpoints.resource_manager.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidQuery(format!(
                    "resource manager URL {} cannot carry a path",
                    self.endpoints.resource_manager
                ))
            })?
            .pop_if_empty()
            .extend(resource.split('/').filter(|segment| !segment.is_empty()))
            .extend(["providers", "microsoft.insights", path]);
        Ok(url)
    }

    // ── HTTP ─────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T, Error> {
        if self.token.is_expired_at(Utc::now()) {
            return Err(Error::SessionExpired);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = self.send_get(url, params) => result,
        }
    }

    async fn send_get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.token.secret().expose_secret())
            .query(params)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", body_preview(&body)),
                body,
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|r| r.error);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            let detail = parsed
                .and_then(|e| e.message)
                .unwrap_or_else(|| "token rejected".into());
            return Error::Authentication {
                message: format!("HTTP 401: {detail}"),
            };
        }

        match parsed {
            Some(err) => Error::Api {
                status: status.as_u16(),
                message: err.message.unwrap_or_else(|| status.to_string()),
                code: err.code,
            },
            None => Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    body_preview(&raw)
                },
                code: None,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET {resource}/providers/microsoft.insights/metricDefinitions`
    ///
    /// This endpoint takes no `$filter`; it always lists every definition.
    pub async fn list_metric_definitions(
        &self,
        resource_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MetricDefinition>, Error> {
        let url = self.resource_url(resource_uri, "metricDefinitions")?;
        let params = [(
            "api-version",
            self.endpoints.definitions_api_version.clone(),
        )];
        let collection: Collection<MetricDefinition> = self.get(url, &params, cancel).await?;
        Ok(collection.value)
    }

    /// `GET {resource}/providers/microsoft.insights/metrics`
    pub async fn list_metrics(
        &self,
        query: &MetricsQuery,
        cancel: &CancellationToken,
    ) -> Result<MetricsResponse, Error> {
        let url = self.resource_url(&query.resource_uri, "metrics")?;
        let mut params = vec![("api-version", self.endpoints.metrics_api_version.clone())];
        params.extend(query.query_pairs());
        self.get(url, &params, cancel).await
    }
}
