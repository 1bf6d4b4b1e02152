//! Where metrics come from: the authenticated client behind two traits, so
//! the runner can be driven by stubs in tests.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use azmon_api::{
    CloudEndpoints, Error, MetricDefinition, MetricsQuery, MetricsResponse, MonitorClient,
    TransportConfig,
};
use azmon_config::Credentials;

/// Read access to metric definitions and metrics for any resource.
pub trait MetricsSource {
    fn subscription_id(&self) -> &str;

    async fn list_metric_definitions(
        &self,
        resource_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MetricDefinition>, Error>;

    async fn list_metrics(
        &self,
        query: &MetricsQuery,
        cancel: &CancellationToken,
    ) -> Result<MetricsResponse, Error>;
}

impl MetricsSource for MonitorClient {
    fn subscription_id(&self) -> &str {
        MonitorClient::subscription_id(self)
    }

    async fn list_metric_definitions(
        &self,
        resource_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MetricDefinition>, Error> {
        MonitorClient::list_metric_definitions(self, resource_uri, cancel).await
    }

    async fn list_metrics(
        &self,
        query: &MetricsQuery,
        cancel: &CancellationToken,
    ) -> Result<MetricsResponse, Error> {
        MonitorClient::list_metrics(self, query, cancel).await
    }
}

/// Turns validated credentials into a ready [`MetricsSource`].
pub trait Authenticator {
    type Source: MetricsSource;

    async fn authenticate(&self, credentials: &Credentials) -> Result<Self::Source, Error>;
}

/// Client-secret sign-in against the configured cloud.
#[derive(Debug, Clone)]
pub struct ServicePrincipal {
    endpoints: CloudEndpoints,
    transport: TransportConfig,
}

impl ServicePrincipal {
    pub fn new(endpoints: CloudEndpoints, transport: TransportConfig) -> Self {
        Self {
            endpoints,
            transport,
        }
    }
}

impl Authenticator for ServicePrincipal {
    type Source = MonitorClient;

    async fn authenticate(&self, credentials: &Credentials) -> Result<MonitorClient, Error> {
        debug!(
            tenant = %credentials.tenant_id,
            client = %credentials.client_id,
            authority = %self.endpoints.authority_host,
            "requesting access token"
        );
        let client = MonitorClient::login(
            &credentials.client_secret_credential(),
            credentials.subscription_id.clone(),
            self.endpoints.clone(),
            &self.transport,
        )
        .await?;
        info!(expires_on = %client.token_expires_on(), "signed in");
        Ok(client)
    }
}
