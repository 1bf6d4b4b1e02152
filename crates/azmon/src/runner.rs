//! The run itself: credentials, sign-in, definitions, then every planned
//! metrics call in order. The first failure ends the run.

use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use azmon_api::TimeRange;
use azmon_config::Credentials;

use crate::error::CliError;
use crate::output::Renderer;
use crate::plan::build_plan;
use crate::source::{Authenticator, MetricsSource};

const DEFINITIONS_TITLE: &str = "Metric definitions";

/// Everything a run needs besides credentials and the network.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub resource_id: String,
    /// End of the shared time range.
    pub now: DateTime<Utc>,
    pub lookback: Duration,
}

/// Execute one run, writing each section to `out` as soon as it arrives.
///
/// `lookup` supplies the `AZURE_*` values. When any is missing the run stops
/// before `authenticator` is called.
pub async fn run<A, W>(
    lookup: impl Fn(&str) -> Option<String>,
    authenticator: &A,
    options: &RunOptions,
    renderer: &Renderer,
    out: &mut W,
) -> Result<(), CliError>
where
    A: Authenticator,
    W: Write,
{
    let credentials = Credentials::from_lookup(lookup)?;
    let time_range =
        TimeRange::ending_at(options.now, options.lookback).map_err(|e| CliError::Validation {
            field: "lookback".into(),
            reason: e.to_string(),
        })?;

    let source = authenticator
        .authenticate(&credentials)
        .await
        .map_err(|source| CliError::AuthFailed {
            tenant: credentials.tenant_id.clone(),
            source,
        })?;
    info!(subscription = source.subscription_id(), "client ready");

    // Never cancelled; the calls accept one so callers can wire it later.
    let cancel = CancellationToken::new();

    let definitions = source
        .list_metric_definitions(&options.resource_id, &cancel)
        .await
        .map_err(|e| CliError::request("Listing metric definitions", e))?;
    debug!(count = definitions.len(), "metric definitions received");
    renderer.definitions(out, DEFINITIONS_TITLE, &definitions)?;

    for variant in build_plan(&options.resource_id, time_range) {
        info!(title = variant.title, "querying metrics");
        let response = source
            .list_metrics(&variant.query, &cancel)
            .await
            .map_err(|e| CliError::request(variant.title, e))?;
        debug!(metrics = response.value.len(), cost = response.cost, "metrics received");
        renderer.metrics(out, variant.title, &response)?;
    }

    out.flush()?;
    Ok(())
}
