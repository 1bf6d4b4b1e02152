// azmon-api: Async Rust client for the Azure Monitor metrics API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod transport;

pub use auth::{AccessToken, ClientSecretCredential, CloudEndpoints};
pub use client::MonitorClient;
pub use error::Error;
pub use models::{
    LocalizableString, MetadataValue, Metric, MetricAvailability, MetricDefinition, MetricValue,
    MetricsResponse, TimeSeriesElement,
};
pub use query::{MetadataFilter, MetricsQuery, ResultKind, TimeRange, format_interval};
pub use transport::{TlsMode, TransportConfig};
