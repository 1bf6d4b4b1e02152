// Azure Monitor response models
//
// Narrow read-only views of the ARM payloads: only the fields the CLI
// renders, everything else is ignored on deserialization. Fields that
// the service omits for some resource types default instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `{ "value": "...", "localizedValue": "..." }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizableString {
    pub value: String,
    #[serde(default)]
    pub localized_value: Option<String>,
}

impl LocalizableString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            localized_value: None,
        }
    }

    /// Localized form when present, raw value otherwise.
    pub fn localized(&self) -> &str {
        self.localized_value.as_deref().unwrap_or(&self.value)
    }
}

/// Envelope for ARM list responses.
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

// ── Metric definitions ───────────────────────────────────────────────

/// One entry of `GET .../providers/microsoft.insights/metricDefinitions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: LocalizableString,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub primary_aggregation_type: Option<String>,
    #[serde(default)]
    pub supported_aggregation_types: Vec<String>,
    #[serde(default)]
    pub metric_availabilities: Vec<MetricAvailability>,
    #[serde(default)]
    pub dimensions: Vec<LocalizableString>,
    #[serde(default)]
    pub is_dimension_required: Option<bool>,
}

/// A time grain the metric can be queried at and how long it is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAvailability {
    #[serde(default)]
    pub time_grain: Option<String>,
    #[serde(default)]
    pub retention: Option<String>,
}

// ── Metrics ──────────────────────────────────────────────────────────

/// Response of `GET .../providers/microsoft.insights/metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub cost: f64,
    pub timespan: String,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub value: Vec<Metric>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, rename = "resourceregion")]
    pub resource_region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub metric_type: String,
    pub name: LocalizableString,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub timeseries: Vec<TimeSeriesElement>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl Metric {
    /// Total data points across all series.
    pub fn point_count(&self) -> usize {
        self.timeseries.iter().map(|series| series.data.len()).sum()
    }
}

/// One series: the dimension values that identify it plus its points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesElement {
    #[serde(default, rename = "metadatavalues")]
    pub metadata_values: Vec<MetadataValue>,
    #[serde(default)]
    pub data: Vec<MetricValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataValue {
    pub name: LocalizableString,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub time_stamp: DateTime<Utc>,
    #[serde(default)]
    pub average: Option<f64>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_tolerates_missing_optional_fields() {
        let def: MetricDefinition = serde_json::from_value(json!({
            "name": { "value": "CpuPercentage" }
        }))
        .unwrap();
        assert_eq!(def.name.localized(), "CpuPercentage");
        assert!(def.metric_availabilities.is_empty());
        assert!(def.unit.is_none());
    }

    #[test]
    fn metrics_response_reads_arm_shape() {
        let resp: MetricsResponse = serde_json::from_value(json!({
            "cost": 59,
            "timespan": "2024-01-01T00:00:00Z/2024-01-01T03:00:00Z",
            "interval": "PT1M",
            "namespace": "Microsoft.Web/sites",
            "resourceregion": "westus",
            "value": [{
                "id": "/subscriptions/s/providers/Microsoft.Insights/metrics/CpuTime",
                "type": "Microsoft.Insights/metrics",
                "name": { "value": "CpuTime", "localizedValue": "CPU Time" },
                "unit": "Seconds",
                "timeseries": [{
                    "metadatavalues": [{ "name": { "value": "Instance" }, "value": "a" }],
                    "data": [
                        { "timeStamp": "2024-01-01T00:00:00Z", "total": 1.5 },
                        { "timeStamp": "2024-01-01T00:01:00Z" }
                    ]
                }]
            }]
        }))
        .unwrap();

        assert!((resp.cost - 59.0).abs() < f64::EPSILON);
        assert_eq!(resp.resource_region.as_deref(), Some("westus"));
        let metric = &resp.value[0];
        assert_eq!(metric.metric_type, "Microsoft.Insights/metrics");
        assert_eq!(metric.name.localized(), "CPU Time");
        assert_eq!(metric.point_count(), 2);
        assert_eq!(metric.timeseries[0].data[0].total, Some(1.5));
        assert_eq!(
            metric.timeseries[0].metadata_values[0].value.as_deref(),
            Some("a")
        );
    }
}
