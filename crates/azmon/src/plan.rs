//! The fixed sequence of metrics calls, from bare to fully specified.

use std::time::Duration;

use azmon_api::{MetadataFilter, MetricsQuery, ResultKind, TimeRange};

pub const TRANSACTIONS: &str = "Transactions";
pub const CPU_PERCENTAGE: &str = "CpuPercentage";
pub const COUNT: &str = "Count";

const ONE_MINUTE: Duration = Duration::from_secs(60);
const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

/// One metrics call and the title printed above its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryVariant {
    pub title: &'static str,
    pub query: MetricsQuery,
}

impl QueryVariant {
    fn new(title: &'static str, query: MetricsQuery) -> Self {
        Self { title, query }
    }
}

/// `Metadata1 eq 'm1' and Metadata2 eq 'm2' or Metadata3 eq '*'`
pub fn dimension_filter() -> MetadataFilter {
    MetadataFilter::equals("Metadata1", "m1")
        .and(MetadataFilter::equals("Metadata2", "m2"))
        .or(MetadataFilter::wildcard("Metadata3"))
}

/// Build the eight calls for `resource_id`. Every call after the first
/// shares `time_range`.
pub fn build_plan(resource_id: &str, time_range: TimeRange) -> Vec<QueryVariant> {
    let bare = MetricsQuery::new(resource_id);
    let windowed = bare
        .clone()
        .with_timespan(time_range)
        .with_result_kind(ResultKind::Data);
    let five_minutes = windowed.clone().with_interval(FIVE_MINUTES);
    let cpu = five_minutes.clone().with_metric(CPU_PERCENTAGE);
    let cpu_count = cpu.clone().with_aggregation(COUNT);
    let filtered = cpu_count.clone().with_filter(dimension_filter());

    vec![
        QueryVariant::new("Call with default parameters", bare.clone()),
        QueryVariant::new(
            "Call with more parameters, but no filter",
            windowed
                .clone()
                .with_interval(ONE_MINUTE)
                .with_metric(TRANSACTIONS),
        ),
        QueryVariant::new(
            "Call to retrieve time series with timespan parameter",
            windowed,
        ),
        QueryVariant::new(
            "Call to retrieve time series with timespan and interval parameters",
            five_minutes,
        ),
        QueryVariant::new(
            "Call to retrieve time series with timespan, interval, and metric parameters",
            cpu,
        ),
        QueryVariant::new(
            "Call to retrieve time series with timespan, interval, metric, and aggregation parameters",
            cpu_count,
        ),
        QueryVariant::new(
            "Call to retrieve time series with timespan, interval, metric, and $filter parameters",
            filtered,
        ),
        QueryVariant::new(
            "Call to retrieve metadata with timespan",
            bare.with_filter(MetadataFilter::wildcard("Metadata3"))
                .with_timespan(time_range)
                .with_metric(CPU_PERCENTAGE)
                .with_result_kind(ResultKind::Metadata),
        ),
    ]
}
