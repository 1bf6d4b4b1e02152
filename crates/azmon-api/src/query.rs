// Query parameters for the metrics endpoint
//
// `MetricsQuery` carries every optional knob of
// `GET .../providers/microsoft.insights/metrics`; only the fields that are
// set end up on the wire. Compatibility between fields (e.g. a `$filter`
// with `resultType=Metadata`) is the service's call, not ours.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use strum::{Display, EnumString};

use crate::error::Error;

// ── TimeRange ────────────────────────────────────────────────────────

/// A closed `start..=end` window, serialized as `"<start>/<end>"` in
/// RFC 3339 with an explicit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidQuery(format!(
                "time range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The window of length `lookback` that ends at `end`.
    pub fn ending_at(end: DateTime<Utc>, lookback: Duration) -> Result<Self, Error> {
        let span = TimeDelta::from_std(lookback)
            .map_err(|_| Error::InvalidQuery(format!("lookback {lookback:?} is out of range")))?;
        let start = end
            .checked_sub_signed(span)
            .ok_or_else(|| Error::InvalidQuery(format!("lookback {lookback:?} is out of range")))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            self.end.to_rfc3339_opts(SecondsFormat::AutoSi, false)
        )
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| Error::InvalidQuery(format!("timespan {s:?} is not <start>/<end>")))?;
        let parse = |part: &str| {
            DateTime::parse_from_rfc3339(part.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::InvalidQuery(format!("invalid timestamp {part:?}: {e}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

// ── Interval ─────────────────────────────────────────────────────────

/// ISO-8601 duration as the metrics API expects it: `PT1M`, `PT5M`, `PT1H`, `P1D`.
///
/// Only whole seconds are rendered; any sub-second part is dropped, so a
/// 500 ms interval becomes `PT0S`. The service's grains are all whole minutes.
pub fn format_interval(interval: Duration) -> String {
    const DAY: u64 = 86_400;

    let total = interval.as_secs();
    if total == 0 {
        return "PT0S".into();
    }
    if total % DAY == 0 {
        return format!("P{}D", total / DAY);
    }

    let mut out = String::from("P");
    if total >= DAY {
        out.push_str(&format!("{}D", total / DAY));
    }
    out.push('T');
    let rest = total % DAY;
    let (hours, minutes, seconds) = (rest / 3600, rest % 3600 / 60, rest % 60);
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}S"));
    }
    out
}

// ── Result kind ──────────────────────────────────────────────────────

/// `resultType`: time series data, or only the dimension values present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ResultKind {
    Data,
    Metadata,
}

// ── Metadata filter ──────────────────────────────────────────────────

/// OData-style `$filter` over metric dimensions.
///
/// `and` binds tighter than `or`, so an `Or` nested under an `And` is the
/// only shape that needs parentheses when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFilter {
    Equals { key: String, value: String },
    And(Box<MetadataFilter>, Box<MetadataFilter>),
    Or(Box<MetadataFilter>, Box<MetadataFilter>),
}

impl MetadataFilter {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `key eq '*'`: matches every value of the dimension.
    pub fn wildcard(key: impl Into<String>) -> Self {
        Self::equals(key, "*")
    }

    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    fn fmt_and_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or(..) => write!(f, "({self})"),
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for MetadataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { key, value } => write!(f, "{key} eq '{}'", value.replace('\'', "''")),
            Self::And(left, right) => {
                left.fmt_and_operand(f)?;
                f.write_str(" and ")?;
                right.fmt_and_operand(f)
            }
            Self::Or(left, right) => write!(f, "{left} or {right}"),
        }
    }
}

// ── MetricsQuery ─────────────────────────────────────────────────────

/// Parameters for one metrics call. Everything but the resource is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsQuery {
    pub resource_uri: String,
    pub timespan: Option<TimeRange>,
    pub interval: Option<Duration>,
    pub metric_names: Option<String>,
    pub aggregation: Option<String>,
    pub filter: Option<MetadataFilter>,
    pub result_kind: Option<ResultKind>,
}

impl MetricsQuery {
    pub fn new(resource_uri: impl Into<String>) -> Self {
        Self {
            resource_uri: resource_uri.into(),
            timespan: None,
            interval: None,
            metric_names: None,
            aggregation: None,
            filter: None,
            result_kind: None,
        }
    }

    pub fn with_timespan(mut self, timespan: TimeRange) -> Self {
        self.timespan = Some(timespan);
        self
    }

    /// Aggregation grain. Sent in whole seconds, see [`format_interval`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Comma-separated metric names, e.g. `"CpuPercentage"`.
    pub fn with_metric(mut self, metric_names: impl Into<String>) -> Self {
        self.metric_names = Some(metric_names.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_result_kind(mut self, result_kind: ResultKind) -> Self {
        self.result_kind = Some(result_kind);
        self
    }

    /// Query-string pairs for the set fields, in a stable order.
    /// `api-version` is added by the client.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(timespan) = &self.timespan {
            pairs.push(("timespan", timespan.to_string()));
        }
        if let Some(interval) = self.interval {
            pairs.push(("interval", format_interval(interval)));
        }
        if let Some(names) = &self.metric_names {
            pairs.push(("metricnames", names.clone()));
        }
        if let Some(aggregation) = &self.aggregation {
            pairs.push(("aggregation", aggregation.clone()));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.to_string()));
        }
        if let Some(kind) = self.result_kind {
            pairs.push(("resultType", kind.to_string()));
        }
        pairs
    }
}
