//! Output formatting: console text or JSON.
//!
//! Every list is cut to the display limit without notice. Text output keeps
//! the per-field layout for definitions and a tab-separated table for
//! metrics; JSON emits one pretty document per section.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;

use azmon_api::{Metric, MetricAvailability, MetricDefinition, MetricsResponse};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// The first `limit` items in provider order.
pub fn limited<T>(items: &[T], limit: usize) -> &[T] {
    items.get(..limit).unwrap_or(items)
}

// ── JSON sections ────────────────────────────────────────────────────

#[derive(Serialize)]
struct DefinitionsSection<'a> {
    section: &'a str,
    definitions: &'a [MetricDefinition],
}

#[derive(Serialize)]
struct MetricsSection<'a> {
    section: &'a str,
    cost: f64,
    timespan: &'a str,
    interval: Option<&'a str>,
    metrics: &'a [Metric],
}

// ── Renderer ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
    color: bool,
    limit: usize,
}

impl Renderer {
    pub fn new(format: OutputFormat, color: bool, limit: usize) -> Self {
        Self {
            format,
            color,
            limit,
        }
    }

    pub fn definitions<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        definitions: &[MetricDefinition],
    ) -> Result<(), CliError> {
        let shown = limited(definitions, self.limit);
        match self.format {
            OutputFormat::Json => write_json(
                out,
                &DefinitionsSection {
                    section: title,
                    definitions: shown,
                },
            ),
            OutputFormat::Text => {
                self.title(out, title)?;
                for definition in shown {
                    write_definition(out, definition)?;
                }
                Ok(())
            }
        }
    }

    pub fn metrics<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        response: &MetricsResponse,
    ) -> Result<(), CliError> {
        let shown = limited(&response.value, self.limit);
        match self.format {
            OutputFormat::Json => write_json(
                out,
                &MetricsSection {
                    section: title,
                    cost: response.cost,
                    timespan: &response.timespan,
                    interval: response.interval.as_deref(),
                    metrics: shown,
                },
            ),
            OutputFormat::Text => {
                self.title(out, title)?;
                writeln!(out, "Cost: {}", response.cost)?;
                writeln!(out, "Timespan: {}", response.timespan)?;
                writeln!(out, "Interval: {}", response.interval.as_deref().unwrap_or("-"))?;
                writeln!(out)?;
                writeln!(out, "Id\tName.Value\tName.Localized\tType\tUnit\tTimeseries")?;
                for metric in shown {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}\t{}\t{} series, {} points",
                        metric.id,
                        metric.name.value,
                        metric.name.localized(),
                        metric.metric_type,
                        metric.unit,
                        metric.timeseries.len(),
                        metric.point_count(),
                    )?;
                }
                writeln!(out)?;
                Ok(())
            }
        }
    }

    fn title<W: Write>(&self, out: &mut W, title: &str) -> io::Result<()> {
        if self.color {
            writeln!(out, "{}", title.bold())
        } else {
            writeln!(out, "{title}")
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, section: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, section)?;
    writeln!(out)?;
    Ok(())
}

fn write_definition<W: Write>(out: &mut W, definition: &MetricDefinition) -> io::Result<()> {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_owned();

    writeln!(out, "Id: {}", or_dash(definition.id.as_deref()))?;
    writeln!(
        out,
        " Name: {}, {}",
        definition.name.value,
        definition.name.localized()
    )?;
    writeln!(out, "ResourceId: {}", or_dash(definition.resource_id.as_deref()))?;
    writeln!(out, "Unit: {}", or_dash(definition.unit.as_deref()))?;
    writeln!(
        out,
        "Primary aggregation type: {}",
        or_dash(definition.primary_aggregation_type.as_deref())
    )?;
    writeln!(
        out,
        "List of metric availabilities: {}",
        availabilities(&definition.metric_availabilities)
    )?;
    writeln!(out)
}

fn availabilities(list: &[MetricAvailability]) -> String {
    if list.is_empty() {
        return "none".into();
    }
    list.iter()
        .map(|a| {
            format!(
                "{}/{}",
                a.time_grain.as_deref().unwrap_or("-"),
                a.retention.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use azmon_api::{LocalizableString, MetricValue, TimeSeriesElement};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    const DEFAULT_LIMIT: usize = 5;

    fn text(limit: usize) -> Renderer {
        Renderer::new(OutputFormat::Text, false, limit)
    }

    fn definition(i: usize) -> MetricDefinition {
        MetricDefinition {
            id: Some(format!("def-{i}")),
            resource_id: Some("/subscriptions/sub-1/resourceGroups/rg".into()),
            name: LocalizableString {
                value: format!("Metric{i}"),
                localized_value: Some(format!("Metric {i}")),
            },
            unit: Some("Count".into()),
            primary_aggregation_type: Some("Total".into()),
            metric_availabilities: vec![MetricAvailability {
                time_grain: Some("PT1M".into()),
                retention: Some("P93D".into()),
            }],
            ..MetricDefinition::default()
        }
    }

    fn metric(name: &str, series: usize) -> Metric {
        let point = MetricValue {
            time_stamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            average: Some(1.0),
            minimum: None,
            maximum: None,
            total: None,
            count: None,
        };
        Metric {
            id: format!("/metrics/{name}"),
            metric_type: "Microsoft.Insights/metrics".into(),
            name: LocalizableString::new(name),
            unit: "Percent".into(),
            timeseries: (0..series)
                .map(|_| TimeSeriesElement {
                    metadata_values: Vec::new(),
                    data: vec![point.clone(), point.clone()],
                })
                .collect(),
            error_code: None,
        }
    }

    fn render_definitions(renderer: Renderer, defs: &[MetricDefinition]) -> String {
        let mut out = Vec::new();
        renderer.definitions(&mut out, "Definitions", defs).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn limited_never_exceeds_limit() {
        for (len, expected) in [(0, 0), (3, 3), (5, 5), (12, 5)] {
            let items: Vec<usize> = (0..len).collect();
            assert_eq!(limited(&items, DEFAULT_LIMIT).len(), expected, "len {len}");
        }
    }

    #[test]
    fn renderer_emits_at_most_limit_records() {
        for (len, expected) in [(0, 0), (3, 3), (5, 5), (12, 5)] {
            let defs: Vec<_> = (1..=len).map(definition).collect();
            let rendered = render_definitions(text(DEFAULT_LIMIT), &defs);
            let entries = rendered.lines().filter(|l| l.starts_with("Id: ")).count();
            assert_eq!(entries, expected, "{len} definitions");

            let response = MetricsResponse {
                value: (0..len).map(|i| metric(&format!("M{i}"), 1)).collect(),
                ..MetricsResponse::default()
            };
            let mut out = Vec::new();
            text(DEFAULT_LIMIT).metrics(&mut out, "t", &response).unwrap();
            let rows = String::from_utf8(out)
                .unwrap()
                .lines()
                .filter(|l| l.starts_with("/metrics/"))
                .count();
            assert_eq!(rows, expected, "{len} metrics");
        }
    }

    #[test]
    fn definitions_are_truncated_in_provider_order() {
        let defs: Vec<_> = (1..=7).map(definition).collect();
        let rendered = render_definitions(text(DEFAULT_LIMIT), &defs);

        let ids: Vec<_> = rendered
            .lines()
            .filter_map(|line| line.strip_prefix("Id: "))
            .collect();
        assert_eq!(ids, ["def-1", "def-2", "def-3", "def-4", "def-5"]);
        assert!(rendered.contains(" Name: Metric1, Metric 1"));
        assert!(rendered.contains("Unit: Count"));
        assert!(rendered.contains("Primary aggregation type: Total"));
        assert!(rendered.contains("List of metric availabilities: PT1M/P93D"));
        assert!(!rendered.contains("def-6"));
    }

    #[test]
    fn missing_definition_fields_render_as_dash() {
        let bare = MetricDefinition {
            name: LocalizableString::new("Requests"),
            ..MetricDefinition::default()
        };
        let rendered = render_definitions(text(DEFAULT_LIMIT), &[bare]);
        assert_eq!(
            rendered,
            "Definitions\n\
             Id: -\n \
             Name: Requests, Requests\n\
             ResourceId: -\n\
             Unit: -\n\
             Primary aggregation type: -\n\
             List of metric availabilities: none\n\n"
        );
    }

    #[test]
    fn metrics_header_and_rows() {
        let response = MetricsResponse {
            cost: 12.5,
            timespan: "2024-01-01T00:00:00Z/2024-01-01T03:00:00Z".into(),
            interval: Some("PT1M".into()),
            value: vec![metric("CpuPercentage", 1), metric("MemoryPercentage", 3)],
            ..MetricsResponse::default()
        };
        let mut out = Vec::new();
        text(DEFAULT_LIMIT)
            .metrics(&mut out, "Call with default parameters", &response)
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(
            &lines[..6],
            [
                "Call with default parameters",
                "Cost: 12.5",
                "Timespan: 2024-01-01T00:00:00Z/2024-01-01T03:00:00Z",
                "Interval: PT1M",
                "",
                "Id\tName.Value\tName.Localized\tType\tUnit\tTimeseries",
            ]
        );
        assert_eq!(
            lines[6],
            "/metrics/CpuPercentage\tCpuPercentage\tCpuPercentage\tMicrosoft.Insights/metrics\tPercent\t1 series, 2 points"
        );
        assert!(lines[7].ends_with("\t3 series, 6 points"));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn metric_rows_follow_the_limit() {
        let response = MetricsResponse {
            value: (0..12).map(|i| metric(&format!("M{i}"), 0)).collect(),
            ..MetricsResponse::default()
        };
        let mut out = Vec::new();
        text(3).metrics(&mut out, "t", &response).unwrap();
        let rows = String::from_utf8(out)
            .unwrap()
            .lines()
            .filter(|line| line.starts_with("/metrics/"))
            .count();
        assert_eq!(rows, 3);
    }

    #[test]
    fn json_sections_carry_truncated_records() {
        let defs: Vec<_> = (1..=7).map(definition).collect();
        let mut out = Vec::new();
        Renderer::new(OutputFormat::Json, false, 2)
            .definitions(&mut out, "Metric definitions", &defs)
            .unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["section"], "Metric definitions");
        let ids: Vec<_> = doc["definitions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["def-1", "def-2"]);
    }

    #[test]
    fn color_titles_are_bold() {
        let mut out = Vec::new();
        Renderer::new(OutputFormat::Text, true, 5)
            .definitions(&mut out, "Metric definitions", &[])
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\u{1b}[1mMetric definitions\u{1b}[0m\n"
        );
    }
}
