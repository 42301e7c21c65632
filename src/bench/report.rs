//! Run statistics and report rendering
//!
//! Three renderings of the same numbers:
//!
//! - `human`: the multi-line console report
//! - `record`: one `;`-separated line for log collectors
//! - `json`: one JSON object
//!
//! The record line has a fixed field order:
//!
//! ```text
//! PUT;<node>;<concurrency>;<size>;<meta-count>;<meta-size>;<elapsed>;<objs/sec>;<MB/sec>;<start>;<end>
//! ```

use super::RunReport;
use crate::config::BenchConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;

/// Operation tag leading every record line
pub const OPERATION_TAG: &str = "PUT";

/// Durations shorter than this are treated as zero
pub const MIN_ELAPSED_SECS: f64 = 1e-9;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Output format of the run report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Record,
    Json,
}

/// Throughput figures derived from a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunStats {
    pub total_bytes: u64,
    pub elapsed_secs: f64,
    pub objects_per_sec: f64,
    pub mb_per_sec: f64,
}

impl RunStats {
    /// Compute the statistics of `objects` uploads of `object_size` bytes
    pub fn compute(objects: usize, object_size: usize, elapsed: Duration) -> Self {
        Self::from_secs(objects, object_size, elapsed.as_secs_f64())
    }

    /// Same as [`RunStats::compute`] with the elapsed time in seconds.
    ///
    /// A run shorter than [`MIN_ELAPSED_SECS`] reports zero throughput and
    /// bandwidth.
    pub fn from_secs(objects: usize, object_size: usize, elapsed_secs: f64) -> Self {
        let total_bytes = objects as u64 * object_size as u64;

        let (objects_per_sec, mb_per_sec) = if elapsed_secs < MIN_ELAPSED_SECS {
            (0.0, 0.0)
        } else {
            (
                objects as f64 / elapsed_secs,
                total_bytes as f64 / elapsed_secs / BYTES_PER_MB,
            )
        };

        Self {
            total_bytes,
            elapsed_secs,
            objects_per_sec,
            mb_per_sec,
        }
    }
}

/// UTC timestamp with millisecond precision, e.g. `2024-05-01T12:00:00.250Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// JSON shape of a run
#[derive(Debug, Serialize)]
struct RunRecord<'a> {
    operation: &'static str,
    node: Option<&'a str>,
    concurrency: usize,
    object_size: usize,
    meta_count: usize,
    meta_size: usize,
    elapsed_secs: f64,
    objects_per_sec: f64,
    mb_per_sec: f64,
    total_bytes: u64,
    start: String,
    end: String,
}

/// Render `report` in `format`
pub fn render(
    format: OutputFormat,
    config: &BenchConfig,
    report: &RunReport,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(render_human(config, report)),
        OutputFormat::Record => Ok(render_record(config, report)),
        OutputFormat::Json => render_json(config, report),
    }
}

/// Multi-line console report
pub fn render_human(config: &BenchConfig, report: &RunReport) -> String {
    let mut out = String::new();
    if let Some(node) = &config.node {
        out.push_str(&format!("Node         : {}\n", node));
    }
    out.push_str(&format!("Elapsed time : {:.3?}\n", report.elapsed));
    out.push_str(&format!(
        "Speed        : {:4.0} objs/sec\n",
        report.stats.objects_per_sec
    ));
    out.push_str(&format!(
        "Bandwidth    : {:4.0} MB/sec",
        report.stats.mb_per_sec
    ));
    out
}

/// Single `;`-separated line
pub fn render_record(config: &BenchConfig, report: &RunReport) -> String {
    [
        OPERATION_TAG.to_string(),
        config.node.clone().unwrap_or_default(),
        report.objects.to_string(),
        report.object_size.to_string(),
        config.meta_count.to_string(),
        config.meta_size.to_string(),
        format!("{:.3}", report.stats.elapsed_secs),
        format!("{:.2}", report.stats.objects_per_sec),
        format!("{:.2}", report.stats.mb_per_sec),
        format_timestamp(&report.started_at),
        format_timestamp(&report.finished_at),
    ]
    .join(";")
}

/// One JSON object
pub fn render_json(config: &BenchConfig, report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RunRecord {
        operation: OPERATION_TAG,
        node: config.node.as_deref(),
        concurrency: report.objects,
        object_size: report.object_size,
        meta_count: config.meta_count,
        meta_size: config.meta_size,
        elapsed_secs: report.stats.elapsed_secs,
        objects_per_sec: report.stats.objects_per_sec,
        mb_per_sec: report.stats.mb_per_sec,
        total_bytes: report.stats.total_bytes,
        start: format_timestamp(&report.started_at),
        end: format_timestamp(&report.finished_at),
    })
}
