//! Metrics module
//!
//! Prometheus counters for the uploads of a run. The benchmark is a one-shot
//! process, so instead of a scrape endpoint the registry can be written out in
//! text exposition format for node_exporter's textfile collector.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram,
    register_histogram_vec, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec,
    TextEncoder,
};
use std::path::Path;

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "s3_parallel_put_uploads_total",
        "Total number of uploads",
        &["status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "s3_parallel_put_upload_bytes_total",
        "Total bytes uploaded"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "s3_parallel_put_upload_duration_seconds",
        "Upload duration in seconds",
        &["method"],
        vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // Multipart metrics
    pub static ref MULTIPART_UPLOADS: CounterVec = register_counter_vec!(
        "s3_parallel_put_multipart_uploads_total",
        "Total multipart uploads",
        &["status"]
    ).unwrap();

    pub static ref MULTIPART_PARTS: Histogram = register_histogram!(
        "s3_parallel_put_multipart_parts",
        "Number of parts per multipart upload",
        vec![1.0, 2.0, 5.0, 10.0, 50.0, 100.0, 1000.0]
    ).unwrap();

    // Run metrics
    pub static ref RUN_ELAPSED: Gauge = register_gauge!(
        "s3_parallel_put_run_elapsed_seconds",
        "Wall-clock duration of the last run"
    ).unwrap();

    pub static ref RUN_THROUGHPUT: Gauge = register_gauge!(
        "s3_parallel_put_run_objects_per_second",
        "Objects per second of the last run"
    ).unwrap();

    pub static ref RUN_BANDWIDTH: Gauge = register_gauge!(
        "s3_parallel_put_run_megabytes_per_second",
        "MB per second of the last run"
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&["success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload
pub fn record_upload_failure() {
    UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
}

/// Record upload duration
pub fn record_upload_duration(method: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[method])
        .observe(duration_secs);
}

/// Record a successful multipart upload
pub fn record_multipart_upload_success(parts_count: usize) {
    MULTIPART_UPLOADS.with_label_values(&["success"]).inc();
    MULTIPART_PARTS.observe(parts_count as f64);
}

/// Record a failed multipart upload
pub fn record_multipart_upload_failure() {
    MULTIPART_UPLOADS.with_label_values(&["failure"]).inc();
}

/// Record the statistics of a finished run
pub fn record_run(elapsed_secs: f64, objects_per_sec: f64, mb_per_sec: f64) {
    RUN_ELAPSED.set(elapsed_secs);
    RUN_THROUGHPUT.set(objects_per_sec);
    RUN_BANDWIDTH.set(mb_per_sec);
}

/// Render every registered metric in Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Write the rendered metrics to `path`.
///
/// The file is written next to its destination and renamed into place so a
/// collector never reads a partial file.
pub fn write_textfile(path: &Path) -> anyhow::Result<()> {
    let rendered = render()?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, rendered)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_upload_success() {
        record_upload_success(1024);
        // Just verify it doesn't panic
    }

    #[test]
    fn test_record_upload_failure() {
        record_upload_failure();
        // Just verify it doesn't panic
    }

    #[test]
    fn test_record_multipart_upload_success() {
        record_multipart_upload_success(5);
        // Just verify it doesn't panic
    }

    #[test]
    fn test_render_contains_recorded_metrics() {
        record_upload_duration("put_object", 0.25);
        record_run(2.0, 5.0, 5.0);

        let rendered = render().unwrap();
        assert!(rendered.contains("s3_parallel_put_upload_duration_seconds"));
        assert!(rendered.contains("s3_parallel_put_run_objects_per_second 5"));
    }
}
