//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the /metrics endpoint handler.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub const FILES_UPLOADED: &str = "files_uploaded_total";
pub const FILE_UPLOAD_BYTES: &str = "file_upload_bytes";
pub const FILE_UPLOAD_FAILURES: &str = "file_upload_failures_total";

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// This must be called once at startup before any metrics are recorded.
/// Panics if called more than once.
pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    describe_counter!(FILES_UPLOADED, "Uploads stored on disk and recorded");
    describe_histogram!(FILE_UPLOAD_BYTES, Unit::Bytes, "Size of accepted uploads");
    describe_counter!(
        FILE_UPLOAD_FAILURES,
        "Uploads that failed, labelled by the stage that failed"
    );
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}
