//! Liveness probe.

/// Returns "OK" while the process is running.
pub async fn health_check() -> &'static str {
    "OK"
}
