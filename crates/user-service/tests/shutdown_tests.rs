//! Shutdown signal tests.
//!
//! Kept in their own test binary: the signal is delivered to the whole
//! process.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::process::Command;
use std::time::Duration;
use user_service::shutdown::shutdown_signal;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sigterm_triggers_shutdown() {
    let waiter = tokio::spawn(shutdown_signal());

    // Let the task install its handlers before the signal arrives
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("kill should run");
    assert!(status.success());

    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("SIGTERM should resolve the shutdown signal")
        .unwrap();
}
