//! Signal Integration Tests
//! Run with: cargo test --test signal_test
#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use telegent_bot::application::lifecycle::ShutdownSignal;

fn raise(signal: &str) {
    let status = Command::new("kill")
        .arg(format!("-{}", signal))
        .arg(std::process::id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

// Both signals in one test so no other test in this binary sees them
#[tokio::test]
async fn test_process_signals_are_named() {
    for (signal, expected) in [("INT", "SIGINT"), ("TERM", "SIGTERM")] {
        let shutdown = ShutdownSignal::install().unwrap();
        raise(signal);

        let received = tokio::time::timeout(Duration::from_secs(5), shutdown.recv())
            .await
            .expect("signal never delivered");
        assert_eq!(received, expected);
    }
}
