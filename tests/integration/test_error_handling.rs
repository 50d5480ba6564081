//! Integration Tests for Error Handling
//!
//! Failures anywhere in the cycle end as an empty result from `run`, never
//! as a panic or a hang.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use diagshell::{Error, ShellClient};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use test_utils::mock_shell::{now, silence};
use test_utils::{fast_config, MockShell, FAST_RESPONSE};
use tokio::net::UnixListener;

#[tokio::test]
async fn test_missing_endpoint() {
    let dir = TempDir::new().unwrap();
    let client = ShellClient::new(fast_config(&dir.path().join("ar.npu.shell")));

    assert_eq!(client.run("show version").await, "");
    assert!(matches!(
        client.try_run("show version").await,
        Err(Error::ConnectionFailed { .. })
    ));
}

#[tokio::test]
async fn test_stale_socket_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ar.npu.shell");
    // Bind and drop: the path exists but nobody listens
    drop(std::os::unix::net::UnixListener::bind(&path).unwrap());

    let client = ShellClient::new(fast_config(&path));
    assert_eq!(client.run("show version").await, "");
}

#[tokio::test]
async fn test_backend_hangs_up_immediately() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ar.npu.shell");
    let listener = UnixListener::bind(&path).unwrap();

    let server = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            drop(stream);
        }
    });

    let client = ShellClient::new(fast_config(&path));
    let started = Instant::now();
    let output = client.run("show version").await;

    assert_eq!(output, "");
    assert!(started.elapsed() < Duration::from_secs(10));
    server.abort();
}

#[tokio::test]
async fn test_stalled_response_returns_partial_output() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("sw>"),
        "" => silence(),
        _ => vec![
            (Duration::ZERO, "show tables\nrow 1\n".to_string()),
            // Far longer than the response window; the prompt never comes
            (Duration::from_secs(30), "row 2\nsw>".to_string()),
        ],
    });
    let client = ShellClient::new(fast_config(shell.path()));

    let started = Instant::now();
    let output = client.run("show tables").await;

    assert_eq!(output, "show tables\nrow 1\n");
    let elapsed = started.elapsed();
    assert!(elapsed >= FAST_RESPONSE);
    assert!(elapsed < Duration::from_secs(10));
}

#[tokio::test]
async fn test_silent_backend_degrades_after_five_attempts() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" | "" => silence(),
        cmd => now(&format!("{}\nno prompt here\n", cmd)),
    });
    let client = ShellClient::new(fast_config(shell.path()));

    let output = client.run("show ports").await;

    assert_eq!(shell.count("::prompt on"), 5);
    assert_eq!(output, "show ports\nno prompt here\n");
}

#[tokio::test]
async fn test_negotiation_without_gt_is_not_degraded() {
    // Non-empty replies count as a prompt even when no `>` shows up
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("OK"),
        "" => silence(),
        cmd => now(&format!("{}\nOK", cmd)),
    });
    let client = ShellClient::new(fast_config(shell.path()));

    let output = client.run("x").await;
    assert_eq!(shell.count("::prompt on"), 1);
    assert_eq!(output, "x\nOK");
}
