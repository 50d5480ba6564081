//! Integration Tests for Basic Command Capture
//!
//! Full cycle through `ShellClient` against a simulated shell backend.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use diagshell::ShellClient;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use test_utils::mock_shell::{now, silence};
use test_utils::{fast_config, MockShell, FAST_RESPONSE};

/// Backend that greets with its prompt, echoes commands and reprints it
fn echoing_shell(prompt: &'static str) -> MockShell {
    MockShell::spawn(Some(prompt), move |line| match line {
        "::prompt on" | "" => now(prompt),
        cmd => now(&format!("{}\r\nresult of {}\r\n{}", cmd, cmd, prompt)),
    })
}

#[tokio::test]
async fn test_output_contains_echo() {
    let shell = echoing_shell("root@host> ");
    let client = ShellClient::new(fast_config(shell.path()));

    for command in ["show version", "ps", "l2 show", "port status 0-3"] {
        let output = client.run(command).await;
        assert!(!output.is_empty(), "no output for '{}'", command);
        assert!(output.contains(command), "echo missing for '{}'", command);
        assert!(output.ends_with("root@host> "));
    }
}

#[tokio::test]
async fn test_switch_prompt_scenario() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("switch#"),
        "" => now("\nswitch#"),
        "show version" => now("show version\nVersion 1.0\nswitch#"),
        _ => silence(),
    });
    let client = ShellClient::new(fast_config(shell.path()));

    let output = client.run("show version").await;
    assert_eq!(output, "show version\nVersion 1.0\nswitch#");
    assert_eq!(
        shell.received(),
        vec!["", "::prompt on", "", "show version"]
    );
}

#[tokio::test]
async fn test_prompt_ends_collection_early() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("Welcome to the NPU shell\nunit0>"),
        "" => now("unit0>"),
        cmd => vec![
            (Duration::ZERO, format!("{}\n", cmd)),
            (Duration::from_millis(50), "line 1\n".to_string()),
            (Duration::from_millis(50), "line 2\nunit0>".to_string()),
        ],
    });
    let mut config = fast_config(shell.path());
    config.timeouts.response_ms = 5_000;
    let client = ShellClient::new(config);

    let started = Instant::now();
    let output = client.run("dump").await;

    assert_eq!(output, "dump\nline 1\nline 2\nunit0>");
    // The prompt, not the 5s inactivity window, ended the read
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_slow_output_within_window_is_kept() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("sw>"),
        "" => silence(),
        _ => (0..4)
            .map(|i| (FAST_RESPONSE / 3, format!("chunk {}\n", i)))
            .chain(std::iter::once((Duration::ZERO, "sw>".to_string())))
            .collect(),
    });
    let client = ShellClient::new(fast_config(shell.path()));

    let output = client.run("slow").await;
    assert_eq!(output, "chunk 0\nchunk 1\nchunk 2\nchunk 3\nsw>");
}

#[tokio::test]
async fn test_invocations_are_independent() {
    let shell = echoing_shell("sw> ");
    let client = ShellClient::new(fast_config(shell.path()));

    let first = client.run("first").await;
    let second = client.run("second").await;

    assert!(first.contains("result of first"));
    assert!(!first.contains("second"));
    assert!(second.contains("result of second"));
    assert_eq!(shell.connections(), 2);
    assert_eq!(shell.count("::prompt on"), 2);
}

#[tokio::test]
async fn test_unit_is_selected_before_command() {
    // Selecting a unit switches the prompt the shell prints
    let unit = Arc::new(Mutex::new("unit0>".to_string()));
    let current = Arc::clone(&unit);
    let shell = MockShell::spawn(None, move |line| {
        let mut prompt = current.lock().unwrap();
        match line {
            "::1" => {
                *prompt = "unit1>".to_string();
                now(&format!("\n{}", prompt))
            }
            "::prompt on" | "" => now(&prompt),
            cmd => now(&format!("{}\nok\n{}", cmd, prompt)),
        }
    });
    let mut config = fast_config(shell.path());
    config.session.unit = Some("1".to_string());
    config.timeouts.response_ms = 5_000;
    let client = ShellClient::new(config);

    let started = Instant::now();
    let output = client.run("show").await;

    assert_eq!(shell.received(), vec!["", "::1", "::prompt on", "", "show"]);
    assert_eq!(output, "show\nok\nunit1>");
    // The unit prompt was negotiated, so it ended the read
    assert!(started.elapsed() < Duration::from_secs(3));
}
