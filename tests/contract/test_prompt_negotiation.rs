//! Contract Tests for Prompt Negotiation
//!
//! Drives `CommandDriver` over a real connection to a simulated shell and
//! checks the retry budget, prompt normalization and close-on-every-path.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use diagshell::{CommandDriver, NegotiationOutcome, UnixConnection};
use test_utils::mock_shell::{now, silence};
use test_utils::{fast_settings, MockShell};

async fn driver_for(shell: &MockShell) -> CommandDriver<UnixConnection> {
    let connection = UnixConnection::connect(shell.path()).await.unwrap();
    CommandDriver::new(connection, fast_settings())
}

#[tokio::test]
async fn test_retry_budget_is_five_attempts() {
    let shell = MockShell::spawn(None, |_| silence());
    let mut driver = driver_for(&shell).await;

    let outcome = driver.negotiate_prompt().await.unwrap();

    assert_eq!(outcome, NegotiationOutcome::Degraded { attempts: 5 });
    assert!(driver.prompt().is_empty());
    assert_eq!(shell.count("::prompt on"), 5);
}

#[tokio::test]
async fn test_late_reply_is_picked_up_on_retry() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let requests = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&requests);
    let shell = MockShell::spawn(None, move |line| {
        if line == "::prompt on" && seen.fetch_add(1, Ordering::SeqCst) == 2 {
            now("sw>")
        } else {
            silence()
        }
    });
    let mut driver = driver_for(&shell).await;

    let outcome = driver.negotiate_prompt().await.unwrap();
    assert_eq!(outcome, NegotiationOutcome::Negotiated { attempts: 3 });
    assert_eq!(driver.prompt().to_string(), "sw>");
    assert_eq!(requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_repeated_prompts_are_normalized() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("foo> bar> baz>"),
        _ => silence(),
    });
    let mut driver = driver_for(&shell).await;

    driver.negotiate_prompt().await.unwrap();
    driver.normalize_prompt();

    assert_eq!(driver.prompt().to_string(), "foo>");
}

#[tokio::test]
async fn test_banner_is_stripped_from_prompt() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("banner\nroot@host>"),
        _ => silence(),
    });
    let mut driver = driver_for(&shell).await;

    driver.negotiate_prompt().await.unwrap();
    driver.normalize_prompt();

    assert_eq!(driver.prompt().to_string(), "root@host>");
}

#[tokio::test]
async fn test_greeting_is_drained_before_negotiation() {
    let shell = MockShell::spawn(Some("last session output\nold>"), |line| match line {
        "::prompt on" => now("new>"),
        _ => silence(),
    });
    let mut driver = driver_for(&shell).await;

    driver.negotiate_prompt().await.unwrap();
    assert_eq!(driver.prompt().to_string(), "new>");
}

#[tokio::test]
async fn test_run_closes_connection() {
    let shell = MockShell::spawn(None, |line| match line {
        "::prompt on" => now("sw>"),
        "" => silence(),
        cmd => now(&format!("{}\nsw>", cmd)),
    });
    let driver = driver_for(&shell).await;

    let output = driver.run("show").await.unwrap();
    assert_eq!(output, b"show\nsw>".to_vec());

    // The backend saw end-of-stream, so it accepted a second connection cleanly
    let second = driver_for(&shell).await.run("again").await.unwrap();
    assert_eq!(second, b"again\nsw>".to_vec());
    assert_eq!(shell.connections(), 2);
}
