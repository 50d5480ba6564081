//! Prompt-Synchronizing Command Driver
//!
//! Runs the fixed per-invocation protocol against a [`SessionTransport`]:
//!
//! 1. wake the shell with a bare newline
//! 2. optionally select a unit, so the prompt captured next is that unit's
//! 3. negotiate the prompt (`::prompt on`, bounded retries)
//! 4. normalize it
//! 5. settle the shell with a bare newline and a drain
//! 6. send the command and collect output until the prompt comes back
//! 7. close the transport, whatever happened before

pub mod prompt;

use crate::config::Config;
use crate::error::Result;
use crate::session::{SessionTimeouts, SessionTransport};

pub use prompt::Prompt;

/// Knobs for one driver run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub timeouts: SessionTimeouts,
    pub max_attempts: u32,
    pub prompt_marker: String,
    pub prompt_request: String,
    pub unit: Option<String>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DriverSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeouts: config.session_timeouts(),
            max_attempts: config.negotiation.max_attempts,
            prompt_marker: config.negotiation.prompt_marker.clone(),
            prompt_request: config.negotiation.prompt_request.clone(),
            unit: config.unit().map(str::to_string),
        }
    }
}

/// How prompt negotiation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// A non-empty candidate was captured
    Negotiated { attempts: u32 },
    /// Every attempt came back empty; output collection falls back to the
    /// response inactivity window alone
    Degraded { attempts: u32 },
}

impl NegotiationOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            NegotiationOutcome::Negotiated { attempts }
            | NegotiationOutcome::Degraded { attempts } => *attempts,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, NegotiationOutcome::Degraded { .. })
    }
}

/// Drives one handshake and one command over a transport it owns
pub struct CommandDriver<T: SessionTransport> {
    transport: T,
    settings: DriverSettings,
    prompt: Prompt,
}

impl<T: SessionTransport> CommandDriver<T> {
    pub fn new(transport: T, settings: DriverSettings) -> Self {
        Self {
            transport,
            settings,
            prompt: Prompt::empty(),
        }
    }

    /// Current prompt (empty until negotiated)
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Give the transport back, e.g. to inspect a test double
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Ask the backend for its prompt until something comes back.
    ///
    /// The captured text is stored raw; call [`Self::normalize_prompt`]
    /// before using it as a marker.
    pub async fn negotiate_prompt(&mut self) -> Result<NegotiationOutcome> {
        let timeouts = self.settings.timeouts;
        let mut attempts = 0;

        while attempts < self.settings.max_attempts {
            attempts += 1;

            self.transport.drain(timeouts.drain).await?;
            self.transport
                .write_line(&self.settings.prompt_request)
                .await?;
            let captured = self
                .transport
                .read_until(
                    timeouts.negotiate,
                    Some(self.settings.prompt_marker.as_bytes()),
                )
                .await?;

            if !captured.is_empty() {
                self.prompt = Prompt::new(captured);
                debug!(
                    "Prompt candidate after {} attempt(s): {:?}",
                    attempts,
                    self.prompt.to_string()
                );
                return Ok(NegotiationOutcome::Negotiated { attempts });
            }

            debug!("Prompt attempt {} returned nothing", attempts);
        }

        warn!(
            "No prompt after {} attempts, collecting output until the shell goes quiet",
            attempts
        );
        self.prompt = Prompt::empty();
        Ok(NegotiationOutcome::Degraded { attempts })
    }

    /// Reduce the stored prompt to a single clean prompt line
    pub fn normalize_prompt(&mut self) {
        self.prompt.normalize(self.settings.prompt_marker.as_bytes());
        trace!("Normalized prompt: {:?}", self.prompt.to_string());
    }

    /// Nudge shells that print nothing until they receive input.
    ///
    /// Whatever this provokes is drained by the first negotiation attempt.
    pub async fn wake(&mut self) -> Result<()> {
        self.transport.write_line("").await
    }

    /// Select the configured unit, if any.
    ///
    /// Must run before [`Self::negotiate_prompt`]: selecting a unit can
    /// change the prompt, and a stale marker would never match.
    pub async fn select_unit(&mut self) -> Result<()> {
        if let Some(unit) = self.settings.unit.clone() {
            debug!("Selecting unit {}", unit);
            self.transport.write_line(&format!("::{}", unit)).await?;
            self.transport.drain(self.settings.timeouts.drain).await?;
        }
        Ok(())
    }

    /// Settle the shell at a fresh prompt line
    pub async fn prepare(&mut self) -> Result<()> {
        self.transport.write_line("").await?;
        self.transport.drain(self.settings.timeouts.drain).await?;
        Ok(())
    }

    /// Send `command` and collect everything up to the prompt, verbatim
    pub async fn submit(&mut self, command: &str) -> Result<Vec<u8>> {
        self.transport.write_line(command).await?;

        let output = self
            .transport
            .read_until(self.settings.timeouts.response, self.prompt.marker())
            .await?;

        debug!("Collected {} bytes for '{}'", output.len(), command);
        Ok(output)
    }

    /// Full handshake plus one command, leaving the transport open
    pub async fn execute(&mut self, command: &str) -> Result<Vec<u8>> {
        self.wake().await?;
        self.select_unit().await?;

        let outcome = self.negotiate_prompt().await?;
        if !outcome.is_degraded() {
            self.normalize_prompt();
        }
        self.prepare().await?;
        self.submit(command).await
    }

    /// Full handshake plus one command, then close the transport.
    ///
    /// The transport is closed on every path, including handshake failures.
    pub async fn run(mut self, command: &str) -> Result<Vec<u8>> {
        let result = self.execute(command).await;

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close shell connection: {}", e);
        }

        result
    }
}
