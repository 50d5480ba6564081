//! Top-level shell client
//!
//! One call, one fresh connection: connect, run the driver, close. Errors
//! stop at this boundary; [`ShellClient::run`] reports them and returns an
//! empty string, which callers cannot tell apart from a command that printed
//! nothing. Use [`ShellClient::try_run`] when the difference matters.

use crate::config::Config;
use crate::driver::{CommandDriver, DriverSettings};
use crate::error::Result;
use crate::service::CommandRunner;
use crate::session::UnixConnection;

/// Runs single commands against the configured shell endpoint
#[derive(Debug, Clone)]
pub struct ShellClient {
    config: Config,
}

impl ShellClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `command` and return the captured output, or the error that
    /// aborted the cycle
    pub async fn try_run(&self, command: &str) -> Result<String> {
        let socket = &self.config.endpoint.socket_path;
        let connection = UnixConnection::connect(socket).await?.with_limits(
            self.config.session.read_chunk_size,
            self.config.session.max_output_bytes,
        );

        let driver = CommandDriver::new(connection, DriverSettings::from(&self.config));
        let output = driver.run(command).await?;

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Run `command`; any failure is logged and yields an empty string
    pub async fn run(&self, command: &str) -> String {
        match self.try_run(command).await {
            Ok(output) => output,
            Err(e) => {
                error!("Shell command '{}' failed: {}", command, e);
                String::new()
            }
        }
    }
}

impl Default for ShellClient {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[async_trait::async_trait]
impl CommandRunner for ShellClient {
    async fn run_command(&self, command: &str) -> Result<String> {
        self.try_run(command).await
    }
}
