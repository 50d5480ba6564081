//! Broker-facing service handler
//!
//! The switch's object broker knows this process as the handler for the
//! `base-switch/diag_shell` object. It exposes two capabilities: a read
//! (always declined) and an RPC transaction that carries one command string
//! in and one captured result out. The broker itself lives elsewhere; this
//! module only implements the handler side plus a line-oriented JSON
//! [`bridge`] that an adapter process can speak.

pub mod bridge;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Object key this handler registers for
pub const SERVICE_KEY: &str = "base-switch/diag_shell";

/// Attribute holding the command of an RPC request
pub const COMMAND_ATTR: &str = "base-switch/diag_shell/input/command";

/// Attribute receiving the captured output
pub const RESULT_ATTR: &str = "base-switch/diag_shell/output/result";

/// Attribute name to value
pub type Attributes = BTreeMap<String, String>;

/// Transaction operation kinds the broker can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Set,
    Delete,
    Rpc,
}

/// Read request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub filter: Attributes,
}

/// Transaction request; `data` is updated in place by the handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub operation: Operation,
    #[serde(default)]
    pub data: Attributes,
}

impl TransactionRequest {
    /// RPC request carrying `command`
    pub fn rpc(command: &str) -> Self {
        let mut data = Attributes::new();
        data.insert(COMMAND_ATTR.to_string(), command.to_string());
        Self {
            operation: Operation::Rpc,
            data,
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.data.get(COMMAND_ATTR).map(String::as_str)
    }

    pub fn result(&self) -> Option<&str> {
        self.data.get(RESULT_ATTR).map(String::as_str)
    }
}

/// "Command in, captured output out"
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_command(&self, command: &str) -> Result<String>;
}

/// Callbacks the broker invokes on a registered object
#[async_trait::async_trait]
pub trait ObjectHandler: Send + Sync {
    /// Answer a read; `false` means declined
    async fn get(&self, request: &GetRequest) -> bool;

    /// Apply a transaction; `Ok(false)` or an error fails only this request
    async fn transaction(&self, request: &mut TransactionRequest) -> Result<bool>;
}

/// Handler for the diag shell object
pub struct DiagShellHandler<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> DiagShellHandler<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

#[async_trait::async_trait]
impl<R: CommandRunner> ObjectHandler for DiagShellHandler<R> {
    async fn get(&self, request: &GetRequest) -> bool {
        debug!("Declining read of '{}'", request.key);
        false
    }

    async fn transaction(&self, request: &mut TransactionRequest) -> Result<bool> {
        if request.operation != Operation::Rpc {
            warn!("Invalid operation requested: {:?}", request.operation);
            return Ok(true);
        }

        let Some(command) = request.command().map(str::to_string) else {
            warn!("RPC request without '{}'", COMMAND_ATTR);
            return Ok(false);
        };

        info!("Running diag shell command '{}'", command);
        match self.runner.run_command(&command).await {
            Ok(output) => {
                request.data.insert(RESULT_ATTR.to_string(), output);
                Ok(true)
            }
            Err(e) => {
                // The result attribute is still present, just empty
                error!("Shell command '{}' failed: {}", command, e);
                request.data.insert(RESULT_ATTR.to_string(), String::new());
                Err(e)
            }
        }
    }
}
