//! Newline-delimited JSON bridge to the object broker
//!
//! Each input line is one request:
//!
//! ```text
//! {"type":"get","key":"base-switch/diag_shell"}
//! {"type":"transaction","operation":"rpc","data":{"base-switch/diag_shell/input/command":"show version"}}
//! ```
//!
//! and gets exactly one response line, `{"ok":true,"data":{...}}` or
//! `{"ok":false,"error":"..."}`. A bad line fails only itself.

use super::{Attributes, GetRequest, ObjectHandler, TransactionRequest};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One request from the broker adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BridgeRequest {
    Get(GetRequest),
    Transaction(TransactionRequest),
}

/// One response to the broker adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    fn failure(error: &Error) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Counters for one `serve` session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub requests: u64,
    pub failures: u64,
}

/// Decode and dispatch a single request line
pub async fn handle_line<H: ObjectHandler + ?Sized>(handler: &H, line: &str) -> BridgeResponse {
    let request: BridgeRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            let err = Error::InvalidRequest {
                reason: e.to_string(),
            };
            warn!("{}", err);
            return BridgeResponse::failure(&err);
        }
    };

    match request {
        BridgeRequest::Get(get) => BridgeResponse {
            ok: handler.get(&get).await,
            data: None,
            error: None,
        },
        BridgeRequest::Transaction(mut transaction) => {
            let (ok, error) = match handler.transaction(&mut transaction).await {
                Ok(ok) => (ok, None),
                Err(e) => (false, Some(e.to_string())),
            };
            BridgeResponse {
                ok,
                data: Some(transaction.data),
                error,
            }
        }
    }
}

/// Decode one raw input line; the line terminator is already stripped
fn decode_line(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|e| Error::InvalidRequest {
        reason: format!("request is not valid UTF-8: {}", e),
    })
}

/// Answer requests from `reader` on `writer` until end of input.
///
/// Only I/O failures on the streams themselves end the loop.
pub async fn serve<R, W, H>(mut reader: R, mut writer: W, handler: &H) -> Result<ServeStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: ObjectHandler + ?Sized,
{
    let mut stats = ServeStats::default();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            break;
        }
        while matches!(raw.last(), Some(b'\n') | Some(b'\r')) {
            raw.pop();
        }

        let response = match decode_line(&raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(handler, line).await,
            Err(err) => {
                warn!("{}", err);
                BridgeResponse::failure(&err)
            }
        };

        stats.requests += 1;
        if !response.ok {
            stats.failures += 1;
        }

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    info!(
        "Broker input closed after {} request(s), {} failed",
        stats.requests, stats.failures
    );
    Ok(stats)
}
