// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line server: reads requests, runs each call as its own task, and writes
//! responses through a single writer.

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::protocol::{self, ProtocolError, Request, Response, ToolError, ToolOutcome};
use crate::tools::ToolHandler;

/// Responses waiting for the writer
const RESPONSE_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("response writer stopped unexpectedly")]
    WriterGone,
}

/// One line read from the input
enum Line {
    Complete(String),
    TooLarge(usize),
    Eof,
}

/// Serve requests from `reader` until end of input.
///
/// Calls run concurrently; responses are written as they complete, so
/// clients match them by `id`. Returns the writer once every in-flight call
/// has answered.
pub async fn serve<H, R, W>(
    handler: Arc<H>,
    mut reader: R,
    writer: W,
    max_request_bytes: usize,
) -> Result<W, ServerError>
where
    H: ToolHandler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Response>(RESPONSE_BUFFER);
    let writer_task = tokio::spawn(write_responses(rx, writer));

    loop {
        let line = match read_line_bounded(&mut reader, max_request_bytes).await {
            Ok(Line::Eof) => break,
            Ok(Line::Complete(line)) => line,
            Ok(Line::TooLarge(len)) => {
                warn!(len, max = max_request_bytes, "request too large");
                let rejected = Response::rejected(ProtocolError::TooLarge {
                    len,
                    max: max_request_bytes,
                });
                tx.send(rejected).await.map_err(|_| ServerError::WriterGone)?;
                continue;
            }
            Err(e) => {
                error!("failed to read request: {}", e);
                return Err(e.into());
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match protocol::decode_request(&line, max_request_bytes) {
            Ok(request) => spawn_call(Arc::clone(&handler), request, tx.clone()),
            Err(e) => {
                warn!("rejecting request: {}", e);
                tx.send(Response::rejected(e))
                    .await
                    .map_err(|_| ServerError::WriterGone)?;
            }
        }
    }

    debug!("input closed, draining in-flight calls");
    // Spawned calls hold senders; the writer finishes when the last one answers
    drop(tx);
    match writer_task.await {
        Ok(result) => Ok(result?),
        Err(e) => {
            error!("response writer failed: {}", e);
            Err(ServerError::WriterGone)
        }
    }
}

fn spawn_call<H: ToolHandler>(handler: Arc<H>, request: Request, tx: mpsc::Sender<Response>) {
    tokio::spawn(async move {
        let Request {
            id,
            tool,
            arguments,
        } = request;
        debug!(%id, tool = %tool, "received request");

        let call_tool = tool.clone();
        let call = tokio::spawn(async move { handler.call(&call_tool, arguments).await });
        let outcome = match call.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%id, tool = %tool, "tool call aborted: {}", e);
                ToolOutcome::Err(ToolError::internal(format!(
                    "tool '{}' failed unexpectedly",
                    tool
                )))
            }
        };

        if tx.send(Response::new(id, outcome)).await.is_err() {
            warn!("response dropped: writer stopped");
        }
    });
}

async fn write_responses<W>(mut rx: mpsc::Receiver<Response>, mut writer: W) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let line = match protocol::encode_response(&response) {
            Ok(line) => line,
            Err(e) => {
                error!("failed to encode response: {}", e);
                continue;
            }
        };
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(writer)
}

/// Read one newline-terminated line without buffering more than
/// `max_bytes` of it. An oversized line is consumed and reported.
async fn read_line_bounded<R>(reader: &mut R, max_bytes: usize) -> std::io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let mut line: Vec<u8> = Vec::new();
    let mut total = 0usize;
    let mut seen_any = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            // EOF; a final line without a newline still counts
            return Ok(if !seen_any {
                Line::Eof
            } else if total > max_bytes {
                Line::TooLarge(total)
            } else {
                Line::Complete(String::from_utf8_lossy(&line).into_owned())
            });
        }
        seen_any = true;

        let (chunk, consumed, done) = match available.iter().position(|b| *b == b'\n') {
            Some(pos) => (&available[..pos], pos + 1, true),
            None => (available, available.len(), false),
        };
        total += chunk.len();
        if total <= max_bytes {
            line.extend_from_slice(chunk);
        } else {
            line.clear();
        }
        reader.consume(consumed);

        if done {
            return Ok(if total > max_bytes {
                Line::TooLarge(total)
            } else {
                Line::Complete(String::from_utf8_lossy(&line).into_owned())
            });
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
