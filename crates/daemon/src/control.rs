// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ControlServer`: accepts control-socket connections and forwards each
//! parsed [`devmand_wire::Request`] to the Supervisor loop over a channel -
//! request handling never blocks the accept loop, and the Supervisor (not
//! the listener) is the only thing that mutates scheduler state.

use devmand_wire::{read_message, write_message, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// A request awaiting a reply, handed to the Supervisor loop.
pub struct ControlMessage {
    pub request: Request,
    pub respond_to: oneshot::Sender<Response>,
}

/// Malformed control messages are logged and dropped at the listener - they
/// never reach the Supervisor.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub struct ControlServer {
    listener: UnixListener,
    tx: mpsc::Sender<ControlMessage>,
}

impl ControlServer {
    pub fn new(listener: UnixListener, tx: mpsc::Sender<ControlMessage>) -> Self {
        Self { listener, tx }
    }

    /// Accept connections until the process exits; each connection is
    /// handled on its own task so a slow/stuck client can't stall others.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, tx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!(error = %e, "control socket accept error"),
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, tx: mpsc::Sender<ControlMessage>) -> Result<(), ControlError> {
    let request: Request = read_message(&mut stream).await?;
    debug!(request = ?request, "received control request");

    let (respond_to, response_rx) = oneshot::channel();
    if tx.send(ControlMessage { request, respond_to }).await.is_err() {
        let response = Response::Error { message: "supervisor loop is not accepting requests".to_string() };
        write_message(&mut stream, &response).await?;
        return Ok(());
    }

    let response = match response_rx.await {
        Ok(response) => response,
        Err(_) => Response::Error { message: "supervisor dropped the request".to_string() },
    };
    write_message(&mut stream, &response).await?;
    Ok(())
}

fn log_connection_error(e: ControlError) {
    match e {
        ControlError::Protocol(ProtocolError::Closed) => debug!("control client disconnected"),
        other => warn!(error = %other, "control connection error"),
    }
}
