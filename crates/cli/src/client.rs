// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket client: connect, send one length-prefixed-JSON request,
//! read one reply.

use std::path::PathBuf;

use devmand_wire::{read_message, write_message, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::env;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("daemon is not running (no socket at {0})")]
    NotRunning(PathBuf),

    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("daemon rejected request: {0}")]
    Rejected(String),
}

impl ClientError {
    /// True when the daemon is simply not up, as opposed to a real protocol
    /// failure - callers use this to print a friendly "not running" message.
    pub fn is_not_running(&self) -> bool {
        matches!(self, Self::NotRunning(_))
    }
}

pub struct DaemonClient {
    stream: UnixStream,
}

pub struct StatusReport {
    pub workers: usize,
    pub children_max: u32,
    pub queued_events: usize,
    pub stop_exec_queue: bool,
    pub uptime_secs: u64,
}

impl DaemonClient {
    pub async fn connect() -> Result<Self, ClientError> {
        let socket_path = env::state_dir().ok_or(ClientError::NoStateDir)?.join("daemon.sock");
        if !socket_path.exists() {
            return Err(ClientError::NotRunning(socket_path));
        }
        let stream =
            UnixStream::connect(&socket_path).await.map_err(|_| ClientError::NotRunning(socket_path))?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        write_message(&mut self.stream, request).await?;
        Ok(read_message(&mut self.stream).await?)
    }

    pub async fn hello(&mut self) -> Result<String, ClientError> {
        match self.send(&Request::Hello).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn ping(&mut self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn status(&mut self) -> Result<StatusReport, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { workers, children_max, queued_events, stop_exec_queue, uptime_secs } => {
                Ok(StatusReport { workers, children_max, queued_events, stop_exec_queue, uptime_secs })
            }
            other => Self::reject(other),
        }
    }

    pub async fn set_log_level(&mut self, level: i32) -> Result<(), ClientError> {
        self.expect_ack(Request::SetLogLevel { level }).await
    }

    pub async fn set_env(&mut self, entry: String) -> Result<(), ClientError> {
        self.expect_ack(Request::SetEnv { entry }).await
    }

    pub async fn set_children_max(&mut self, value: i32) -> Result<(), ClientError> {
        self.expect_ack(Request::SetChildrenMax { value }).await
    }

    pub async fn reload(&mut self) -> Result<(), ClientError> {
        self.expect_ack(Request::Reload).await
    }

    pub async fn start_exec_queue(&mut self) -> Result<(), ClientError> {
        self.expect_ack(Request::StartExecQueue).await
    }

    pub async fn stop_exec_queue(&mut self) -> Result<(), ClientError> {
        self.expect_ack(Request::StopExecQueue).await
    }

    pub async fn exit(&mut self) -> Result<(), ClientError> {
        self.expect_ack(Request::Exit).await
    }

    async fn expect_ack(&mut self, request: Request) -> Result<(), ClientError> {
        match self.send(&request).await? {
            Response::Ack => Ok(()),
            other => Self::reject(other),
        }
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            other => Err(ClientError::Rejected(format!("unexpected reply: {other:?}"))),
        }
    }
}
