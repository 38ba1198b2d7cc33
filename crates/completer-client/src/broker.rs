//! Request broker
//!
//! Serializes request cycles over the engine's single line channel. A cycle
//! is ensure-alive, write one line, read one line, parse, all under one
//! lock. The cycle runs in its own task holding an owned guard, so a caller
//! that gives up (timeout or dropped future) only stops waiting: the reply
//! is still read and the channel stays aligned for the next request. A cycle
//! whose caller is already gone when it gets the lock sends nothing.
//!
//! The drain itself is bounded by a reply deadline. An engine that has not
//! answered by then is killed and marked dead so the lock is released.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use completer_process::{EngineChannel, ProcessMonitor, ProcessState, ProcessSupervisor};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::{
    error::{ClientError, Result},
    protocol,
};

/// Default caller-side wait per request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on one write/read exchange before the engine is killed
pub const DEFAULT_REPLY_DEADLINE: Duration = Duration::from_secs(30);

/// Shares one engine process between concurrent callers
#[derive(Clone)]
pub struct RequestBroker {
    supervisor: Arc<Mutex<ProcessSupervisor>>,
    monitor: ProcessMonitor,
    timeout: Option<Duration>,
    reply_deadline: Duration,
}

impl RequestBroker {
    pub fn new(supervisor: ProcessSupervisor) -> Self {
        Self {
            monitor: supervisor.monitor(),
            supervisor: Arc::new(Mutex::new(supervisor)),
            timeout: None,
            reply_deadline: DEFAULT_REPLY_DEADLINE,
        }
    }

    /// Bound every [`request`](Self::request) wait by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill an engine that takes longer than `deadline` to answer
    pub fn with_reply_deadline(mut self, deadline: Duration) -> Self {
        self.reply_deadline = deadline;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn reply_deadline(&self) -> Duration {
        self.reply_deadline
    }

    /// Send `payload` wrapped in the `version` envelope and return the reply
    pub async fn request<T: Serialize>(&self, version: &str, payload: &T) -> Result<Value> {
        match self.timeout {
            Some(timeout) => self.request_with_timeout(version, payload, timeout).await,
            None => {
                let reply = self.spawn_cycle(version, payload)?;
                join(reply.await)
            }
        }
    }

    /// Like [`request`](Self::request) with an explicit wait bound.
    ///
    /// On timeout the cycle keeps running and still consumes its reply.
    pub async fn request_with_timeout<T: Serialize>(
        &self,
        version: &str,
        payload: &T,
        timeout: Duration,
    ) -> Result<Value> {
        let reply = self.spawn_cycle(version, payload)?;
        match tokio::time::timeout(timeout, reply).await {
            Ok(received) => join(received),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Engine request timed out, reply will be drained");
                Err(ClientError::Timeout(timeout))
            }
        }
    }

    /// Kill the current process and start a new one; costs one restart.
    ///
    /// A cycle stuck on the current process is cut short first.
    pub async fn respawn(&self) -> Result<()> {
        let mut supervisor = self.take_over().await;
        supervisor
            .respawn()
            .await
            .map_err(ClientError::ProcessUnavailable)
    }

    /// Tear the process down without waiting for it to exit
    pub async fn shutdown(&self) {
        self.take_over().await.shutdown();
    }

    pub fn state(&self) -> ProcessState {
        self.monitor.state()
    }

    pub fn restart_count(&self) -> u32 {
        self.monitor.restart_count()
    }

    /// Lock the supervisor, killing the current process if a cycle holds it
    async fn take_over(&self) -> tokio::sync::MutexGuard<'_, ProcessSupervisor> {
        match self.supervisor.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Supervisor busy, killing current engine to take over");
                self.monitor.kill_current();
                self.supervisor.lock().await
            }
        }
    }

    fn spawn_cycle<T: Serialize>(
        &self,
        version: &str,
        payload: &T,
    ) -> Result<oneshot::Receiver<Result<Value>>> {
        let line = protocol::encode_request(version, payload)?;
        let supervisor = self.supervisor.clone();
        let deadline = self.reply_deadline;
        let (reply_tx, reply_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut guard = supervisor.lock_owned().await;
            if reply_tx.is_closed() {
                debug!("Caller gone before the request was sent, skipping it");
                return;
            }
            let result = run_cycle(&mut guard, &line, deadline).await;
            drop(guard);
            let _ = reply_tx.send(result);
        });
        Ok(reply_rx)
    }
}

fn join(received: std::result::Result<Result<Value>, oneshot::error::RecvError>) -> Result<Value> {
    received.map_err(|_| ClientError::TaskFailed("request task ended without a reply".to_string()))?
}

async fn run_cycle(supervisor: &mut ProcessSupervisor, line: &str, deadline: Duration) -> Result<Value> {
    let channel = supervisor
        .ensure_alive()
        .await
        .map_err(ClientError::ProcessUnavailable)?;

    match tokio::time::timeout(deadline, exchange(channel, line)).await {
        Ok(Ok(reply)) => {
            debug!(request_bytes = line.len(), reply_bytes = reply.len(), "Engine request complete");
            protocol::decode_response(&reply)
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
            // the bad line is consumed; the process stays usable
            warn!(error = %e, "Engine reply is not valid UTF-8");
            Err(ClientError::protocol(format!("reply is not valid UTF-8: {e}")))
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Engine I/O failed");
            supervisor.mark_dead();
            Err(ClientError::RequestFailed(e))
        }
        Err(_) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "Engine did not answer in time, killing it");
            supervisor.mark_dead();
            Err(ClientError::RequestFailed(io::Error::new(
                io::ErrorKind::TimedOut,
                "engine did not answer before the reply deadline",
            )))
        }
    }
}

async fn exchange(channel: &mut EngineChannel, line: &str) -> io::Result<String> {
    channel.send_line(line).await?;
    channel.read_line().await?.ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "engine closed its output")
    })
}
