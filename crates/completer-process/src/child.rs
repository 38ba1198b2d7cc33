//! Engine child process and its line channel
//!
//! A spawned engine is split in two. The [`Child`] itself moves into a
//! watcher task that waits for exit, a kill signal, or for its generation to
//! stop being current in the shared state (marked dead, torn down or
//! replaced). The stdio pipes become an [`EngineChannel`] handed to the
//! supervisor.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::{
    config::ProcessConfig,
    error::{ProcessError, Result},
    state::StateSnapshot,
};

/// Duplex line channel over the engine's stdin/stdout
pub struct EngineChannel {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl EngineChannel {
    fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            stdin,
            stdout: BufReader::new(stdout).lines(),
        }
    }

    /// Write `line` followed by a newline and flush
    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    /// Next line from stdout; `None` at end of stream.
    ///
    /// A line that is not UTF-8 fails with [`io::ErrorKind::InvalidData`]
    /// after it has been consumed, so the stream stays aligned.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.stdout.next_line().await
    }
}

/// Handle to a running engine process
///
/// Dropping the handle kills the process.
pub struct ManagedChild {
    pid: Option<u32>,
    generation: u64,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ManagedChild {
    /// Spawn the process and start its exit watcher.
    ///
    /// Exits are reported into `state` tagged with `generation`.
    pub(crate) fn spawn(
        config: &ProcessConfig,
        generation: u64,
        state: Arc<watch::Sender<StateSnapshot>>,
    ) -> Result<(Self, EngineChannel)> {
        debug!(
            command = %config.command.display(),
            args = ?config.args,
            generation,
            "Spawning engine process"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ProcessError::spawn_failed(&config.command, e))?;

        let stdin = child.stdin.take().ok_or(ProcessError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::MissingPipe("stdout"))?;
        let pid = child.id();

        info!(pid = ?pid, command = %config.command.display(), generation, "Engine process spawned");

        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(watch_exit(child, pid, generation, kill_rx, state));

        Ok((
            Self {
                pid,
                generation,
                kill_tx: Some(kill_tx),
            },
            EngineChannel::new(stdin, stdout),
        ))
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal the kill and return without waiting for the exit
    pub fn kill(mut self) {
        if let Some(tx) = self.kill_tx.take() {
            debug!(pid = ?self.pid, generation = self.generation, "Killing engine process");
            let _ = tx.send(());
        }
    }
}

async fn watch_exit(
    mut child: Child,
    pid: Option<u32>,
    generation: u64,
    kill_rx: oneshot::Receiver<()>,
    state: Arc<watch::Sender<StateSnapshot>>,
) {
    let exited: Option<io::Result<ExitStatus>> = tokio::select! {
        status = child.wait() => Some(status),
        _ = kill_rx => None,
        _ = superseded(state.subscribe(), generation) => None,
    };

    match exited {
        Some(Ok(status)) => warn!(pid = ?pid, generation, %status, "Engine process exited"),
        Some(Err(e)) => warn!(pid = ?pid, generation, error = %e, "Failed waiting on engine process"),
        None => {
            if let Err(e) = child.start_kill() {
                debug!(pid = ?pid, error = %e, "Kill signal not delivered");
            }
            // reap
            let _ = child.wait().await;
            debug!(pid = ?pid, generation, "Engine process killed");
        }
    }

    state.send_if_modified(|snapshot| snapshot.observe_exit(generation));
}

/// Resolves once `generation` is no longer the current process
async fn superseded(mut observed: watch::Receiver<StateSnapshot>, generation: u64) {
    let _ = observed
        .wait_for(|snapshot| !snapshot.is_current(generation))
        .await;
}
