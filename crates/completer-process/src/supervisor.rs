//! Engine process supervisor
//!
//! Owns at most one engine process and restarts it on demand after death.
//! Every spawn attempt, successful or not, consumes one unit of a restart
//! budget that is never replenished. Once the budget is spent, no further
//! process is started and callers get [`ProcessError::Unavailable`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    child::{EngineChannel, ManagedChild},
    config::{BinarySource, SupervisorConfig},
    error::{ProcessError, Result},
    state::{ProcessState, StateSnapshot},
};

/// Single-process supervisor with a bounded restart budget
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    state: Arc<watch::Sender<StateSnapshot>>,
    child: Option<ManagedChild>,
    channel: Option<EngineChannel>,
    restarts: u32,
    generation: u64,
}

impl ProcessSupervisor {
    pub fn new(config: SupervisorConfig) -> Result<Self> {
        config.validate()?;
        let (state, _) = watch::channel(StateSnapshot::initial());
        Ok(Self {
            config,
            state: Arc::new(state),
            child: None,
            channel: None,
            restarts: 0,
            generation: 0,
        })
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn state(&self) -> ProcessState {
        self.state.borrow().state
    }

    /// Observe state transitions, including exits seen by the watcher
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.state.subscribe()
    }

    /// Handle that reads state and kills the current process without
    /// borrowing the supervisor
    pub fn monitor(&self) -> ProcessMonitor {
        ProcessMonitor {
            state: self.state.clone(),
        }
    }

    /// Spawn attempts made so far
    pub fn restart_count(&self) -> u32 {
        self.restarts
    }

    pub fn pid(&self) -> Option<u32> {
        self.state.borrow().pid
    }

    /// Whether the restart budget is spent
    pub fn is_exhausted(&self) -> bool {
        self.restarts >= self.config.max_restarts
    }

    /// Return the live channel, starting a process first if needed
    pub async fn ensure_alive(&mut self) -> Result<&mut EngineChannel> {
        if !(self.state.borrow().is_alive() && self.channel.is_some()) {
            self.start()?;
        }
        self.channel
            .as_mut()
            .ok_or(ProcessError::Unavailable { restarts: self.restarts })
    }

    /// Record an I/O failure or end of stream on the current process
    pub fn mark_dead(&mut self) {
        let generation = self.generation;
        if self
            .state
            .send_if_modified(|snapshot| snapshot.observe_exit(generation))
        {
            warn!(generation, "Engine process marked dead");
        }
        self.release_current();
    }

    /// Replace the current process with a fresh one
    pub async fn respawn(&mut self) -> Result<()> {
        info!(generation = self.generation, "Forcing engine respawn");
        self.release_current();
        self.start()
    }

    /// Kill the process without waiting for it and forget it
    pub fn shutdown(&mut self) {
        self.release_current();
        self.state.send_modify(StateSnapshot::torn_down);
    }

    fn release_current(&mut self) {
        self.channel = None;
        if let Some(child) = self.child.take() {
            child.kill();
        }
    }

    fn start(&mut self) -> Result<()> {
        self.release_current();

        if self.is_exhausted() {
            error!(
                restarts = self.restarts,
                max = self.config.max_restarts,
                "Engine restart limit reached"
            );
            return Err(ProcessError::Unavailable {
                restarts: self.restarts,
            });
        }

        self.restarts += 1;
        self.generation += 1;
        let generation = self.generation;
        self.state.send_modify(|snapshot| snapshot.starting(generation));

        match self.launch(generation) {
            Ok((child, channel)) => {
                let pid = child.pid();
                self.child = Some(child);
                self.channel = Some(channel);
                self.state
                    .send_if_modified(|snapshot| snapshot.alive(generation, pid));
                Ok(())
            }
            Err(e) => {
                warn!(
                    attempt = self.restarts,
                    max = self.config.max_restarts,
                    error = %e,
                    "Engine start failed"
                );
                self.state
                    .send_if_modified(|snapshot| snapshot.observe_exit(generation));
                Err(e)
            }
        }
    }

    fn launch(&self, generation: u64) -> Result<(ManagedChild, EngineChannel)> {
        let command = self.resolve_binary()?;
        let config = self.config.process_config(command);
        ManagedChild::spawn(&config, generation, self.state.clone())
    }

    /// Executable to launch for the next attempt
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        match &self.config.source {
            BinarySource::Explicit(path) => Ok(path.clone()),
            BinarySource::Installed(versions) => {
                let binary = versions.resolve()?;
                debug!(version = %binary.version, path = %binary.path.display(), "Using installed engine");
                Ok(binary.path)
            }
        }
    }
}

/// Out-of-band view of a [`ProcessSupervisor`].
///
/// Usable while another task holds the supervisor, e.g. a request cycle
/// blocked on a reply that never comes.
#[derive(Clone)]
pub struct ProcessMonitor {
    state: Arc<watch::Sender<StateSnapshot>>,
}

impl ProcessMonitor {
    pub fn snapshot(&self) -> StateSnapshot {
        *self.state.borrow()
    }

    pub fn state(&self) -> ProcessState {
        self.state.borrow().state
    }

    /// Spawn attempts so far; every attempt opens a new generation
    pub fn restart_count(&self) -> u32 {
        u32::try_from(self.state.borrow().generation).unwrap_or(u32::MAX)
    }

    /// Mark the current process dead. Its watcher then kills it, which ends
    /// any read blocked on its output. Returns whether a live process was hit.
    pub fn kill_current(&self) -> bool {
        let killed = self.state.send_if_modified(|snapshot| {
            let generation = snapshot.generation;
            snapshot.observe_exit(generation)
        });
        if killed {
            warn!(generation = self.state.borrow().generation, "Engine process killed out of band");
        }
        killed
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.release_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use completer_install::{Arch, Platform, TargetTriple, VersionDirectory};

    fn missing_binary(max: u32) -> ProcessSupervisor {
        let config = SupervisorConfig::new(BinarySource::Explicit(
            "/nonexistent/completer/engine".into(),
        ))
        .max_restarts(max);
        ProcessSupervisor::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_spawn_failures_consume_budget() {
        let mut supervisor = missing_binary(3);
        for attempt in 1..=3 {
            let err = supervisor.ensure_alive().await.err().unwrap();
            assert!(matches!(err, ProcessError::SpawnFailed { .. }));
            assert_eq!(supervisor.restart_count(), attempt);
            assert_eq!(supervisor.state(), ProcessState::Dead);
        }

        let err = supervisor.ensure_alive().await.err().unwrap();
        assert!(matches!(err, ProcessError::Unavailable { restarts: 3 }));
        assert_eq!(supervisor.restart_count(), 3);
        assert!(supervisor.is_exhausted());
    }

    #[tokio::test]
    async fn test_resolution_failure_consumes_budget() {
        let root = tempfile::tempdir().unwrap();
        let versions = VersionDirectory::new(
            root.path(),
            TargetTriple::new(Arch::X86_64, Platform::LinuxMusl),
            "TabNine",
        );
        let mut supervisor =
            ProcessSupervisor::new(SupervisorConfig::new(BinarySource::Installed(versions)))
                .unwrap();

        let err = supervisor.ensure_alive().await.err().unwrap();
        assert!(matches!(err, ProcessError::Resolve(_)));
        assert_eq!(supervisor.restart_count(), 1);
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let config = SupervisorConfig::new(BinarySource::Explicit("/x".into())).max_restarts(0);
        assert!(matches!(
            ProcessSupervisor::new(config),
            Err(ProcessError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_monitor_mirrors_supervisor() {
        let mut supervisor = missing_binary(5);
        let monitor = supervisor.monitor();
        let _ = supervisor.ensure_alive().await;
        let _ = supervisor.ensure_alive().await;

        assert_eq!(monitor.restart_count(), supervisor.restart_count());
        assert_eq!(monitor.state(), ProcessState::Dead);
        assert!(!monitor.kill_current());
    }

    #[test]
    fn test_initial_state() {
        let supervisor = missing_binary(10);
        assert_eq!(supervisor.state(), ProcessState::NoProcess);
        assert_eq!(supervisor.restart_count(), 0);
        assert_eq!(supervisor.pid(), None);
    }
}
