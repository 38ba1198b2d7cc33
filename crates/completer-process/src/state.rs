//! Process liveness state
//!
//! Liveness is never polled. It moves only on spawn success, an observed
//! exit or an I/O failure reported by the caller. Every transition is tagged
//! with the process generation so an exit from a replaced process cannot
//! touch the current one.

use std::fmt;

/// Lifecycle of the supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Nothing spawned yet, or torn down
    NoProcess,
    /// Resolving and launching a new process
    Starting,
    /// Running with pipes attached
    Alive,
    /// Exited or lost its pipes
    Dead,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::NoProcess => "no-process",
            ProcessState::Starting => "starting",
            ProcessState::Alive => "alive",
            ProcessState::Dead => "dead",
        };
        f.write_str(s)
    }
}

/// State plus the generation it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub state: ProcessState,
    /// Incremented on every spawn attempt
    pub generation: u64,
    pub pid: Option<u32>,
}

impl StateSnapshot {
    pub fn initial() -> Self {
        Self {
            state: ProcessState::NoProcess,
            generation: 0,
            pid: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == ProcessState::Alive
    }

    /// Whether `generation` is the process this snapshot considers running
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
            && matches!(self.state, ProcessState::Starting | ProcessState::Alive)
    }

    pub(crate) fn starting(&mut self, generation: u64) {
        self.state = ProcessState::Starting;
        self.generation = generation;
        self.pid = None;
    }

    pub(crate) fn alive(&mut self, generation: u64, pid: Option<u32>) -> bool {
        if self.generation != generation || self.state != ProcessState::Starting {
            return false;
        }
        self.state = ProcessState::Alive;
        self.pid = pid;
        true
    }

    /// Mark `generation` dead; ignored when a newer process has taken over
    pub(crate) fn observe_exit(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        match self.state {
            ProcessState::Alive | ProcessState::Starting => {
                self.state = ProcessState::Dead;
                true
            }
            ProcessState::NoProcess | ProcessState::Dead => false,
        }
    }

    pub(crate) fn torn_down(&mut self) {
        self.state = ProcessState::NoProcess;
        self.pid = None;
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
