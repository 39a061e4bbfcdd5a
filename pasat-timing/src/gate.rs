use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    paused: bool,
    stopped: bool,
}

/// Pause and stop signals shared between a run's activities.
///
/// Both signals are idempotent. Stop is terminal: once stopped the gate never
/// pauses or resumes again, and every waiter is released.
#[derive(Debug, Default)]
pub struct PauseGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the gate went from running to paused.
    pub fn pause(&self) -> bool {
        let mut state = self.state.lock();
        if state.stopped || state.paused {
            return false;
        }
        state.paused = true;
        true
    }

    /// Returns `true` if the gate went from paused to running.
    pub fn resume(&self) -> bool {
        let mut state = self.state.lock();
        if state.stopped || !state.paused {
            return false;
        }
        state.paused = false;
        self.changed.notify_all();
        true
    }

    /// Returns `true` on the first call only.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if state.stopped {
            return false;
        }
        state.stopped = true;
        state.paused = false;
        self.changed.notify_all();
        true
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Blocks while paused. Returns `false` once the gate is stopped.
    pub fn wait_while_paused(&self) -> bool {
        let mut state = self.state.lock();
        while state.paused && !state.stopped {
            self.changed.wait(&mut state);
        }
        !state.stopped
    }
}
