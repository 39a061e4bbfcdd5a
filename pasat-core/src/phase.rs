use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of run a session belongs to.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Practice run over digit pairs, stored as "Addition".
    Demo,
    #[default]
    Pasat,
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Demo => "Addition",
            RunMode::Pasat => "PASAT",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a trial session
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

impl SessionState {
    pub fn allows_input(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }

    pub fn is_active(&self) -> bool {
        self.allows_input()
    }
}
