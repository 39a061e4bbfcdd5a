//! Errors raised by the session core.
//!
//! Latency overruns and input races are not errors: the pacer clamps the
//! wait and the per-interval latch drops the late answer. Both are only logged.

use thiserror::Error;

use crate::phase::RunMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasatError {
    /// The run stopped before any interval was scored; there is nothing to analyze or store.
    #[error("{mode} run ended before any interval was scored")]
    EmptyResultSet { mode: RunMode },

    /// A finished session cannot be restarted.
    #[error("{mode} session has already finished")]
    SessionFinished { mode: RunMode },
}
