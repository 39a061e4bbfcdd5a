use std::time::Duration;

use crate::gate::PauseGate;
use crate::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    Elapsed,
    Stopped,
}

/// Sleeps `total` in `granularity` steps. Time spent paused does not count
/// toward `total`; a stop ends the wait at the next step boundary.
pub(crate) fn paced_wait<T: Timer>(
    timer: &T,
    gate: Option<&PauseGate>,
    total: Duration,
    granularity: Duration,
) -> WaitOutcome {
    let step = granularity.max(Duration::from_millis(1));
    let mut remaining = total;
    while !remaining.is_zero() {
        if let Some(gate) = gate {
            if !gate.wait_while_paused() {
                return WaitOutcome::Stopped;
            }
        }
        let slice = remaining.min(step);
        timer.sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
    match gate {
        Some(gate) if gate.is_stopped() => WaitOutcome::Stopped,
        _ => WaitOutcome::Elapsed,
    }
}
