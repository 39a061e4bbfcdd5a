use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::gate::PauseGate;
use crate::scheduler::DEFAULT_GRANULARITY;
use crate::sink::EventSink;
use crate::timer::Timer;
use crate::wait::{paced_wait, WaitOutcome};

pub const TICK: Duration = Duration::from_millis(100);

/// Display-only notification of the time spent in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTick {
    pub elapsed: Duration,
}

/// Counts up to a total duration in 0.1 s ticks. Knows nothing about stimuli.
pub struct ElapsedTimeReporter<T> {
    total: Duration,
    tick: Duration,
    granularity: Duration,
    timer: T,
    gate: Option<Arc<PauseGate>>,
}

impl<T: Timer> ElapsedTimeReporter<T> {
    pub fn new(total: Duration, timer: T) -> Self {
        Self {
            total,
            tick: TICK,
            granularity: DEFAULT_GRANULARITY,
            timer,
            gate: None,
        }
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity;
        self
    }

    /// Follows the pause/stop signals of the run it reports on.
    pub fn with_gate(mut self, gate: Arc<PauseGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Returns the number of ticks delivered.
    pub fn run<K: EventSink<ElapsedTick>>(self, sink: K) -> usize {
        let mut elapsed = Duration::ZERO;
        let mut ticks = 0;
        while elapsed + self.tick <= self.total {
            let outcome = paced_wait(
                &self.timer,
                self.gate.as_deref(),
                self.tick,
                self.granularity,
            );
            if outcome == WaitOutcome::Stopped {
                break;
            }
            elapsed += self.tick;
            if !sink.deliver(ElapsedTick { elapsed }) {
                break;
            }
            ticks += 1;
        }
        ticks
    }

    pub fn spawn<K>(self, sink: K) -> io::Result<JoinHandle<usize>>
    where
        K: EventSink<ElapsedTick> + 'static,
    {
        thread::Builder::new()
            .name("pasat-elapsed".into())
            .spawn(move || self.run(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;
    use std::sync::mpsc;

    #[test]
    fn ticks_every_tenth_until_total() {
        let (tx, rx) = mpsc::channel::<ElapsedTick>();
        let ticks = ElapsedTimeReporter::new(Duration::from_secs(1), ManualTimer::new()).run(tx);
        let seen: Vec<_> = rx.iter().map(|t| t.elapsed).collect();
        assert_eq!(ticks, 10);
        assert_eq!(seen.first(), Some(&Duration::from_millis(100)));
        assert_eq!(seen.last(), Some(&Duration::from_secs(1)));
    }

    #[test]
    fn stopped_gate_silences_reporter() {
        let gate = Arc::new(PauseGate::new());
        gate.stop();
        let (tx, rx) = mpsc::channel::<ElapsedTick>();
        let ticks = ElapsedTimeReporter::new(Duration::from_secs(30), ManualTimer::new())
            .with_gate(gate)
            .run(tx);
        assert_eq!(ticks, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn paused_gate_holds_back_ticks_until_resume() {
        let gate = Arc::new(PauseGate::new());
        assert!(gate.pause());
        let timer = ManualTimer::new();
        let (tx, rx) = mpsc::channel::<ElapsedTick>();
        let reporter = ElapsedTimeReporter::new(Duration::from_secs(1), timer.clone())
            .with_gate(Arc::clone(&gate));
        let handle = thread::spawn(move || reporter.run(tx));

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(timer.now(), 0);

        assert!(gate.resume());
        assert_eq!(handle.join().unwrap(), 10);
        let seen: Vec<_> = rx.iter().map(|t| t.elapsed).collect();
        assert_eq!(seen.len(), 10);
        assert_eq!(seen.last(), Some(&Duration::from_secs(1)));
    }
}
