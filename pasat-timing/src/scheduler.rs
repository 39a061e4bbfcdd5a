//! Fixed-cadence stimulus presentation.
//!
//! For every stimulus the pacer timestamps the start, notifies its sink, renders
//! the stimulus and then waits out whatever is left of the interval. The
//! notification goes out before rendering so reaction times are measured from
//! the moment presentation starts, independent of clip length.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pasat_core::{PresentationEvent, Stimulus};
use tracing::{debug, info, warn};

use crate::gate::PauseGate;
use crate::render::Renderer;
use crate::sink::EventSink;
use crate::stats::{PacingStats, RenderSamples};
use crate::timer::Timer;
use crate::wait::{paced_wait, WaitOutcome};

pub const DEFAULT_GRANULARITY: Duration = Duration::from_millis(10);

/// What the pacer reports to its sink.
#[derive(Debug, Clone, PartialEq)]
pub enum PacerEvent<S> {
    Presented(PresentationEvent<S>),
    /// Sent once, after the terminal presentation. The pacer is halted for good.
    Finished(PacingStats),
}

pub struct PacedScheduler<S, T, R> {
    sequence: Vec<S>,
    interval: Duration,
    granularity: Duration,
    timer: T,
    renderer: R,
    gate: Arc<PauseGate>,
    samples: RenderSamples,
}

impl<S, T, R> PacedScheduler<S, T, R>
where
    S: Stimulus,
    T: Timer,
    R: Renderer<S> + 'static,
{
    pub fn new(sequence: Vec<S>, interval: Duration, timer: T, renderer: R) -> Self {
        let samples = RenderSamples::new(sequence.len().max(1));
        Self {
            sequence,
            interval,
            granularity: DEFAULT_GRANULARITY,
            timer,
            renderer,
            gate: Arc::new(PauseGate::new()),
            samples,
        }
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity;
        self
    }

    /// Shares pause/stop signals with other activities of the same run.
    pub fn with_gate(mut self, gate: Arc<PauseGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> Arc<PauseGate> {
        Arc::clone(&self.gate)
    }

    /// Presents the whole sequence on the calling thread.
    pub fn run<K: EventSink<PacerEvent<S>>>(mut self, sink: K) -> PacingStats {
        let sequence = std::mem::take(&mut self.sequence);
        let total = sequence.len();
        info!(
            stimuli = total,
            interval_ms = self.interval.as_millis() as u64,
            "pacer started"
        );

        for (index, stimulus) in sequence.into_iter().enumerate() {
            if !self.gate.wait_while_paused() {
                break;
            }

            let t0 = self.timer.now();
            if !sink.deliver(PacerEvent::Presented(PresentationEvent::new(stimulus, t0))) {
                debug!(index, "listener gone, halting pacer");
                self.gate.stop();
                break;
            }

            if let Err(err) = self.renderer.render(&stimulus) {
                warn!(index, %err, "rendering failed, keeping pace");
            }
            let render = self.timer.elapsed(t0);
            self.samples.record(render);

            let wait = match self.interval.checked_sub(render) {
                Some(wait) => wait,
                None => {
                    self.samples.overrun();
                    warn!(
                        index,
                        render_ms = render.as_millis() as u64,
                        interval_ms = self.interval.as_millis() as u64,
                        "latency overrun, presenting next stimulus immediately"
                    );
                    Duration::ZERO
                }
            };

            if paced_wait(&self.timer, Some(&self.gate), wait, self.granularity)
                == WaitOutcome::Stopped
            {
                info!(presented = index + 1, total, "stop requested, aborting sequence");
                break;
            }
        }

        self.finish(&sink)
    }

    /// Runs the pacer on its own thread.
    pub fn spawn<K>(self, sink: K) -> io::Result<JoinHandle<PacingStats>>
    where
        K: EventSink<PacerEvent<S>> + 'static,
    {
        thread::Builder::new()
            .name("pasat-pacer".into())
            .spawn(move || self.run(sink))
    }

    fn finish<K: EventSink<PacerEvent<S>>>(&mut self, sink: &K) -> PacingStats {
        sink.deliver(PacerEvent::Presented(PresentationEvent::terminal(
            self.timer.now(),
        )));
        self.gate.stop();
        let stats = self.samples.stats();
        debug!(
            presented = stats.presented,
            overruns = stats.overruns,
            mean_render_ms = stats.mean_render_ns / 1_000_000.0,
            "pacer finished"
        );
        sink.deliver(PacerEvent::Finished(stats.clone()));
        stats
    }
}
