//! Drives one run: pacer and elapsed-time threads on one side, the session on
//! the other, joined by a single mailbox.
//!
//! Everything the session reacts to (presentations, timer ticks, user input)
//! arrives through the same channel and is handled one message at a time, so
//! the pending answer of interval k is always flushed before stimulus k + 1
//! reaches the session.

use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use pasat_core::{PresentationEvent, ResponseRecord, RunMode, Stimulus};
use pasat_timing::{
    ElapsedTick, ElapsedTimeReporter, EventSink, PacedScheduler, PacerEvent, PacingStats,
    PauseGate, Renderer, Timer, DEFAULT_GRANULARITY,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::session::{RunOutcome, TrialSession};

const WATCHDOG: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("pacer thread panicked")]
    PacerPanicked,

    #[error("session was not idle: {0}")]
    Session(#[from] pasat_core::PasatError),

    #[error("failed to write run report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("failed to create {}: {source}", path.display())]
    ReportFile {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
}

/// User input, as forwarded by whatever front end collects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Digit(char),
    Backspace,
    /// Submit the typed answer.
    Confirm,
    /// Submit a complete answer at once, e.g. from an answer button.
    Answer(String),
    Pause,
    Resume,
    Stop,
}

#[derive(Debug)]
pub enum SessionMessage<S> {
    Pacer(PacerEvent<S>),
    Tick(ElapsedTick),
    Input(InputCommand),
}

impl<S> From<PacerEvent<S>> for SessionMessage<S> {
    fn from(event: PacerEvent<S>) -> Self {
        SessionMessage::Pacer(event)
    }
}

impl<S> From<ElapsedTick> for SessionMessage<S> {
    fn from(tick: ElapsedTick) -> Self {
        SessionMessage::Tick(tick)
    }
}

impl<S> From<InputCommand> for SessionMessage<S> {
    fn from(command: InputCommand) -> Self {
        SessionMessage::Input(command)
    }
}

/// Display side of a run. Every hook is a notification; none feeds back into the run.
pub trait RunObserver<S> {
    fn on_presented(&mut self, _event: &PresentationEvent<S>) {}
    fn on_elapsed(&mut self, _elapsed: Duration) {}
    fn on_typed(&mut self, _typed: &str) {}
    fn on_scored(&mut self, _record: &ResponseRecord) {}
    fn on_paused(&mut self) {}
    fn on_resumed(&mut self) {}
    fn on_finished(&mut self, _report: &RunReport) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl<S> RunObserver<S> for NoopObserver {}

/// Cloneable handle for posting user input into a run.
#[derive(Clone)]
pub struct RunController {
    sink: Arc<dyn EventSink<InputCommand> + Sync>,
}

impl RunController {
    /// Returns `false` once the run is over.
    pub fn send(&self, command: InputCommand) -> bool {
        self.sink.deliver(command)
    }

    pub fn answer(&self, answer: impl Into<String>) -> bool {
        self.send(InputCommand::Answer(answer.into()))
    }

    pub fn pause(&self) -> bool {
        self.send(InputCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(InputCommand::Resume)
    }

    pub fn stop(&self) -> bool {
        self.send(InputCommand::Stop)
    }
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    #[serde(skip)]
    pub pacing: PacingStats,
}

impl RunReport {
    pub fn mode(&self) -> RunMode {
        self.outcome.results.mode()
    }

    /// Writes the outcome as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), RunError> {
        let file = std::fs::File::create(path).map_err(|source| RunError::ReportFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(file, &self.outcome)?;
        Ok(())
    }
}

pub struct TrialRunner<S: Stimulus, T: Timer, R> {
    session: TrialSession<S, T>,
    sequence: Vec<S>,
    interval: Duration,
    granularity: Duration,
    show_timer: bool,
    timer: T,
    renderer: R,
    gate: Arc<PauseGate>,
    tx: Sender<SessionMessage<S>>,
    rx: Receiver<SessionMessage<S>>,
}

impl<S, T, R> TrialRunner<S, T, R>
where
    S: Stimulus,
    T: Timer,
    R: Renderer<S> + 'static,
{
    pub fn new(mode: RunMode, sequence: Vec<S>, interval: Duration, timer: T, renderer: R) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session: TrialSession::new(mode, timer.clone(), sequence.len()),
            sequence,
            interval,
            granularity: DEFAULT_GRANULARITY,
            show_timer: false,
            timer,
            renderer,
            gate: Arc::new(PauseGate::new()),
            tx,
            rx,
        }
    }

    /// Interval, poll step and timer visibility come from `config`.
    pub fn from_config(
        mode: RunMode,
        sequence: Vec<S>,
        config: &SessionConfig,
        timer: T,
        renderer: R,
    ) -> Self {
        Self::new(mode, sequence, config.interval(), timer, renderer)
            .with_granularity(config.granularity())
            .with_timer_display(config.show_timer)
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_timer_display(mut self, show: bool) -> Self {
        self.show_timer = show;
        self
    }

    /// Shares an existing gate, e.g. one a renderer also holds.
    pub fn with_gate(mut self, gate: Arc<PauseGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn controller(&self) -> RunController {
        RunController {
            sink: Arc::new(self.tx.clone()),
        }
    }

    /// The run's pause/stop signals.
    pub fn gate(&self) -> Arc<PauseGate> {
        Arc::clone(&self.gate)
    }

    /// Blocks until the run has finished.
    pub fn run<O: RunObserver<S>>(self, observer: &mut O) -> Result<RunReport, RunError> {
        let Self {
            mut session,
            sequence,
            interval,
            granularity,
            show_timer,
            timer,
            renderer,
            gate,
            tx,
            rx,
        } = self;

        session.start()?;
        let total = interval * sequence.len() as u32;

        let pacer = PacedScheduler::new(sequence, interval, timer.clone(), renderer)
            .with_granularity(granularity)
            .with_gate(Arc::clone(&gate))
            .spawn(tx.clone())
            .map_err(|source| RunError::Spawn {
                what: "pacer",
                source,
            })?;

        let ticker = if show_timer {
            let handle = ElapsedTimeReporter::new(total, timer.passive())
                .with_granularity(granularity)
                .with_gate(Arc::clone(&gate))
                .spawn(tx.clone())
                .map_err(|source| RunError::Spawn {
                    what: "elapsed-time",
                    source,
                });
            match handle {
                Ok(handle) => Some(handle),
                Err(err) => {
                    gate.stop();
                    let _ = pacer.join();
                    return Err(err);
                }
            }
        } else {
            None
        };
        drop(tx);

        let mut outcome = None;
        let mut pacing = None;
        while outcome.is_none() || pacing.is_none() {
            let message = match rx.recv_timeout(WATCHDOG) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => {
                    if pacer.is_finished() && pacing.is_none() {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };

            match message {
                SessionMessage::Pacer(PacerEvent::Presented(event)) => {
                    let step = session.on_presentation(event);
                    if let Some(record) = &step.flushed {
                        observer.on_scored(record);
                    }
                    if !event.is_terminal() {
                        observer.on_presented(&event);
                    }
                    if step.finished.is_some() {
                        outcome = step.finished;
                    }
                }
                SessionMessage::Pacer(PacerEvent::Finished(stats)) => pacing = Some(stats),
                SessionMessage::Tick(tick) => observer.on_elapsed(tick.elapsed),
                SessionMessage::Input(command) => {
                    handle_input(&mut session, &gate, observer, command)
                }
            }
        }

        let joined = pacer.join();
        gate.stop();
        if let Some(ticker) = ticker {
            if ticker.join().is_err() {
                warn!("elapsed-time thread panicked");
            }
        }
        let stats = joined.map_err(|_| RunError::PacerPanicked)?;
        let Some(outcome) = outcome else {
            return Err(RunError::PacerPanicked);
        };

        let report = RunReport {
            outcome,
            pacing: pacing.unwrap_or(stats),
        };
        info!(
            mode = %report.mode(),
            scored = report.outcome.results.len(),
            overruns = report.pacing.overruns,
            "run complete"
        );
        observer.on_finished(&report);
        Ok(report)
    }
}

fn handle_input<S, T, O>(
    session: &mut TrialSession<S, T>,
    gate: &PauseGate,
    observer: &mut O,
    command: InputCommand,
) where
    S: Stimulus,
    T: Timer,
    O: RunObserver<S>,
{
    match command {
        InputCommand::Digit(c) => {
            if session.type_digit(c) {
                observer.on_typed(session.typed_answer());
            }
        }
        InputCommand::Backspace => {
            if session.backspace() {
                observer.on_typed(session.typed_answer());
            }
        }
        InputCommand::Confirm => {
            if let Some(record) = session.confirm_typed() {
                observer.on_scored(&record);
            }
        }
        InputCommand::Answer(answer) => {
            if let Some(record) = session.submit_answer(&answer) {
                observer.on_scored(&record);
            }
        }
        InputCommand::Pause => {
            if session.pause() && gate.pause() {
                observer.on_paused();
            }
        }
        InputCommand::Resume => {
            if session.resume() && gate.resume() {
                observer.on_resumed();
            }
        }
        InputCommand::Stop => {
            if gate.stop() {
                debug!(presented = session.presented(), "stop requested");
            }
        }
    }
}
