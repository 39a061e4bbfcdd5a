use pasat_core::{
    PasatError, PresentationEvent, ResponseRecord, ResultSet, RunMode, SessionState, Stimulus,
};
use pasat_timing::Timer;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{self, FatigabilityStats};
use crate::scorer;

/// Longest answer the keyboard path accepts; sums never exceed 20.
pub const MAX_TYPED_DIGITS: usize = 2;

/// A finished run: its scored intervals and, when there are any, their statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub results: ResultSet,
    pub stats: Option<FatigabilityStats>,
}

impl RunOutcome {
    /// Fails with [`PasatError::EmptyResultSet`] when nothing was scored.
    pub fn stats(&self) -> Result<&FatigabilityStats, PasatError> {
        self.stats.as_ref().ok_or(PasatError::EmptyResultSet {
            mode: self.results.mode(),
        })
    }
}

/// What handling one presentation produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresentationStep {
    /// The pending answer of the previous interval, scored at the boundary.
    pub flushed: Option<ResponseRecord>,
    /// Set by the terminal event.
    pub finished: Option<RunOutcome>,
}

/// Pairs answers with the stimuli that triggered them for one run.
///
/// The session only reacts: presentation events come from the pacer and
/// answers from the input layer, both in arrival order.
pub struct TrialSession<S: Stimulus, T: Timer> {
    mode: RunMode,
    state: SessionState,
    timer: T,
    planned: usize,
    presented: usize,
    previous: Option<S>,
    current: Option<S>,
    typed_answer: String,
    submitted_this_interval: bool,
    allow_answer: bool,
    presented_at: u64,
    records: Vec<ResponseRecord>,
}

impl<S: Stimulus, T: Timer> TrialSession<S, T> {
    /// `planned` is the length of the sequence the run will present.
    pub fn new(mode: RunMode, timer: T, planned: usize) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            timer,
            planned,
            presented: 0,
            previous: None,
            current: None,
            typed_answer: String::new(),
            submitted_this_interval: false,
            allow_answer: false,
            presented_at: 0,
            records: Vec::with_capacity(planned),
        }
    }

    /// Returns `Ok(false)` when the run is already under way.
    pub fn start(&mut self) -> Result<bool, PasatError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Running;
                info!(mode = %self.mode, planned = self.planned, "session started");
                Ok(true)
            }
            SessionState::Running | SessionState::Paused => {
                debug!(mode = %self.mode, "start ignored, run already active");
                Ok(false)
            }
            SessionState::Finished => Err(PasatError::SessionFinished { mode: self.mode }),
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.state = SessionState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != SessionState::Paused {
            return false;
        }
        self.state = SessionState::Running;
        true
    }

    /// Advances the session to a newly presented stimulus.
    pub fn on_presentation(&mut self, event: PresentationEvent<S>) -> PresentationStep {
        if !self.state.is_active() {
            debug!(state = ?self.state, "presentation ignored outside an active run");
            return PresentationStep::default();
        }

        let mut step = PresentationStep::default();
        if self.allow_answer && !self.submitted_this_interval {
            let pending = std::mem::take(&mut self.typed_answer);
            step.flushed = Some(self.score(&pending));
        }

        self.typed_answer.clear();
        self.submitted_this_interval = false;
        self.presented_at = event.presented_at;

        if event.is_terminal() {
            step.finished = Some(self.finalize());
            return step;
        }

        self.previous = self.current.replace(event.stimulus);
        self.presented += 1;
        if self.presented >= S::ANSWERABLE_AFTER {
            self.allow_answer = true;
        }
        step
    }

    /// Appends a typed digit. At most [`MAX_TYPED_DIGITS`] are kept.
    pub fn type_digit(&mut self, c: char) -> bool {
        let full = self.typed_answer.len() >= MAX_TYPED_DIGITS;
        if !self.accepts_typing() || !c.is_ascii_digit() || full {
            return false;
        }
        self.typed_answer.push(c);
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.accepts_typing() && self.typed_answer.pop().is_some()
    }

    /// Submits the typed answer. Nothing happens while it is empty.
    pub fn confirm_typed(&mut self) -> Option<ResponseRecord> {
        if self.typed_answer.is_empty() {
            return None;
        }
        let answer = self.typed_answer.clone();
        self.submit_answer(&answer)
    }

    /// Scores `answer` for the current interval, once per interval.
    pub fn submit_answer(&mut self, answer: &str) -> Option<ResponseRecord> {
        if !self.state.allows_input() || !self.allow_answer {
            return None;
        }
        if self.submitted_this_interval {
            debug!(answer, "second answer in the same interval dropped");
            return None;
        }
        self.submitted_this_interval = true;
        Some(self.score(answer))
    }

    fn accepts_typing(&self) -> bool {
        self.state.allows_input() && self.allow_answer
    }

    fn score(&mut self, answer: &str) -> ResponseRecord {
        let expected = self
            .current
            .as_ref()
            .and_then(|current| S::expected_sum(self.previous.as_ref(), current));
        let record = scorer::score(answer, expected, self.presented_at, self.timer.now());
        debug!(
            interval = self.records.len() + 1,
            outcome = ?record.outcome,
            reaction_time_s = record.reaction_time_s,
            "interval scored"
        );
        self.records.push(record);
        record
    }

    fn finalize(&mut self) -> RunOutcome {
        self.state = SessionState::Finished;
        self.allow_answer = false;
        let truncated = self.presented < self.planned;
        let results = ResultSet::new(self.mode, std::mem::take(&mut self.records), truncated);
        let stats = analysis::analyze(&results);
        info!(
            mode = %self.mode,
            presented = self.presented,
            scored = results.len(),
            truncated,
            "session finished"
        );
        RunOutcome { results, stats }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn typed_answer(&self) -> &str {
        &self.typed_answer
    }

    pub fn allows_answer(&self) -> bool {
        self.allow_answer
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }
}
