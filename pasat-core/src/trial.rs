use serde::{Deserialize, Serialize};

use crate::phase::RunMode;
use crate::stimulus::Stimulus;

/// A stimulus and the moment its presentation started, in nanoseconds on the run's timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationEvent<S> {
    pub stimulus: S,
    pub presented_at: u64,
}

impl<S: Stimulus> PresentationEvent<S> {
    pub fn new(stimulus: S, presented_at: u64) -> Self {
        Self {
            stimulus,
            presented_at,
        }
    }

    /// The padding event closing every run.
    pub fn terminal(presented_at: u64) -> Self {
        Self::new(S::null(), presented_at)
    }

    pub fn is_terminal(&self) -> bool {
        self.stimulus.is_null()
    }
}

/// How an interval was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "C")]
    Correct,
    #[serde(rename = "I")]
    Incorrect,
    #[serde(rename = "N")]
    NotAnswered,
}

impl Outcome {
    pub fn code(self) -> char {
        match self {
            Outcome::Correct => 'C',
            Outcome::Incorrect => 'I',
            Outcome::NotAnswered => 'N',
        }
    }
}

/// Recorded result per interval. Reaction time is kept only for correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub outcome: Outcome,
    pub reaction_time_s: f64,
}

impl ResponseRecord {
    pub fn correct(reaction_time_s: f64) -> Self {
        Self {
            outcome: Outcome::Correct,
            reaction_time_s: reaction_time_s.max(0.0),
        }
    }

    pub fn incorrect() -> Self {
        Self {
            outcome: Outcome::Incorrect,
            reaction_time_s: 0.0,
        }
    }

    pub fn not_answered() -> Self {
        Self {
            outcome: Outcome::NotAnswered,
            reaction_time_s: 0.0,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.outcome == Outcome::Correct
    }
}

/// The scored intervals of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    mode: RunMode,
    records: Vec<ResponseRecord>,
    /// Set when the run was stopped before its sequence was exhausted.
    truncated: bool,
}

impl ResultSet {
    pub fn new(mode: RunMode, records: Vec<ResponseRecord>, truncated: bool) -> Self {
        Self {
            mode,
            records,
            truncated,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.records.iter().map(|r| r.outcome).collect()
    }

    pub fn reaction_times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.reaction_time_s).collect()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}
