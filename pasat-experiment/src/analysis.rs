//! Accuracy, reaction time and fatigability over a finished run.

use pasat_core::{Outcome, ResponseRecord, ResultSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigabilityStats {
    pub correct: usize,
    pub incorrect: usize,
    pub not_answered: usize,
    pub correct_percent: f64,
    /// Mean over non-zero reaction times only; 0 when there are none.
    pub mean_reaction_time: f64,
    /// Correct answers in the last third minus those in the first third.
    pub fatigability_delta: i64,
    /// Drop from the first to the last third, relative to the first. `None` when
    /// the first third has no correct answer.
    pub fatigability_percent: Option<f64>,
}

/// Mean of the non-zero values, or 0 if there are none.
pub fn non_zero_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| **v != 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// First and last `n / 3` records. A remainder of one or two records in the
/// middle belongs to neither third.
pub fn thirds(records: &[ResponseRecord]) -> (&[ResponseRecord], &[ResponseRecord]) {
    let n = records.len();
    let third = n / 3;
    (&records[..third], &records[n - third..])
}

fn correct_in(records: &[ResponseRecord]) -> usize {
    records.iter().filter(|r| r.is_correct()).count()
}

/// Returns `None` for an empty result set.
pub fn analyze(results: &ResultSet) -> Option<FatigabilityStats> {
    if results.is_empty() {
        return None;
    }
    let records = results.records();
    let correct = results.count(Outcome::Correct);
    let (first, last) = thirds(records);
    let first_correct = correct_in(first);
    let last_correct = correct_in(last);

    let fatigability_percent = (first_correct > 0).then(|| {
        (first_correct as f64 - last_correct as f64) / first_correct as f64 * 100.0
    });

    Some(FatigabilityStats {
        correct,
        incorrect: results.count(Outcome::Incorrect),
        not_answered: results.count(Outcome::NotAnswered),
        correct_percent: 100.0 * correct as f64 / records.len() as f64,
        mean_reaction_time: non_zero_mean(&results.reaction_times()),
        fatigability_delta: last_correct as i64 - first_correct as i64,
        fatigability_percent,
    })
}
