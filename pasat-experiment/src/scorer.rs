//! Classification of a single answer.
//!
//! Only a correct answer keeps its reaction time. Incorrect and missing answers
//! are stored with 0 so that the mean over non-zero times is the mean correct
//! reaction time.

use pasat_core::ResponseRecord;
use tracing::warn;

const TENTH_NS: u64 = 100_000_000;

/// Rounds a nanosecond span to 0.1 s, ties to even.
pub fn round_tenth(nanos: u64) -> f64 {
    let mut tenths = nanos / TENTH_NS;
    let rest = nanos % TENTH_NS;
    if rest > TENTH_NS / 2 || (rest == TENTH_NS / 2 && tenths % 2 == 1) {
        tenths += 1;
    }
    tenths as f64 / 10.0
}

/// Seconds between presentation and `now`, both in timer nanoseconds.
pub fn reaction_time(presented_at: u64, now: u64) -> f64 {
    round_tenth(now.saturating_sub(presented_at))
}

/// Parses an answer typed in Latin, Arabic-Indic or Extended Arabic-Indic digits.
pub fn parse_answer(answer: &str) -> Option<u32> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    answer.chars().try_fold(0u32, |acc, c| {
        let digit = match c {
            '0'..='9' => c as u32 - '0' as u32,
            '\u{0660}'..='\u{0669}' => c as u32 - 0x0660,
            '\u{06F0}'..='\u{06F9}' => c as u32 - 0x06F0,
            _ => return None,
        };
        acc.checked_mul(10)?.checked_add(digit)
    })
}

/// Scores `answer` against `expected`, measuring from `presented_at` to `now`.
pub fn score(answer: &str, expected: Option<u32>, presented_at: u64, now: u64) -> ResponseRecord {
    if answer.trim().is_empty() {
        return ResponseRecord::not_answered();
    }
    let Some(expected) = expected else {
        return ResponseRecord::not_answered();
    };
    match parse_answer(answer) {
        Some(value) if value == expected => {
            ResponseRecord::correct(reaction_time(presented_at, now))
        }
        Some(_) => ResponseRecord::incorrect(),
        None => {
            warn!(answer, "malformed answer scored as not answered");
            ResponseRecord::not_answered()
        }
    }
}
