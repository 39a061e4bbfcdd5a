//! CSV results file, one row per player code.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use pasat_core::RunMode;
use pasat_experiment::RunOutcome;
use tracing::info;

const PLAYER_COLUMNS: [&str; 4] = ["code", "name", "date", "time"];

const MODE_FIELDS: [&str; 9] = [
    "correct",
    "incorrect",
    "not_answered",
    "correct_percent",
    "results",
    "fatigability",
    "fatigability_percent",
    "reaction_times",
    "mean_reaction_time",
];

const MODES: [RunMode; 2] = [RunMode::Demo, RunMode::Pasat];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub code: String,
    pub name: String,
}

/// Column names in file order: player columns, then each mode's fields
/// prefixed with the mode label, e.g. `PASAT correct`.
pub fn headers() -> Vec<String> {
    PLAYER_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(MODES.iter().flat_map(|mode| {
            MODE_FIELDS
                .iter()
                .map(move |field| format!("{} {field}", mode.label()))
        }))
        .collect()
}

fn mode_offset(mode: RunMode) -> usize {
    let index = MODES.iter().position(|m| *m == mode).unwrap_or(0);
    PLAYER_COLUMNS.len() + index * MODE_FIELDS.len()
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the outcome into the player's row, creating the row if needed.
    /// Returns `false` without touching the file when nothing was scored.
    pub fn record(
        &self,
        player: &Participant,
        outcome: &RunOutcome,
        at: NaiveDateTime,
    ) -> Result<bool> {
        let Ok(stats) = outcome.stats() else {
            info!(
                code = %player.code,
                mode = %outcome.results.mode(),
                "no scored intervals, nothing saved"
            );
            return Ok(false);
        };

        let mut rows = self.load()?;
        let width = headers().len();
        let index = match rows.iter().position(|row| row[0] == player.code) {
            Some(index) => index,
            None => {
                rows.push(vec![String::new(); width]);
                rows.len() - 1
            }
        };
        let row = &mut rows[index];
        row[0] = player.code.clone();
        row[1] = player.name.clone();
        row[2] = at.format("%Y-%m-%d").to_string();
        row[3] = at.format("%H:%M:%S").to_string();

        let values = [
            stats.correct.to_string(),
            stats.incorrect.to_string(),
            stats.not_answered.to_string(),
            format!("{:.2}", stats.correct_percent),
            serde_json::to_string(&outcome.results.outcomes())?,
            stats.fatigability_delta.to_string(),
            stats
                .fatigability_percent
                .map(|p| format!("{p:.2}"))
                .unwrap_or_default(),
            serde_json::to_string(&outcome.results.reaction_times())?,
            format!("{:.2}", stats.mean_reaction_time),
        ];
        let offset = mode_offset(outcome.results.mode());
        for (i, value) in values.into_iter().enumerate() {
            row[offset + i] = value;
        }

        self.save(&rows)?;
        info!(
            code = %player.code,
            mode = %outcome.results.mode(),
            path = %self.path.display(),
            "results saved"
        );
        Ok(true)
    }

    /// Rows in canonical column order. Unknown columns are dropped and
    /// missing ones are left empty.
    pub fn load(&self) -> Result<Vec<Vec<String>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let file_headers = reader.headers()?.clone();
        let columns: Vec<Option<usize>> = headers()
            .iter()
            .map(|h| file_headers.iter().position(|f| f == h))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("malformed row in {}", self.path.display()))?;
            rows.push(
                columns
                    .iter()
                    .map(|col| {
                        col.and_then(|i| record.get(i))
                            .unwrap_or_default()
                            .to_string()
                    })
                    .collect(),
            );
        }
        Ok(rows)
    }

    fn save(&self, rows: &[Vec<String>]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("failed to create {}", self.path.display()))?;
        writer.write_record(headers())?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pasat_core::{ResponseRecord, ResultSet};
    use pasat_experiment::analyze;

    fn outcome(mode: RunMode, records: Vec<ResponseRecord>) -> RunOutcome {
        let results = ResultSet::new(mode, records, false);
        RunOutcome {
            stats: analyze(&results),
            results,
        }
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(hour, 5, 0)
            .unwrap()
    }

    fn player(code: &str) -> Participant {
        Participant {
            code: code.into(),
            name: "Sam".into(),
        }
    }

    fn column(name: &str) -> usize {
        headers().iter().position(|h| h == name).unwrap()
    }

    #[test]
    fn header_layout() {
        let headers = headers();
        assert_eq!(headers.len(), 4 + 2 * 9);
        assert_eq!(headers[4], "Addition correct");
        assert_eq!(headers[13], "PASAT correct");
        assert_eq!(headers.last().unwrap(), "PASAT mean_reaction_time");
    }

    #[test]
    fn same_code_is_overwritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));

        let first = outcome(
            RunMode::Pasat,
            vec![ResponseRecord::correct(1.2), ResponseRecord::not_answered()],
        );
        assert!(store.record(&player("P01"), &first, at(9)).unwrap());
        assert!(store.record(&player("P02"), &first, at(10)).unwrap());

        let second = outcome(RunMode::Pasat, vec![ResponseRecord::incorrect()]);
        assert!(store.record(&player("P01"), &second, at(11)).unwrap());

        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "P01");
        assert_eq!(rows[0][3], "11:05:00");
        assert_eq!(rows[0][column("PASAT correct")], "0");
        assert_eq!(rows[0][column("PASAT results")], r#"["I"]"#);
        assert_eq!(rows[1][0], "P02");
        assert_eq!(rows[1][column("PASAT reaction_times")], "[1.2,0.0]");
    }

    #[test]
    fn modes_fill_their_own_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));
        let demo = outcome(RunMode::Demo, vec![ResponseRecord::correct(0.8)]);
        let pasat = outcome(
            RunMode::Pasat,
            vec![
                ResponseRecord::correct(1.0),
                ResponseRecord::incorrect(),
                ResponseRecord::not_answered(),
            ],
        );
        store.record(&player("P07"), &demo, at(9)).unwrap();
        store.record(&player("P07"), &pasat, at(9)).unwrap();

        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], "2024-03-09");
        assert_eq!(rows[0][column("Addition correct_percent")], "100.00");
        assert_eq!(rows[0][column("PASAT correct_percent")], "33.33");
        assert_eq!(rows[0][column("PASAT fatigability")], "-1");
        assert_eq!(rows[0][column("PASAT fatigability_percent")], "100.00");
        assert_eq!(rows[0][column("Addition fatigability_percent")], "");
    }

    #[test]
    fn empty_outcome_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));
        let empty = outcome(RunMode::Pasat, Vec::new());
        assert!(!store.record(&player("P01"), &empty, at(9)).unwrap());
        assert!(!store.path().exists());
    }
}
