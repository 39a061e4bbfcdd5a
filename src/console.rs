use std::fmt::{self, Display};
use std::time::Duration;

use comfy_table::{Cell, Table};
use pasat_core::{Outcome, PresentationEvent, ResponseRecord};
use pasat_experiment::{Language, RunObserver, RunReport};

/// Prints stimuli, timer and feedback to stdout.
pub struct ConsoleObserver {
    language: Language,
    show_timer: bool,
    last_second: Option<u64>,
}

impl ConsoleObserver {
    pub fn new(language: Language, show_timer: bool) -> Self {
        Self {
            language,
            show_timer,
            last_second: None,
        }
    }

    fn localized(&self, value: impl Display) -> String {
        self.language.localize_digits(&value.to_string())
    }
}

impl<S: Display> RunObserver<S> for ConsoleObserver {
    fn on_presented(&mut self, event: &PresentationEvent<S>) {
        println!("  >> {}", self.localized(&event.stimulus));
    }

    fn on_elapsed(&mut self, elapsed: Duration) {
        if !self.show_timer {
            return;
        }
        let second = elapsed.as_secs();
        if self.last_second != Some(second) && second > 0 {
            self.last_second = Some(second);
            println!("     [{}s]", self.localized(second));
        }
    }

    fn on_scored(&mut self, record: &ResponseRecord) {
        match record.outcome {
            Outcome::Correct => println!("     Correct"),
            Outcome::Incorrect => println!("     Incorrect"),
            Outcome::NotAnswered => {}
        }
    }

    fn on_paused(&mut self) {
        println!("  -- paused, type r to resume --");
    }

    fn on_resumed(&mut self) {
        println!("  -- resumed --");
    }

    fn on_finished(&mut self, report: &RunReport) {
        print!("{}", ResultsTable::new(report, self.language));
    }
}

/// End-of-run summary.
pub struct ResultsTable<'a> {
    report: &'a RunReport,
    language: Language,
}

impl<'a> ResultsTable<'a> {
    pub fn new(report: &'a RunReport, language: Language) -> Self {
        Self { report, language }
    }
}

impl ResultsTable<'_> {
    fn statistics(&self) -> Option<Table> {
        let results = &self.report.outcome.results;
        let stats = self.report.outcome.stats().ok()?;
        let codes: Vec<String> = results
            .outcomes()
            .iter()
            .map(|o| o.code().to_string())
            .collect();
        let fatigability = match stats.fatigability_percent {
            Some(percent) => format!("{} ({percent:.1}%)", stats.fatigability_delta),
            None => stats.fatigability_delta.to_string(),
        };

        let mut table = Table::new();
        table.set_header(vec!["Statistic", "Value"]);
        table.add_row(vec![Cell::new("Correct"), Cell::new(stats.correct)]);
        table.add_row(vec![Cell::new("Incorrect"), Cell::new(stats.incorrect)]);
        table.add_row(vec![Cell::new("Not answered"), Cell::new(stats.not_answered)]);
        table.add_row(vec![
            Cell::new("Correct %"),
            Cell::new(format!("{:.1}", stats.correct_percent)),
        ]);
        table.add_row(vec![
            Cell::new("Mean reaction time"),
            Cell::new(format!("{:.2} s", stats.mean_reaction_time)),
        ]);
        table.add_row(vec![Cell::new("Fatigability"), Cell::new(fatigability)]);
        table.add_row(vec![Cell::new("Results"), Cell::new(codes.join(" "))]);
        Some(table)
    }
}

impl Display for ResultsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("\n{} results\n", self.report.mode());
        if self.report.outcome.results.truncated() {
            out.push_str("(stopped early)\n");
        }
        match self.statistics() {
            Some(table) => out.push_str(&format!("{table}\n")),
            None => out.push_str("No scored intervals.\n"),
        }
        f.write_str(&self.language.localize_digits(&out))
    }
}
