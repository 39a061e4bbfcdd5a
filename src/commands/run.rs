//! The `pasat run` command.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Args;
use parking_lot::Mutex;
use pasat_core::{Digit, RunMode, Stimulus};
use pasat_experiment::{
    InputCommand, Language, RunController, RunReport, SequenceGenerator, SessionConfig,
    TrialRunner,
};
use pasat_timing::{HighPrecisionTimer, Renderer, SilentRenderer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::audio::{CommandAudioRenderer, DEFAULT_PLAYER};
use crate::console::ConsoleObserver;
use crate::store::{Participant, ResultStore};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Player code; the results row is keyed by it
    #[arg(long)]
    code: String,

    /// Player name
    #[arg(long)]
    name: String,

    /// Config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Results CSV
    #[arg(long, default_value = "pasat_results.csv")]
    results: PathBuf,

    /// Digits in the PASAT run
    #[arg(long)]
    numbers: Option<usize>,

    /// Seconds between digits
    #[arg(long)]
    interval: Option<u64>,

    /// Digit pairs in the demo run
    #[arg(long)]
    pairs: Option<usize>,

    /// Interface language: en or fa
    #[arg(long)]
    language: Option<Language>,

    /// Skip the demo run
    #[arg(long)]
    no_demo: bool,

    /// Hide the elapsed-time display
    #[arg(long)]
    no_timer: bool,

    /// Directory holding <lang>/<n>.wav clips; digits are shown only when absent
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Player command for the clips
    #[arg(long, default_value = DEFAULT_PLAYER)]
    player: String,

    /// Seed for the digit sequences
    #[arg(long)]
    seed: Option<u64>,

    /// Also write each run's outcome as JSON into this directory
    #[arg(long)]
    json_dir: Option<PathBuf>,
}

impl RunArgs {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(numbers) = self.numbers {
            config.numbers_per_trial = numbers;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(pairs) = self.pairs {
            config.pairs_in_demo = pairs;
        }
        if let Some(language) = self.language {
            config.language = language;
        }
        if self.no_demo {
            config.show_demo = false;
        }
        if self.no_timer {
            config.show_timer = false;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config = args.session_config()?;
    let player = Participant {
        code: args.code.clone(),
        name: args.name.clone(),
    };
    let store = ResultStore::new(&args.results);
    if let Some(dir) = &args.json_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut generator = match args.seed {
        Some(seed) => SequenceGenerator::seeded(seed),
        None => SequenceGenerator::new(StdRng::from_os_rng()),
    };

    let router = InputRouter::spawn_stdin()?;
    let mut observer = ConsoleObserver::new(config.language, config.show_timer);

    println!("Type each answer and press Enter. p pauses, r resumes, q stops.");

    if config.show_demo {
        println!("\nDemo: add the two numbers shown.");
        let pairs = generator.pairs(config.pairs_in_demo);
        let runner = TrialRunner::from_config(
            RunMode::Demo,
            pairs,
            &config,
            HighPrecisionTimer::new(),
            SilentRenderer,
        );
        let report = run_attached(runner, &router, &mut observer)?;
        persist(&store, &player, &report, args.json_dir.as_deref())?;
    }

    if router.quit_requested() {
        info!("stopped during the demo, skipping the PASAT run");
        return Ok(());
    }

    println!("\nPASAT: add each number to the one before it.");
    let digits = generator.digits(config.numbers_per_trial);
    let renderer: Box<dyn Renderer<Digit>> = match &args.audio_dir {
        Some(dir) => {
            let dir = config.language.asset_dir(dir);
            let renderer = CommandAudioRenderer::new(&dir, &args.player)
                .with_context(|| format!("invalid player command `{}`", args.player))?;
            info!(dir = %renderer.dir().display(), player = %args.player, "audio enabled");
            Box::new(renderer)
        }
        None => Box::new(SilentRenderer),
    };
    let runner = TrialRunner::from_config(
        RunMode::Pasat,
        digits,
        &config,
        HighPrecisionTimer::new(),
        renderer,
    );
    let report = run_attached(runner, &router, &mut observer)?;
    persist(&store, &player, &report, args.json_dir.as_deref())?;

    Ok(())
}

fn run_attached<S, R>(
    runner: TrialRunner<S, HighPrecisionTimer, R>,
    router: &InputRouter,
    observer: &mut ConsoleObserver,
) -> Result<RunReport>
where
    S: Stimulus + std::fmt::Display,
    R: Renderer<S> + 'static,
{
    router.attach(runner.controller());
    let result = runner.run(observer);
    router.detach();
    let report = result?;
    if report.pacing.overruns > 0 {
        warn!(
            overruns = report.pacing.overruns,
            max_render_ms = report.pacing.max_render_ns / 1_000_000.0,
            "clips longer than the interval delayed the pacing"
        );
    }
    Ok(report)
}

fn persist(
    store: &ResultStore,
    player: &Participant,
    report: &RunReport,
    json_dir: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = json_dir {
        let file = dir.join(format!(
            "{}-{}.json",
            player.code,
            report.mode().label().to_lowercase()
        ));
        report.write_json(&file)?;
    }
    let now = chrono::Local::now().naive_local();
    if store.record(player, &report.outcome, now)? {
        println!("Results saved to {}", store.path().display());
    }
    Ok(())
}

/// Turns one stdin line into a command. Empty lines are skipped.
fn parse_line(line: &str) -> Option<InputCommand> {
    match line.trim() {
        "" => None,
        "p" | "P" => Some(InputCommand::Pause),
        "r" | "R" => Some(InputCommand::Resume),
        "q" | "Q" => Some(InputCommand::Stop),
        answer => Some(InputCommand::Answer(answer.to_string())),
    }
}

/// Forwards stdin to whichever run is active.
#[derive(Default)]
struct InputRouter {
    active: Mutex<Option<RunController>>,
    quit: AtomicBool,
}

impl InputRouter {
    fn spawn_stdin() -> Result<Arc<Self>> {
        let router = Arc::new(Self::default());
        let reader = Arc::clone(&router);
        thread::Builder::new()
            .name("pasat-stdin".into())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    match line {
                        Ok(line) => reader.dispatch(&line),
                        Err(e) => {
                            warn!(error = %e, "stdin closed");
                            break;
                        }
                    }
                }
            })
            .context("failed to spawn the stdin reader")?;
        Ok(router)
    }

    fn attach(&self, controller: RunController) {
        *self.active.lock() = Some(controller);
    }

    fn detach(&self) {
        self.active.lock().take();
    }

    fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    fn dispatch(&self, line: &str) {
        let Some(command) = parse_line(line) else {
            return;
        };
        if command == InputCommand::Stop {
            self.quit.store(true, Ordering::SeqCst);
        }
        match self.active.lock().as_ref() {
            Some(controller) => {
                controller.send(command);
            }
            None => debug!(?command, "no active run, input ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["pasat", "--code", "P01", "--name", "Sam"];
        argv.extend_from_slice(extra);
        Harness::parse_from(argv).args
    }

    #[test]
    fn stdin_lines() {
        assert_eq!(parse_line("  "), None);
        assert_eq!(parse_line("p"), Some(InputCommand::Pause));
        assert_eq!(parse_line("R"), Some(InputCommand::Resume));
        assert_eq!(parse_line("q\n"), Some(InputCommand::Stop));
        assert_eq!(
            parse_line(" 12 "),
            Some(InputCommand::Answer("12".to_string()))
        );
    }

    #[test]
    fn flags_override_the_defaults() {
        let config = parse(&["--numbers", "20", "--interval", "2", "--language", "fa", "--no-demo"])
            .session_config()
            .unwrap();
        assert_eq!(config.numbers_per_trial, 20);
        assert_eq!(config.interval_secs, 2);
        assert_eq!(config.language, Language::Fa);
        assert!(!config.show_demo);
        assert!(config.show_timer);
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pasat.toml");
        std::fs::write(&path, "interval_secs = 4\nnumbers_per_trial = 30\n").unwrap();
        let config = parse(&["--config", path.to_str().unwrap(), "--numbers", "12"])
            .session_config()
            .unwrap();
        assert_eq!(config.interval_secs, 4);
        assert_eq!(config.numbers_per_trial, 12);
    }

    #[test]
    fn below_minimum_is_rejected() {
        assert!(parse(&["--interval", "1"]).session_config().is_err());
        assert!(parse(&["--pairs", "1"]).session_config().is_err());
    }

    #[test]
    fn stop_is_remembered_without_an_active_run() {
        let router = InputRouter::default();
        router.dispatch("5");
        assert!(!router.quit_requested());
        router.dispatch("q");
        assert!(router.quit_requested());
    }
}
