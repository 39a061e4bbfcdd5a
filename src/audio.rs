//! Audio rendering through an external player.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pasat_core::Stimulus;
use pasat_timing::{RenderError, Renderer};
use tracing::debug;

pub const DEFAULT_PLAYER: &str = "aplay -q";

/// Plays `<dir>/<asset>` with a player command and blocks until it exits.
/// Stimuli without an asset (digit pairs) are not played.
#[derive(Debug, Clone)]
pub struct CommandAudioRenderer {
    dir: PathBuf,
    program: String,
    args: Vec<String>,
}

impl CommandAudioRenderer {
    /// `player` is a program followed by its arguments, split on whitespace.
    pub fn new(dir: impl Into<PathBuf>, player: &str) -> Option<Self> {
        let mut parts = player.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self {
            dir: dir.into(),
            program,
            args: parts.collect(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<S: Stimulus> Renderer<S> for CommandAudioRenderer {
    fn render(&mut self, stimulus: &S) -> Result<(), RenderError> {
        let Some(asset) = stimulus.asset_name() else {
            return Ok(());
        };
        let path = self.dir.join(asset);
        if !path.is_file() {
            return Err(RenderError::MissingAsset(path));
        }

        debug!(path = %path.display(), "playing");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| RenderError::Player {
                command: self.command_line(),
                reason: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(RenderError::Player {
                command: self.command_line(),
                reason: status.to_string(),
            })
        }
    }
}
