use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("audio asset not found: {}", .0.display())]
    MissingAsset(PathBuf),

    #[error("player `{command}` failed: {reason}")]
    Player { command: String, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Side effect performed for each presented stimulus, e.g. playing its audio clip.
///
/// The pacer measures how long `render` blocks and shortens the following wait
/// by that amount.
pub trait Renderer<S>: Send {
    fn render(&mut self, stimulus: &S) -> Result<(), RenderError>;
}

/// Visual-only presentation: nothing to play.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRenderer;

impl<S> Renderer<S> for SilentRenderer {
    fn render(&mut self, _stimulus: &S) -> Result<(), RenderError> {
        Ok(())
    }
}

impl<S, R: Renderer<S> + ?Sized> Renderer<S> for Box<R> {
    fn render(&mut self, stimulus: &S) -> Result<(), RenderError> {
        (**self).render(stimulus)
    }
}
