pub mod elapsed;
pub mod gate;
pub mod render;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod timer;
mod wait;

pub use elapsed::{ElapsedTick, ElapsedTimeReporter};
pub use gate::PauseGate;
pub use render::{RenderError, Renderer, SilentRenderer};
pub use scheduler::{PacedScheduler, PacerEvent, DEFAULT_GRANULARITY};
pub use sink::EventSink;
pub use stats::PacingStats;
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
