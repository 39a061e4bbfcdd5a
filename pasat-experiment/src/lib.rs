pub mod analysis;
pub mod config;
pub mod generator;
pub mod runner;
pub mod scorer;
pub mod session;

pub use analysis::{analyze, FatigabilityStats};
pub use config::{ConfigError, Language, SessionConfig};
pub use generator::SequenceGenerator;
pub use runner::{
    InputCommand, NoopObserver, RunController, RunError, RunObserver, RunReport, SessionMessage,
    TrialRunner,
};
pub use session::{PresentationStep, RunOutcome, TrialSession, MAX_TYPED_DIGITS};
