pub mod error;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use error::PasatError;
pub use phase::{RunMode, SessionState};
pub use stimulus::{Digit, DigitPair, Stimulus};
pub use trial::{Outcome, PresentationEvent, ResponseRecord, ResultSet};
