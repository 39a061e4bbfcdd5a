use std::fmt;

/// Something the pacer can present and the session can score.
pub trait Stimulus: Copy + Clone + PartialEq + Send + Sync + fmt::Debug + 'static {
    /// Real stimuli that must have been presented before an answer is accepted.
    const ANSWERABLE_AFTER: usize;

    /// End-of-sequence padding. Never scored.
    fn null() -> Self;

    fn is_null(&self) -> bool;

    /// The sum the subject has to report once `current` has been presented.
    fn expected_sum(previous: Option<&Self>, current: &Self) -> Option<u32>;

    /// File name of the audio clip for this stimulus, if it is spoken.
    fn asset_name(&self) -> Option<String> {
        None
    }
}

/// A single spoken digit in `[1, 10]`. The value 0 is reserved for the null stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digit(u8);

impl Digit {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Clamps `value` into the valid range.
    pub fn saturating(value: u8) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Stimulus for Digit {
    const ANSWERABLE_AFTER: usize = 2;

    fn null() -> Self {
        Digit(0)
    }

    fn is_null(&self) -> bool {
        self.0 == 0
    }

    fn expected_sum(previous: Option<&Self>, current: &Self) -> Option<u32> {
        previous.map(|p| u32::from(p.0) + u32::from(current.0))
    }

    fn asset_name(&self) -> Option<String> {
        (!self.is_null()).then(|| format!("{}.wav", self.0))
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two digits shown together in the demo; the subject adds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigitPair(Digit, Digit);

impl DigitPair {
    pub fn new(first: Digit, second: Digit) -> Self {
        Self(first, second)
    }

    pub fn first(self) -> Digit {
        self.0
    }

    pub fn second(self) -> Digit {
        self.1
    }
}

impl Stimulus for DigitPair {
    const ANSWERABLE_AFTER: usize = 1;

    fn null() -> Self {
        DigitPair(Digit::null(), Digit::null())
    }

    fn is_null(&self) -> bool {
        self.0.is_null() && self.1.is_null()
    }

    fn expected_sum(_previous: Option<&Self>, current: &Self) -> Option<u32> {
        Some(u32::from(current.0.value()) + u32::from(current.1.value()))
    }
}

impl fmt::Display for DigitPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.0, self.1)
    }
}
