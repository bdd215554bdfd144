//! Two-stage input synchronizer.

/// Number of register stages between the pad and the local domain.
pub const SYNCHRONIZER_STAGES: usize = 2;

/// Register chain importing an externally timed level into the tick domain.
///
/// Consumers read only [`Synchronizer::output`]; the raw input is never
/// observed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Synchronizer {
    stages: [bool; SYNCHRONIZER_STAGES],
}

impl Synchronizer {
    /// Creates a chain with every stage at `level`.
    #[must_use]
    pub const fn new(level: bool) -> Self {
        Self {
            stages: [level; SYNCHRONIZER_STAGES],
        }
    }

    /// Clocks `input` into the first stage.
    pub const fn sample(&mut self, input: bool) {
        self.stages[1] = self.stages[0];
        self.stages[0] = input;
    }

    /// Synchronized level.
    #[must_use]
    pub const fn output(&self) -> bool {
        self.stages[SYNCHRONIZER_STAGES - 1]
    }
}
