//! Registered bus-line drivers.

/// Set/clear register followed by an output register.
///
/// A strobe changes the pending level at the end of the tick it is asserted
/// in; the pin follows one tick later. Set wins over clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetResetLine {
    pending: bool,
    output: bool,
}

impl SetResetLine {
    /// Creates a line resting at `level`.
    #[must_use]
    pub const fn new(level: bool) -> Self {
        Self {
            pending: level,
            output: level,
        }
    }

    /// Level currently on the pin.
    #[must_use]
    pub const fn level(&self) -> bool {
        self.output
    }

    /// Level the pin takes on the next tick.
    #[must_use]
    pub const fn pending(&self) -> bool {
        self.pending
    }

    /// Ends the tick with the given strobes.
    pub const fn update(&mut self, set: bool, clear: bool) {
        self.output = self.pending;
        if set {
            self.pending = true;
        } else if clear {
            self.pending = false;
        }
    }
}

/// Shared line with independent drive-enable and drive-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TriState {
    /// Drive enable; when clear the line floats.
    pub output_enable: bool,
    /// Level driven while enabled.
    pub output: bool,
}

impl Default for TriState {
    fn default() -> Self {
        Self {
            output_enable: true,
            output: true,
        }
    }
}

impl TriState {
    /// Level seen on the wire given the level other parties (or the pull-up)
    /// leave on it while this driver floats.
    #[must_use]
    pub const fn resolve(self, released: bool) -> bool {
        if self.output_enable {
            self.output
        } else {
            released
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SetResetLine, TriState};

    #[test]
    fn strobes_reach_the_pin_after_two_ticks() {
        let mut line = SetResetLine::new(false);
        line.update(true, false);
        assert!(line.pending());
        assert!(!line.level());
        line.update(false, false);
        assert!(line.level());
    }

    #[test]
    fn set_has_priority_over_clear() {
        let mut line = SetResetLine::new(false);
        line.update(true, true);
        assert!(line.pending());
    }

    #[test]
    fn line_holds_without_strobes() {
        let mut line = SetResetLine::new(true);
        for _ in 0..4 {
            line.update(false, false);
        }
        assert!(line.level());
    }

    #[test]
    fn tristate_defaults_to_driven_high() {
        let line = TriState::default();
        assert!(line.output_enable);
        assert!(line.resolve(false));
    }

    #[test]
    fn released_tristate_takes_the_bus_level() {
        let line = TriState {
            output_enable: false,
            output: true,
        };
        assert!(!line.resolve(false));
        assert!(line.resolve(true));
    }
}
