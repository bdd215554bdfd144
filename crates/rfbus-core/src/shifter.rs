use crate::ConfigError;

/// Widest payload a shifter can hold.
pub const MAX_DATA_BITS: u8 = 32;

/// Load/shift register serializing a payload least-significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitShifter {
    width: u8,
    bits: u32,
    remaining: u8,
}

impl BitShifter {
    /// Creates an empty shifter of `width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DataBitsOutOfRange`] unless `1 <= width <= 32`.
    pub const fn new(width: u8) -> Result<Self, ConfigError> {
        if width == 0 || width > MAX_DATA_BITS {
            return Err(ConfigError::DataBitsOutOfRange { bits: width });
        }
        Ok(Self {
            width,
            bits: 0,
            remaining: 0,
        })
    }

    /// Register width.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Bits left to shift out.
    #[must_use]
    pub const fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Returns `true` once every loaded bit has been shifted out.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Returns `true` when a whole number of bytes has been shifted.
    #[must_use]
    pub const fn at_byte_boundary(&self) -> bool {
        self.remaining % 8 == 0
    }

    /// Copies in `payload` (truncated to the width) and rearms the count.
    pub const fn load(&mut self, payload: u32) {
        self.bits = payload & (u32::MAX >> (MAX_DATA_BITS - self.width));
        self.remaining = self.width;
    }

    /// Emits the low bit and shifts right. Returns `None` without touching
    /// any state once the register is empty.
    pub const fn shift(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            return None;
        }
        let bit = self.bits & 1 != 0;
        self.bits >>= 1;
        self.remaining -= 1;
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::BitShifter;
    use crate::ConfigError;

    #[test]
    fn width_is_bounded() {
        assert_eq!(
            BitShifter::new(0),
            Err(ConfigError::DataBitsOutOfRange { bits: 0 })
        );
        assert!(BitShifter::new(32).is_ok());
        assert!(BitShifter::new(33).is_err());
    }

    #[test]
    fn shifts_lsb_first() {
        let mut shifter = BitShifter::new(4).expect("valid width");
        shifter.load(0b1011);
        let bits: Vec<bool> = std::iter::from_fn(|| shifter.shift()).collect();
        assert_eq!(bits, vec![true, true, false, true]);
        assert!(shifter.is_empty());
    }

    #[test]
    fn load_truncates_to_width() {
        let mut shifter = BitShifter::new(3).expect("valid width");
        shifter.load(0xFF);
        assert_eq!(shifter.remaining(), 3);
        let bits: Vec<bool> = std::iter::from_fn(|| shifter.shift()).collect();
        assert_eq!(bits.len(), 3);
    }

    #[test]
    fn shifting_empty_register_is_a_no_op() {
        let mut shifter = BitShifter::new(8).expect("valid width");
        assert_eq!(shifter.shift(), None);
        assert_eq!(shifter.remaining(), 0);
    }

    #[test]
    fn byte_boundary_tracks_whole_bytes() {
        let mut shifter = BitShifter::new(16).expect("valid width");
        shifter.load(0xA5A5);
        assert!(shifter.at_byte_boundary());
        for _ in 0..7 {
            shifter.shift();
            assert!(!shifter.at_byte_boundary());
        }
        shifter.shift();
        assert!(shifter.at_byte_boundary());
        assert_eq!(shifter.remaining(), 8);
    }

    #[test]
    fn full_width_register_keeps_every_bit() {
        let mut shifter = BitShifter::new(32).expect("valid width");
        shifter.load(0x8000_0001);
        assert_eq!(shifter.shift(), Some(true));
        for _ in 0..30 {
            assert_eq!(shifter.shift(), Some(false));
        }
        assert_eq!(shifter.shift(), Some(true));
        assert_eq!(shifter.shift(), None);
    }
}
