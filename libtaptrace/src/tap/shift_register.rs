use core::fmt;

/// Bits collected while a register is being shifted. The first bit clocked in
/// is the least significant one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShiftRegister {
    bits: Vec<bool>,
}

impl ShiftRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lsb_first(bits: &[bool]) -> Self {
        ShiftRegister {
            bits: bits.to_vec(),
        }
    }

    /// Add a newly clocked bit as the most significant one.
    pub fn shift_in(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn to_u64(&self) -> Option<u64> {
        if self.bits.len() > 64 {
            return None;
        }
        Some(
            self.bits
                .iter()
                .rev()
                .fold(0, |x, y| (x << 1) | *y as u64),
        )
    }
}

impl fmt::Display for ShiftRegister {
    /// Most significant bit first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().rev() {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_bit_is_msb() {
        let mut reg = ShiftRegister::new();
        for bit in [true, false, false, true, true].iter() {
            reg.shift_in(*bit);
        }
        assert_eq!(reg.len(), 5);
        assert_eq!(reg.to_string(), "11001");
        assert_eq!(reg.to_u64(), Some(0b11001));
    }

    #[test]
    fn wide_register_has_no_u64_value() {
        let reg = ShiftRegister::from_lsb_first(&[true; 65]);
        assert_eq!(reg.to_u64(), None);
        let reg = ShiftRegister::from_lsb_first(&[true; 64]);
        assert_eq!(reg.to_u64(), Some(u64::MAX));
    }

    #[test]
    fn empty() {
        let reg = ShiftRegister::new();
        assert!(reg.is_empty());
        assert_eq!(reg.to_string(), "");
        assert_eq!(reg.to_u64(), Some(0));
    }
}
