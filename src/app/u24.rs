//! Minimal u24 for Observe sequence numbers, which are carried in at most three bytes.

use std::fmt::{Debug, Formatter};

const MASK: u32 = 0xff_ffff;

#[derive(Copy, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct u24(u32);

impl u24 {
    pub fn wrapping_add(self, rhs: Self) -> Self {
        u24(self.0.wrapping_add(rhs.0) & MASK)
    }

    pub fn from_le_bytes(bytes: [u8; 3]) -> Self {
        u24(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }
}

impl Debug for u24 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl From<u8> for u24 {
    fn from(value: u8) -> Self {
        u24(u32::from(value))
    }
}

impl From<u24> for u32 {
    fn from(value: u24) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_add() {
        let max = u24::from_le_bytes([0xff, 0xff, 0xff]);
        assert_eq!(max.wrapping_add(u24::from(1u8)), u24::from(0u8));
        assert_eq!(u32::from(u24::from(7u8).wrapping_add(u24::from(1u8))), 8);
    }

    #[test]
    fn test_from_le_bytes() {
        assert_eq!(u32::from(u24::from_le_bytes([0x01, 0x02, 0x03])), 0x03_0201);
    }
}
