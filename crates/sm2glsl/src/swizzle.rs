//! Packed swizzle and write-mask values.
//!
//! Both types keep the exact wire encoding: two bits per swizzle component
//! (x in the low bits) and one bit per write-mask component.

use std::fmt;

/// Component letters in swizzle/write-mask order.
pub(crate) const COMPONENT_CHARS: [char; 4] = ['x', 'y', 'z', 'w'];

/// A four-component source swizzle packed as 4x2 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub u8);

impl Swizzle {
    /// `.xyzw`
    pub const NONE: Swizzle = Swizzle(0xE4);

    pub fn new(x: u8, y: u8, z: u8, w: u8) -> Self {
        Self((x & 3) | ((y & 3) << 2) | ((z & 3) << 4) | ((w & 3) << 6))
    }

    /// Swizzle that replicates a single component to all four lanes.
    pub fn replicate(component: u8) -> Self {
        Self::new(component, component, component, component)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn component(self, i: usize) -> u8 {
        (self.0 >> (i * 2)) & 3
    }

    pub fn with_component(self, i: usize, value: u8) -> Self {
        let shift = i * 2;
        Self((self.0 & !(3 << shift)) | ((value & 3) << shift))
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_replicate(self) -> bool {
        let x = self.component(0);
        (1..4).all(|i| self.component(i) == x)
    }

    pub fn x(self) -> u8 {
        self.component(0)
    }

    pub fn y(self) -> u8 {
        self.component(1)
    }

    pub fn z(self) -> u8 {
        self.component(2)
    }

    pub fn w(self) -> u8 {
        self.component(3)
    }

    pub fn component_char(self, i: usize) -> char {
        COMPONENT_CHARS[self.component(i) as usize]
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..4 {
            write!(f, "{}", self.component_char(i))?;
        }
        Ok(())
    }
}

/// A destination write mask; bit 0 is `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteMask(pub u8);

impl WriteMask {
    pub const X: WriteMask = WriteMask(0b0001);
    pub const Y: WriteMask = WriteMask(0b0010);
    pub const XY: WriteMask = WriteMask(0b0011);
    pub const XYZ: WriteMask = WriteMask(0b0111);
    pub const XYZW: WriteMask = WriteMask(0b1111);

    pub fn new(x: bool, y: bool, z: bool, w: bool) -> Self {
        Self((x as u8) | ((y as u8) << 1) | ((z as u8) << 2) | ((w as u8) << 3))
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn component(self, i: usize) -> bool {
        (self.0 >> i) & 1 != 0
    }

    pub fn vec_size(self) -> usize {
        (self.0 & 0xF).count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 & 0xF == 0
    }

    pub fn is_x(self) -> bool {
        self.0 & 0xF == Self::X.0
    }

    pub fn is_y(self) -> bool {
        self.0 & 0xF == Self::Y.0
    }

    pub fn is_xy(self) -> bool {
        self.0 & 0xF == Self::XY.0
    }

    pub fn is_xyz(self) -> bool {
        self.0 & 0xF == Self::XYZ.0
    }

    pub fn is_xyzw(self) -> bool {
        self.0 & 0xF == Self::XYZW.0
    }
}

impl Default for WriteMask {
    fn default() -> Self {
        Self::XYZW
    }
}
