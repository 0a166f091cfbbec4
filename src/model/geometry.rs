use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Integer window geometry, origin at the top left.
#[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self { Self { x, y, w, h } }

    pub fn right(&self) -> i32 { self.x + self.w }

    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn size(&self) -> Size { Size { w: self.w, h: self.h } }

    /// Same rect with the horizontal span replaced.
    pub fn with_columns(self, x: i32, w: i32) -> Self { Self { x, w, ..self } }

    /// Same rect with the vertical span replaced.
    pub fn with_rows(self, y: i32, h: i32) -> Self { Self { y, h, ..self } }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub const fn new(w: i32, h: i32) -> Self { Self { w, h } }
}

bitflags! {
    /// Axes a window is maximized along.
    #[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct Axes: u8 {
        const HORIZONTAL = 1 << 0;
        const VERTICAL = 1 << 1;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}
