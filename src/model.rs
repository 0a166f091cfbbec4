pub mod geometry;
pub mod overrides;

pub use geometry::{Axes, Rect, Size};
pub use overrides::GeometryOverrides;

slotmap::new_key_type! {
    /// Stable handle for a host window. Keys are generation checked, so a
    /// handle that outlived its window never aliases a newer one.
    pub struct WindowId;
    /// Stable handle for a virtual desktop.
    pub struct DesktopId;
}
