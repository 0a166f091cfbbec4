//! The boundary between the engine and the windowing environment it manages.
//!
//! The engine reads window and desktop facts through [`WindowQuery`] and
//! issues fire-and-forget requests through [`Host`]. Neither side waits on the
//! other: a request may come back later as a geometry-changed notification.

use serde::{Deserialize, Serialize};

use crate::layout_engine::Request;
use crate::model::{Axes, DesktopId, Rect, Size, WindowId};

/// Where a desktop sits in the host's desktop grid.
#[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DesktopCoords {
    pub x: i32,
    pub y: i32,
    pub zone: u32,
}

pub trait WindowQuery {
    /// Area of the desktop's screen available for windows, excluding panels
    /// and docks.
    fn usable_region(&self, desktop: DesktopId) -> Rect;
    fn desktop_coords(&self, desktop: DesktopId) -> Option<DesktopCoords>;

    fn window_geometry(&self, wid: WindowId) -> Option<Rect>;
    fn desktop_of(&self, wid: WindowId) -> Option<DesktopId>;
    fn maximized(&self, wid: WindowId) -> Axes;
    fn decoration(&self, wid: WindowId) -> Option<String>;
    fn is_transient(&self, wid: WindowId) -> bool;
    fn is_dialog_type(&self, wid: WindowId) -> bool;
    /// Size granularity the window asks for, e.g. character cells.
    fn declared_step_increment(&self, wid: WindowId) -> Size;
    fn declared_min_size(&self, wid: WindowId) -> Size;

    fn focused_window(&self) -> Option<WindowId>;
}

pub trait Host: WindowQuery {
    fn set_geometry(&mut self, wid: WindowId, geometry: Rect);
    fn set_maximized(&mut self, wid: WindowId, axes: Axes);
    fn clear_maximized(&mut self, wid: WindowId, axes: Axes);
    fn set_decoration(&mut self, wid: WindowId, style: &str);

    fn apply(&mut self, request: Request) {
        match request {
            Request::SetGeometry(wid, geometry) => self.set_geometry(wid, geometry),
            Request::SetMaximized(wid, axes) => self.set_maximized(wid, axes),
            Request::ClearMaximized(wid, axes) => self.clear_maximized(wid, axes),
            Request::SetDecoration(wid, style) => self.set_decoration(wid, &style),
        }
    }
}
