//! An in-memory [`Host`] that applies requests immediately.
//!
//! Every request is also recorded so tests can assert on exactly what the
//! engine asked for, in order.

use serde::Serialize;
use slotmap::SlotMap;
use tracing::trace;

use super::host::{DesktopCoords, Host, WindowQuery};
use crate::layout_engine::Request;
use crate::model::{Axes, DesktopId, Rect, Size, WindowId};

#[derive(Serialize, Clone, Debug)]
pub struct HeadlessDesktop {
    pub name: String,
    pub region: Rect,
    pub coords: DesktopCoords,
}

#[derive(Serialize, Clone, Debug)]
pub struct HeadlessWindow {
    pub name: String,
    pub desktop: DesktopId,
    pub geometry: Rect,
    pub maximized: Axes,
    pub decoration: Option<String>,
    pub dialog: bool,
    pub transient: bool,
    pub step: Size,
    pub min_size: Size,
}

#[derive(Default, Debug)]
pub struct HeadlessHost {
    desktops: SlotMap<DesktopId, HeadlessDesktop>,
    windows: SlotMap<WindowId, HeadlessWindow>,
    focused: Option<WindowId>,
    requests: Vec<Request>,
}

impl HeadlessHost {
    pub fn new() -> Self { Self::default() }

    /// Adds a desktop placed next to the existing ones in the grid.
    pub fn add_desktop(&mut self, name: &str, region: Rect) -> DesktopId {
        let coords = DesktopCoords {
            x: self.desktops.len() as i32,
            ..DesktopCoords::default()
        };
        self.add_desktop_at(name, region, coords)
    }

    pub fn add_desktop_at(&mut self, name: &str, region: Rect, coords: DesktopCoords) -> DesktopId {
        self.desktops.insert(HeadlessDesktop {
            name: name.to_string(),
            region,
            coords,
        })
    }

    pub fn add_window(&mut self, desktop: DesktopId, geometry: Rect) -> WindowId {
        let name = format!("window{}", self.windows.len() + 1);
        self.add_named_window(&name, desktop, geometry)
    }

    pub fn add_named_window(&mut self, name: &str, desktop: DesktopId, geometry: Rect) -> WindowId {
        self.windows.insert(HeadlessWindow {
            name: name.to_string(),
            desktop,
            geometry,
            maximized: Axes::empty(),
            decoration: None,
            dialog: false,
            transient: false,
            step: Size::default(),
            min_size: Size::default(),
        })
    }

    pub fn desktop(&self, desktop: DesktopId) -> Option<&HeadlessDesktop> { self.desktops.get(desktop) }

    pub fn desktops(&self) -> impl Iterator<Item = (DesktopId, &HeadlessDesktop)> { self.desktops.iter() }

    /// Panics if `wid` was never added.
    pub fn window(&self, wid: WindowId) -> &HeadlessWindow { &self.windows[wid] }

    /// Panics if `wid` was never added.
    pub fn window_mut(&mut self, wid: WindowId) -> &mut HeadlessWindow { &mut self.windows[wid] }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &HeadlessWindow)> { self.windows.iter() }

    pub fn set_focused(&mut self, wid: Option<WindowId>) { self.focused = wid; }

    pub fn requests(&self) -> &[Request] { &self.requests }

    pub fn clear_requests(&mut self) { self.requests.clear(); }

    pub fn apply_all(&mut self, requests: impl IntoIterator<Item = Request>) {
        for request in requests {
            self.apply(request);
        }
    }

    fn region_of(&self, wid: WindowId) -> Option<Rect> {
        let window = self.windows.get(wid)?;
        Some(self.desktops.get(window.desktop)?.region)
    }
}

impl WindowQuery for HeadlessHost {
    fn usable_region(&self, desktop: DesktopId) -> Rect {
        self.desktops.get(desktop).map(|d| d.region).unwrap_or_default()
    }

    fn desktop_coords(&self, desktop: DesktopId) -> Option<DesktopCoords> {
        self.desktops.get(desktop).map(|d| d.coords)
    }

    fn window_geometry(&self, wid: WindowId) -> Option<Rect> {
        self.windows.get(wid).map(|w| w.geometry)
    }

    fn desktop_of(&self, wid: WindowId) -> Option<DesktopId> { self.windows.get(wid).map(|w| w.desktop) }

    fn maximized(&self, wid: WindowId) -> Axes {
        self.windows.get(wid).map(|w| w.maximized).unwrap_or_default()
    }

    fn decoration(&self, wid: WindowId) -> Option<String> {
        self.windows.get(wid).and_then(|w| w.decoration.clone())
    }

    fn is_transient(&self, wid: WindowId) -> bool { self.windows.get(wid).is_some_and(|w| w.transient) }

    fn is_dialog_type(&self, wid: WindowId) -> bool { self.windows.get(wid).is_some_and(|w| w.dialog) }

    fn declared_step_increment(&self, wid: WindowId) -> Size {
        self.windows.get(wid).map(|w| w.step).unwrap_or_default()
    }

    fn declared_min_size(&self, wid: WindowId) -> Size {
        self.windows.get(wid).map(|w| w.min_size).unwrap_or_default()
    }

    fn focused_window(&self) -> Option<WindowId> { self.focused }
}

impl Host for HeadlessHost {
    fn set_geometry(&mut self, wid: WindowId, geometry: Rect) {
        if let Some(window) = self.windows.get_mut(wid) {
            trace!(name = %window.name, %geometry, "set_geometry");
            window.geometry = geometry;
        }
    }

    /// Maximizing snaps the window to the usable region along `axes`, like a
    /// real window manager would.
    fn set_maximized(&mut self, wid: WindowId, axes: Axes) {
        let Some(region) = self.region_of(wid) else { return };
        let Some(window) = self.windows.get_mut(wid) else { return };
        if axes.contains(Axes::HORIZONTAL) {
            window.geometry = window.geometry.with_columns(region.x, region.w);
        }
        if axes.contains(Axes::VERTICAL) {
            window.geometry = window.geometry.with_rows(region.y, region.h);
        }
        window.maximized |= axes;
    }

    fn clear_maximized(&mut self, wid: WindowId, axes: Axes) {
        if let Some(window) = self.windows.get_mut(wid) {
            window.maximized.remove(axes);
        }
    }

    fn set_decoration(&mut self, wid: WindowId, style: &str) {
        if let Some(window) = self.windows.get_mut(wid) {
            window.decoration = Some(style.to_string());
        }
    }

    fn apply(&mut self, request: Request) {
        match &request {
            Request::SetGeometry(wid, geometry) => self.set_geometry(*wid, *geometry),
            Request::SetMaximized(wid, axes) => self.set_maximized(*wid, *axes),
            Request::ClearMaximized(wid, axes) => self.clear_maximized(*wid, *axes),
            Request::SetDecoration(wid, style) => self.set_decoration(*wid, style),
        }
        self.requests.push(request);
    }
}
