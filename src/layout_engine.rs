//! Column tiling: per-desktop column state, space distribution, and the
//! propagation of observed geometry changes to neighbouring windows.
//!
//! Nothing in here talks to the host. Operations run against a [`LayoutCx`]
//! and leave behind an ordered list of [`Request`]s, which the reactor applies
//! once the whole redistribution has been computed.

mod columns;
pub mod distribution;
mod error;
mod floating;
mod propagation;
mod workspaces;

pub use columns::{Column, DesktopTiling};
pub use error::LayoutError;
pub use propagation::{Changes, ObservedChange};
use serde::{Deserialize, Serialize};
use tracing::trace;
pub use workspaces::DesktopRegistry;

use crate::common::config::Settings;
use crate::model::{Axes, GeometryOverrides, Rect, WindowId};
use crate::sys::host::WindowQuery;

/// Upper bound on the number of columns a desktop can hold.
pub const MAX_COLUMNS: usize = 8;

static_assertions::const_assert!(MAX_COLUMNS > 0);

/// Resolved per-desktop layout. A desktop without one is not tiled.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct LayoutConfig {
    pub columns: usize,
}

impl LayoutConfig {
    /// Returns `None` for zero columns; counts above [`MAX_COLUMNS`] are
    /// clamped.
    pub fn new(columns: usize) -> Option<Self> {
        (columns > 0).then(|| Self { columns: columns.min(MAX_COLUMNS) })
    }
}

/// Something the host should do to a window.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    SetGeometry(WindowId, Rect),
    SetMaximized(WindowId, Axes),
    ClearMaximized(WindowId, Axes),
    SetDecoration(WindowId, String),
}

/// Everything a layout operation may read, plus the requests it produced.
pub struct LayoutCx<'a> {
    pub host: &'a dyn WindowQuery,
    pub overrides: &'a mut GeometryOverrides,
    pub settings: &'a Settings,
    /// Usable region of the desktop being laid out.
    pub region: Rect,
    requests: Vec<Request>,
}

impl<'a> LayoutCx<'a> {
    pub fn new(
        host: &'a dyn WindowQuery,
        overrides: &'a mut GeometryOverrides,
        settings: &'a Settings,
        region: Rect,
    ) -> Self {
        Self {
            host,
            overrides,
            settings,
            region,
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[Request] { &self.requests }

    pub fn into_requests(self) -> Vec<Request> { self.requests }

    pub(crate) fn push(&mut self, request: Request) {
        trace!(?request, "queued");
        self.requests.push(request);
    }

    /// Records `geometry` as assigned to `wid` and queues it.
    pub(crate) fn assign(&mut self, wid: WindowId, geometry: Rect) {
        self.overrides.insert(wid, geometry);
        self.set_geometry(wid, geometry);
    }

    /// Queues a geometry request unless the last one queued for `wid` already
    /// asks for the same thing.
    pub(crate) fn set_geometry(&mut self, wid: WindowId, geometry: Rect) {
        let last = self.requests.iter().rev().find_map(|r| match r {
            Request::SetGeometry(w, g) if *w == wid => Some(*g),
            _ => None,
        });
        if last != Some(geometry) {
            self.push(Request::SetGeometry(wid, geometry));
        }
    }
}
