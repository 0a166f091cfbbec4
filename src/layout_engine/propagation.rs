//! Reconciles an observed geometry change with the cached override.
//!
//! A tiled window that changed size or position pushes the difference onto
//! its neighbours so the columns keep partitioning the usable region. Changes
//! the layout cannot absorb are undone by snapping the window back.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{DesktopTiling, LayoutCx, LayoutError, Request};
use crate::model::{Axes, Rect, WindowId};

bitflags! {
    /// What the host says changed about a window.
    #[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct Changes: u8 {
        const SIZE = 1 << 0;
        const POSITION = 1 << 1;
        const BORDER = 1 << 2;
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObservedChange {
    pub geometry: Rect,
    pub changes: Changes,
}

impl DesktopTiling {
    /// Handles a geometry notification for `wid`. Windows that are not tiled
    /// yet are inserted instead.
    pub fn on_geometry_changed(
        &mut self,
        cx: &mut LayoutCx<'_>,
        wid: WindowId,
        observed: ObservedChange,
    ) -> Result<(), LayoutError> {
        let Some((col, row)) = self.position_of(wid) else {
            self.insert_window(cx, wid);
            return Ok(());
        };
        if observed.changes.is_empty() {
            trace!(?wid, "nothing to do");
            return Ok(());
        }

        let cached = cx.overrides.require(wid)?;
        let geometry = observed.geometry;

        if self.columns.len() == 1 && self.columns[0].windows.len() == 1 {
            if !cx.host.maximized(wid).is_empty() {
                // The host's own maximized geometry wins.
                cx.overrides.insert(wid, geometry);
            } else {
                debug!(?wid, "lone window, re-maximizing");
                cx.push(Request::ClearMaximized(wid, Axes::BOTH));
                cx.push(Request::SetMaximized(wid, Axes::BOTH));
                if geometry != cached {
                    cx.set_geometry(wid, cached);
                }
            }
            return Ok(());
        }

        if geometry == cached {
            return Ok(());
        }

        if observed.changes.contains(Changes::BORDER | Changes::SIZE) {
            trace!(?wid, "border and size changed together, restoring");
            cx.set_geometry(wid, cached);
            return Ok(());
        }

        debug!(?wid, old = %cached, new = %geometry, "move or resize");

        let step = cx.host.declared_step_increment(wid);
        let (dw, dh) = (geometry.w - cached.w, geometry.h - cached.h);
        let (dx, dy) = (geometry.x - cached.x, geometry.y - cached.y);
        let mut settled = geometry;
        let mut touched = false;

        if dw != 0 && dw.abs() >= step.w.max(1) {
            self.resize_column(cx, col, dw);
            let now = cx.overrides.require(wid)?;
            (settled.x, settled.w) = (now.x, now.w);
            touched = true;
        }
        if dh != 0 && dh.abs() >= step.h.max(1) {
            self.resize_in_column(cx, col, row, dh)?;
            let now = cx.overrides.require(wid)?;
            (settled.y, settled.h) = (now.y, now.h);
            touched = true;
        }
        if dx != 0 {
            self.move_column(cx, col, dx);
            let now = cx.overrides.require(wid)?;
            (settled.x, settled.w) = (now.x, now.w);
            touched = true;
        }
        if dy != 0 {
            self.move_in_column(cx, col, row, dy)?;
            let now = cx.overrides.require(wid)?;
            (settled.y, settled.h) = (now.y, now.h);
            touched = true;
        }

        if touched {
            cx.set_geometry(wid, settled);
        }
        Ok(())
    }

    /// Moves the right edge of `col` by `delta`, taking the space from the
    /// column to its right.
    fn resize_column(&mut self, cx: &mut LayoutCx<'_>, col: usize, delta: i32) -> bool {
        let Some(right) = self.columns.get(col + 1) else {
            debug!(col, "not allowed to resize the last column");
            return false;
        };
        let own = &self.columns[col];
        let delta = delta.max(1 - own.width).min(right.width - 1);

        self.shift_column(cx, col, 0, delta);
        self.shift_column(cx, col + 1, delta, -delta);
        true
    }

    /// Moves the left edge of `col` by `delta`, giving the space to or taking
    /// it from the column to its left.
    fn move_column(&mut self, cx: &mut LayoutCx<'_>, col: usize, delta: i32) -> bool {
        if col == 0 {
            debug!("not allowed to move the first column");
            return false;
        }
        let (left, own) = (&self.columns[col - 1], &self.columns[col]);
        let delta = delta.max(1 - left.width).min(own.width - 1);

        self.shift_column(cx, col, delta, -delta);
        self.shift_column(cx, col - 1, 0, delta);
        true
    }

    /// Grows window `row` of `col` by `delta`, shrinking the window below it.
    fn resize_in_column(
        &self,
        cx: &mut LayoutCx<'_>,
        col: usize,
        row: usize,
        delta: i32,
    ) -> Result<bool, LayoutError> {
        let windows = &self.columns[col].windows;
        let Some(&next) = windows.get(row + 1) else {
            debug!(col, row, "not allowed to resize the last window of a column");
            return Ok(false);
        };
        let wid = windows[row];
        let mut own = cx.overrides.require(wid)?;
        let mut below = cx.overrides.require(next)?;

        let min_height = cx.host.declared_min_size(next).h.max(1);
        let delta = delta.min(below.h - min_height);

        below.y += delta;
        below.h -= delta;
        own.h += delta;
        cx.assign(next, below);
        cx.overrides.insert(wid, own);
        Ok(true)
    }

    /// Moves the top edge of window `row` of `col` by `delta`, resizing the
    /// window above it.
    fn move_in_column(
        &self,
        cx: &mut LayoutCx<'_>,
        col: usize,
        row: usize,
        delta: i32,
    ) -> Result<bool, LayoutError> {
        let windows = &self.columns[col].windows;
        if row == 0 {
            debug!(col, "not allowed to move the first window of a column");
            return Ok(false);
        }
        let (wid, prev) = (windows[row], windows[row - 1]);
        let mut own = cx.overrides.require(wid)?;
        let mut above = cx.overrides.require(prev)?;

        let above_min = cx.host.declared_min_size(prev).h.max(1);
        let own_min = cx.host.declared_min_size(wid).h.max(1);
        let delta = delta.max(above_min - above.h).min(own.h - own_min);

        above.h += delta;
        own.y += delta;
        own.h -= delta;
        cx.assign(prev, above);
        cx.overrides.insert(wid, own);
        Ok(true)
    }
}
