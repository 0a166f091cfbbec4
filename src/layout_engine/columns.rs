use ascii_tree::Tree;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::distribution::{carve, distribute, offsets};
use super::{LayoutConfig, LayoutCx, LayoutError, MAX_COLUMNS, Request};
use crate::common::collections::HashSet;
use crate::model::{Axes, DesktopId, GeometryOverrides, Rect, WindowId};

/// A vertical slice of the usable region. Windows are listed top to bottom
/// and all share the column's horizontal span.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Column {
    pub(super) x: i32,
    pub(super) width: i32,
    pub(super) windows: Vec<WindowId>,
}

impl Column {
    pub fn x(&self) -> i32 { self.x }

    pub fn width(&self) -> i32 { self.width }

    pub fn windows(&self) -> &[WindowId] { &self.windows }
}

/// Tiling state of one virtual desktop.
#[derive(Clone, Debug)]
pub struct DesktopTiling {
    desktop: DesktopId,
    /// Never holds an empty column; at most [`MAX_COLUMNS`] entries.
    pub(super) columns: Vec<Column>,
    pub(super) floating: HashSet<WindowId>,
    layout: Option<LayoutConfig>,
    need_rearrange: bool,
}

impl DesktopTiling {
    pub fn new(desktop: DesktopId, layout: Option<LayoutConfig>) -> Self {
        Self {
            desktop,
            columns: Vec::with_capacity(MAX_COLUMNS),
            floating: HashSet::default(),
            layout,
            need_rearrange: false,
        }
    }

    pub fn desktop(&self) -> DesktopId { self.desktop }

    pub fn layout(&self) -> Option<LayoutConfig> { self.layout }

    pub fn columns(&self) -> &[Column] { &self.columns }

    pub fn column(&self, index: usize) -> Option<&Column> { self.columns.get(index) }

    pub fn column_count(&self) -> usize { self.columns.len() }

    /// `(column, row)` of a tiled window.
    pub fn position_of(&self, wid: WindowId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(col, column)| {
            column.windows.iter().position(|&w| w == wid).map(|row| (col, row))
        })
    }

    pub fn column_of(&self, wid: WindowId) -> Option<usize> {
        self.position_of(wid).map(|(col, _)| col)
    }

    pub fn is_tiled(&self, wid: WindowId) -> bool { self.position_of(wid).is_some() }

    pub fn is_floating(&self, wid: WindowId) -> bool { self.floating.contains(&wid) }

    pub fn floating_windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.floating.iter().copied()
    }

    pub fn tiled_windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.columns.iter().flat_map(|c| c.windows.iter().copied())
    }

    pub(super) fn forget_floating(&mut self, wid: WindowId) -> bool { self.floating.remove(&wid) }

    pub fn need_rearrange(&self) -> bool { self.need_rearrange }

    pub fn mark_need_rearrange(&mut self) { self.need_rearrange = true; }

    /// Clears the deferred-rearrange flag, returning whether it was set.
    pub fn take_need_rearrange(&mut self) -> bool { std::mem::take(&mut self.need_rearrange) }

    fn is_untileable_dialog(&self, cx: &LayoutCx<'_>, wid: WindowId) -> bool {
        !cx.settings.tile_dialogs && (cx.host.is_transient(wid) || cx.host.is_dialog_type(wid))
    }

    /// Adds `wid` to the layout. Floating windows, untileable dialogs and
    /// desktops without tiling are left alone.
    pub fn insert_window(&mut self, cx: &mut LayoutCx<'_>, wid: WindowId) {
        if self.is_floating(wid) {
            debug!(?wid, "floating window");
            return;
        }
        if self.is_untileable_dialog(cx, wid) {
            debug!(?wid, "untileable dialog");
            return;
        }
        let Some(layout) = self.layout else {
            debug!(desktop = ?self.desktop, "no tiling");
            return;
        };
        if self.is_tiled(wid) {
            debug!(?wid, "already tiled");
            return;
        }
        let Some(current) = cx.host.window_geometry(wid) else {
            error!("{}", LayoutError::UnknownWindow(wid));
            return;
        };

        debug!(?wid, %current, "new window");
        cx.overrides.insert(wid, current);

        let settings = cx.settings;
        let border = &settings.tiling_border;
        if cx.host.decoration(wid).as_deref() != Some(border.as_str()) {
            cx.push(Request::SetDecoration(wid, border.clone()));
        }

        let region = cx.region;
        let maximized = cx.host.maximized(wid);
        if !self.columns.is_empty() && !maximized.is_empty() {
            cx.push(Request::ClearMaximized(wid, maximized));
        }
        if self.columns.is_empty() {
            cx.push(Request::ClearMaximized(wid, Axes::BOTH));
            cx.push(Request::SetMaximized(wid, Axes::BOTH));
            cx.overrides.insert(wid, region);
            self.columns.push(Column {
                x: region.x,
                width: region.w,
                windows: vec![wid],
            });
        } else if self.columns.len() < layout.columns {
            let count = self.columns.len();
            let slots = carve(region.x, region.w, count + 1);
            for (col, &(x, width)) in slots[..count].iter().enumerate() {
                self.set_column_geometry(cx, col, x, width);
            }

            let (x, width) = slots[count];
            cx.assign(wid, Rect::new(x, region.y, width, region.h));
            cx.push(Request::SetMaximized(wid, Axes::VERTICAL));
            self.columns.push(Column { x, width, windows: vec![wid] });
        } else {
            let col = self.columns.len() - 1;
            if let [sole] = self.columns[col].windows[..] {
                cx.push(Request::ClearMaximized(sole, Axes::BOTH));
            }
            self.columns[col].windows.push(wid);
            self.reorganize_column(cx, col);
        }
    }

    /// Takes `wid` out of the layout and closes the gap it leaves behind.
    pub fn remove_window(&mut self, cx: &mut LayoutCx<'_>, wid: WindowId) {
        let Some((col, row)) = self.position_of(wid) else {
            return;
        };
        debug!(?wid, col, row, "removing window");

        self.columns[col].windows.remove(row);
        cx.overrides.remove(wid);

        if !self.columns[col].windows.is_empty() {
            self.reorganize_column(cx, col);
            return;
        }

        self.columns.remove(col);
        let region = cx.region;
        let slots = carve(region.x, region.w, self.columns.len());
        for (col, (x, width)) in slots.into_iter().enumerate() {
            self.set_column_geometry(cx, col, x, width);
        }
    }

    /// Lays the whole desktop out from scratch: even column widths, even rows.
    pub fn relayout(&mut self, cx: &mut LayoutCx<'_>) {
        debug!(desktop = ?self.desktop, "rearranging");
        let region = cx.region;
        let slots = carve(region.x, region.w, self.columns.len());
        for (col, (x, width)) in slots.into_iter().enumerate() {
            self.set_column_geometry(cx, col, x, width);
            self.reorganize_column(cx, col);
        }
    }

    /// Spreads the usable height evenly over the occupants of `col`.
    pub(super) fn reorganize_column(&mut self, cx: &mut LayoutCx<'_>, col: usize) {
        let Some(column) = self.columns.get(col) else {
            return;
        };
        let region = cx.region;
        let count = column.windows.len();
        let rows = offsets(region.y, &distribute(region.h, count));

        for (&wid, (y, h)) in column.windows.iter().zip(rows) {
            if !cx.overrides.contains(wid) {
                error!("{}", LayoutError::MissingOverride(wid));
                continue;
            }
            if count != 1 && cx.host.maximized(wid).contains(Axes::VERTICAL) {
                cx.push(Request::ClearMaximized(wid, Axes::VERTICAL));
            }
            cx.assign(wid, Rect::new(column.x, y, column.width, h));
        }
    }

    /// Moves `col` to a new horizontal span, keeping each occupant's rows.
    pub(super) fn set_column_geometry(
        &mut self,
        cx: &mut LayoutCx<'_>,
        col: usize,
        x: i32,
        width: i32,
    ) {
        let Some(column) = self.columns.get_mut(col) else {
            return;
        };
        column.x = x;
        column.width = width;

        for &wid in &column.windows {
            let Some(current) = cx.overrides.get(wid) else {
                error!("{}", LayoutError::MissingOverride(wid));
                continue;
            };
            if cx.host.maximized(wid).contains(Axes::HORIZONTAL) {
                cx.push(Request::ClearMaximized(wid, Axes::HORIZONTAL));
            }
            cx.assign(wid, current.with_columns(x, width));
        }
    }

    /// Shifts `col` by `dx` and grows it by `dw`.
    pub(super) fn shift_column(&mut self, cx: &mut LayoutCx<'_>, col: usize, dx: i32, dw: i32) {
        let Some(column) = self.columns.get_mut(col) else {
            return;
        };
        column.x += dx;
        column.width += dw;

        for &wid in &column.windows {
            let Some(current) = cx.overrides.get(wid) else {
                error!("{}", LayoutError::MissingOverride(wid));
                continue;
            };
            cx.assign(wid, Rect {
                x: current.x + dx,
                w: current.w + dw,
                ..current
            });
        }
    }

    /// Forgets every window, e.g. at shutdown. Overrides are the caller's.
    pub(super) fn clear(&mut self) {
        self.columns.clear();
        self.floating.clear();
        self.need_rearrange = false;
    }

    /// Debug view of the desktop: a node per column listing its windows top
    /// to bottom, then the floating set.
    pub fn draw_tree(
        &self,
        title: String,
        overrides: &GeometryOverrides,
        label: impl Fn(WindowId) -> String,
    ) -> Tree {
        let describe = |wid| match overrides.get(wid) {
            Some(geometry) => format!("{} {geometry}", label(wid)),
            None => format!("{} (no override)", label(wid)),
        };
        let mut children: Vec<Tree> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                Tree::Node(format!("column {i} x={} width={}", column.x, column.width), vec![
                    Tree::Leaf(column.windows.iter().map(|&w| describe(w)).collect()),
                ])
            })
            .collect();
        if !self.floating.is_empty() {
            let mut floating: Vec<String> = self.floating.iter().map(|&w| label(w)).collect();
            floating.sort();
            children.push(Tree::Node("floating".to_string(), vec![Tree::Leaf(floating)]));
        }
        Tree::Node(title, children)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Settings;
    use crate::model::GeometryOverrides;
    use crate::sys::headless::HeadlessHost;

    pub(crate) const REGION: Rect = Rect::new(0, 0, 1000, 800);

    pub(crate) struct Fixture {
        pub host: HeadlessHost,
        pub overrides: GeometryOverrides,
        pub settings: Settings,
        pub state: DesktopTiling,
    }

    impl Fixture {
        pub fn new(columns: usize) -> Self {
            let mut host = HeadlessHost::new();
            let desktop = host.add_desktop("main", REGION);
            Self {
                host,
                overrides: GeometryOverrides::new(),
                settings: Settings::default(),
                state: DesktopTiling::new(desktop, LayoutConfig::new(columns)),
            }
        }

        pub fn window(&mut self) -> WindowId {
            let desktop = self.state.desktop();
            self.host.add_window(desktop, Rect::new(50, 50, 300, 200))
        }

        /// Runs `f` and applies what it asked for to the host.
        pub fn run<R>(&mut self, f: impl FnOnce(&mut DesktopTiling, &mut LayoutCx<'_>) -> R) -> R {
            let mut cx = LayoutCx::new(&self.host, &mut self.overrides, &self.settings, REGION);
            let result = f(&mut self.state, &mut cx);
            let requests = cx.into_requests();
            self.host.apply_all(requests);
            result
        }

        pub fn insert(&mut self, wid: WindowId) { self.run(|s, cx| s.insert_window(cx, wid)) }

        pub fn remove(&mut self, wid: WindowId) { self.run(|s, cx| s.remove_window(cx, wid)) }

        pub fn spans(&self) -> Vec<(i32, i32)> {
            self.state.columns().iter().map(|c| (c.x(), c.width())).collect()
        }

        pub fn geometry(&self, wid: WindowId) -> Rect { self.overrides.get(wid).unwrap() }
    }

    #[test]
    fn two_column_scenario() {
        let mut fx = Fixture::new(2);
        let a = fx.window();
        let b = fx.window();

        fx.insert(a);
        assert_eq!(fx.spans(), vec![(0, 1000)]);
        assert_eq!(fx.geometry(a), REGION);
        assert_eq!(fx.host.window(a).geometry, REGION);
        assert_eq!(fx.host.window(a).maximized, Axes::BOTH);
        assert_eq!(fx.host.window(a).decoration.as_deref(), Some("pixel"));

        fx.insert(b);
        assert_eq!(fx.spans(), vec![(0, 500), (500, 500)]);
        assert_eq!(fx.geometry(a), Rect::new(0, 0, 500, 800));
        assert_eq!(fx.geometry(b), Rect::new(500, 0, 500, 800));
        assert_eq!(fx.host.window(a).geometry, Rect::new(0, 0, 500, 800));
        assert_eq!(fx.host.window(a).maximized, Axes::VERTICAL);
        assert_eq!(fx.host.window(b).geometry, Rect::new(500, 0, 500, 800));

        fx.remove(a);
        assert_eq!(fx.spans(), vec![(0, 1000)]);
        assert_eq!(fx.state.column(0).unwrap().windows(), &[b]);
        assert_eq!(fx.geometry(b), Rect::new(0, 0, 1000, 800));
        assert!(!fx.overrides.contains(a));
    }

    #[test]
    fn width_partition_holds_for_every_column_count() {
        let mut fx = Fixture::new(MAX_COLUMNS);
        for k in 1..=MAX_COLUMNS {
            let wid = fx.window();
            fx.insert(wid);
            assert_eq!(fx.state.column_count(), k);

            let spans = fx.spans();
            assert_eq!(spans[0].0, REGION.x);
            assert_eq!(spans.iter().map(|(_, w)| w).sum::<i32>(), REGION.w);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].0 + pair[0].1, pair[1].0);
            }
            for column in fx.state.columns() {
                for &w in column.windows() {
                    assert_eq!(fx.geometry(w).x, column.x());
                    assert_eq!(fx.geometry(w).w, column.width());
                }
            }
        }
    }

    #[test]
    fn full_layout_stacks_into_last_column() {
        let mut fx = Fixture::new(2);
        let windows: Vec<_> = (0..5).map(|_| fx.window()).collect();
        for &w in &windows {
            fx.insert(w);
        }

        assert_eq!(fx.state.column_count(), 2);
        let last = fx.state.column(1).unwrap().windows().to_vec();
        assert_eq!(last, windows[1..].to_vec());

        let heights: Vec<i32> = last.iter().map(|&w| fx.geometry(w).h).collect();
        assert_eq!(heights, vec![200, 200, 200, 200]);
        let mut y = REGION.y;
        for &w in &last {
            assert_eq!(fx.geometry(w).y, y);
            assert!(fx.host.window(w).maximized.is_empty());
            y += fx.geometry(w).h;
        }
        assert_eq!(y, REGION.bottom());
    }

    #[test]
    fn height_partition_is_exact() {
        let mut fx = Fixture::new(1);
        for n in 1..=7 {
            let wid = fx.window();
            fx.insert(wid);
            let column = fx.state.column(0).unwrap().clone();
            assert_eq!(column.windows().len(), n);
            let heights: Vec<i32> = column.windows().iter().map(|&w| fx.geometry(w).h).collect();
            assert_eq!(heights.iter().sum::<i32>(), REGION.h);
            for h in heights {
                assert!((h * n as i32 - REGION.h).abs() < n as i32 + 1);
            }
        }
    }

    #[test]
    fn insert_then_remove_restores_columns() {
        let mut fx = Fixture::new(3);
        let a = fx.window();
        let b = fx.window();
        fx.insert(a);
        fx.insert(b);
        let before = fx.spans();
        let geometry_before = (fx.geometry(a), fx.geometry(b));

        let c = fx.window();
        fx.insert(c);
        assert_eq!(fx.spans(), vec![(0, 333), (333, 333), (666, 334)]);
        fx.remove(c);

        assert_eq!(fx.spans(), before);
        assert_eq!((fx.geometry(a), fx.geometry(b)), geometry_before);
    }

    #[test]
    fn insert_then_remove_restores_rows() {
        let mut fx = Fixture::new(1);
        let windows: Vec<_> = (0..3).map(|_| fx.window()).collect();
        for &w in &windows {
            fx.insert(w);
        }
        let before: Vec<Rect> = windows.iter().map(|&w| fx.geometry(w)).collect();

        let extra = fx.window();
        fx.insert(extra);
        fx.remove(extra);

        let after: Vec<Rect> = windows.iter().map(|&w| fx.geometry(w)).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn removing_a_middle_column_compacts() {
        let mut fx = Fixture::new(3);
        let windows: Vec<_> = (0..3).map(|_| fx.window()).collect();
        for &w in &windows {
            fx.insert(w);
        }

        fx.remove(windows[1]);
        assert_eq!(fx.spans(), vec![(0, 500), (500, 500)]);
        assert_eq!(fx.state.column(1).unwrap().windows(), &[windows[2]]);
        assert_eq!(fx.geometry(windows[2]), Rect::new(500, 0, 500, 800));
    }

    #[test]
    fn preconditions_leave_the_window_alone() {
        let mut fx = Fixture::new(2);
        fx.settings.tile_dialogs = false;

        let dialog = fx.window();
        fx.host.window_mut(dialog).dialog = true;
        fx.insert(dialog);

        let transient = fx.window();
        fx.host.window_mut(transient).transient = true;
        fx.insert(transient);

        let floating = fx.window();
        fx.state.floating.insert(floating);
        fx.insert(floating);

        assert_eq!(fx.state.column_count(), 0);
        assert!(fx.overrides.is_empty());
        assert!(fx.host.requests().is_empty());

        let mut disabled = Fixture::new(0);
        let w = disabled.window();
        disabled.insert(w);
        assert_eq!(disabled.state.column_count(), 0);
        assert!(disabled.host.requests().is_empty());
    }

    #[test]
    fn dialogs_tile_when_enabled() {
        let mut fx = Fixture::new(2);
        let dialog = fx.window();
        fx.host.window_mut(dialog).dialog = true;
        fx.insert(dialog);
        assert!(fx.state.is_tiled(dialog));
    }

    #[test]
    fn decoration_is_only_set_when_different() {
        let mut fx = Fixture::new(2);
        let w = fx.window();
        fx.host.window_mut(w).decoration = Some("pixel".to_string());
        fx.insert(w);
        assert!(!fx.host.requests().iter().any(|r| matches!(r, Request::SetDecoration(..))));
    }

    #[test]
    fn missing_override_only_skips_that_window() {
        let mut fx = Fixture::new(1);
        let a = fx.window();
        let b = fx.window();
        fx.insert(a);
        fx.insert(b);
        fx.overrides.remove(a);

        let c = fx.window();
        fx.insert(c);
        assert_eq!(fx.geometry(b), Rect::new(0, 266, 1000, 267));
        assert_eq!(fx.geometry(c), Rect::new(0, 533, 1000, 267));
        assert!(!fx.overrides.contains(a));
    }

    #[test]
    fn relayout_evens_out_columns_and_rows() {
        let mut fx = Fixture::new(2);
        let windows: Vec<_> = (0..3).map(|_| fx.window()).collect();
        for &w in &windows {
            fx.insert(w);
        }
        fx.run(|s, cx| s.shift_column(cx, 0, 0, 100));
        fx.run(|s, cx| s.shift_column(cx, 1, 100, -100));
        assert_eq!(fx.spans(), vec![(0, 600), (600, 400)]);

        fx.run(|s, cx| s.relayout(cx));
        assert_eq!(fx.spans(), vec![(0, 500), (500, 500)]);
        assert_eq!(fx.geometry(windows[2]), Rect::new(500, 400, 500, 400));
    }

    #[test]
    fn draw_tree_lists_columns_and_floating_windows() {
        let mut fx = Fixture::new(2);
        let [a, b, c] = [fx.window(), fx.window(), fx.window()];
        fx.insert(a);
        fx.insert(b);
        fx.state.floating.insert(c);

        let names = |w: WindowId| {
            let name = if w == a { "a" } else if w == b { "b" } else { "c" };
            name.to_string()
        };
        let mut out = String::new();
        ascii_tree::write_tree(&mut out, &fx.state.draw_tree("main".into(), &fx.overrides, names))
            .unwrap();

        assert!(out.contains("main"));
        assert!(out.contains("column 0 x=0 width=500"));
        assert!(out.contains("a 500x800+0+0"));
        assert!(out.contains("b 500x800+500+0"));
        assert!(out.contains("floating"));
        assert!(out.contains(" c"));
    }
}
