use super::{Event, Reactor};
use crate::common::config::Config;
use crate::layout_engine::{Changes, ObservedChange};
use crate::model::{DesktopId, Rect, WindowId};
use crate::sys::headless::HeadlessHost;

pub const REGION: Rect = Rect::new(0, 0, 1000, 800);

/// A reactor over `desktops` identical headless desktops, tiling with
/// `columns` columns everywhere.
pub fn new_reactor(columns: usize, desktops: usize) -> (Reactor<HeadlessHost>, Vec<DesktopId>) {
    let mut host = HeadlessHost::new();
    let ids = (0..desktops).map(|i| host.add_desktop(&format!("desk{i}"), REGION)).collect();
    let mut config = Config::default();
    config.settings.default_columns = columns;
    (Reactor::new(config, host), ids)
}

/// Creates a window on `desktop` and tells the reactor it is ready.
pub fn open_window(reactor: &mut Reactor<HeadlessHost>, desktop: DesktopId) -> WindowId {
    let wid = reactor.host_mut().add_window(desktop, Rect::new(50, 50, 300, 200));
    reactor.handle_event(Event::WindowReady(wid));
    wid
}

/// Pretends the user dragged `wid` to `geometry`.
pub fn user_changes(
    reactor: &mut Reactor<HeadlessHost>,
    wid: WindowId,
    geometry: Rect,
    changes: Changes,
) {
    reactor.host_mut().window_mut(wid).geometry = geometry;
    reactor.handle_event(Event::WindowGeometryChanged(wid, ObservedChange { geometry, changes }));
}
