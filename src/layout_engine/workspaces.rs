use tracing::debug;

use super::{DesktopTiling, LayoutConfig};
use crate::common::collections::{BTreeSet, HashMap, hash_map};
use crate::model::{DesktopId, WindowId};

/// Tiling state for every desktop seen so far.
///
/// States are created on first reference and live until [`clear`](Self::clear)
/// at shutdown; switching away from a desktop keeps its layout.
#[derive(Debug, Default)]
pub struct DesktopRegistry {
    map: HashMap<DesktopId, DesktopTiling>,
    /// Desktop the last event was about.
    active: Option<DesktopId>,
}

impl DesktopRegistry {
    pub fn new() -> Self { Self::default() }

    /// State for `desktop`, creating it with `layout()` if needed.
    pub fn ensure(
        &mut self,
        desktop: DesktopId,
        layout: impl FnOnce() -> Option<LayoutConfig>,
    ) -> &mut DesktopTiling {
        match self.map.entry(desktop) {
            hash_map::Entry::Occupied(entry) => entry.into_mut(),
            hash_map::Entry::Vacant(entry) => {
                let layout = layout();
                debug!(?desktop, ?layout, "new desktop state");
                entry.insert(DesktopTiling::new(desktop, layout))
            }
        }
    }

    /// Like [`ensure`](Self::ensure), and remembers `desktop` as active.
    pub fn activate(
        &mut self,
        desktop: DesktopId,
        layout: impl FnOnce() -> Option<LayoutConfig>,
    ) -> &mut DesktopTiling {
        if self.active != Some(desktop) {
            debug!(?desktop, previous = ?self.active, "switching active desktop state");
            self.active = Some(desktop);
        }
        self.ensure(desktop, layout)
    }

    pub fn active(&self) -> Option<DesktopId> { self.active }

    pub fn get(&self, desktop: DesktopId) -> Option<&DesktopTiling> { self.map.get(&desktop) }

    pub fn get_mut(&mut self, desktop: DesktopId) -> Option<&mut DesktopTiling> {
        self.map.get_mut(&desktop)
    }

    /// Desktop whose layout currently holds `wid`. The active desktop is
    /// checked first.
    pub fn locate_window(&self, wid: WindowId) -> Option<DesktopId> {
        let active = self.active.and_then(|d| self.map.get(&d));
        if let Some(state) = active {
            if state.is_tiled(wid) {
                return Some(state.desktop());
            }
        }
        self.map.values().find(|s| s.is_tiled(wid)).map(|s| s.desktop())
    }

    /// Records that `wid` was sent to `desktop`: that desktop needs a
    /// rearrange when it is next used, and every other desktop drops the
    /// window from its floating set.
    pub fn window_reassigned(&mut self, wid: WindowId, desktop: DesktopId) {
        for state in self.map.values_mut() {
            if state.desktop() == desktop {
                state.mark_need_rearrange();
                debug!(?desktop, "need_rearrange set");
            } else if state.forget_floating(wid) {
                debug!(?wid, from = ?state.desktop(), "left floating set");
            }
        }
    }

    /// Drops `wid` from every floating set. Returns whether it was in one.
    pub fn forget_floating(&mut self, wid: WindowId) -> bool {
        let mut found = false;
        for state in self.map.values_mut() {
            found |= state.forget_floating(wid);
        }
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = &DesktopTiling> { self.map.values() }

    pub fn desktops(&self) -> BTreeSet<DesktopId> { self.map.keys().copied().collect() }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn clear(&mut self) {
        for state in self.map.values_mut() {
            state.clear();
        }
        self.map.clear();
        self.active = None;
    }
}
