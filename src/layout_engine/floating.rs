use tracing::debug;

use super::{DesktopTiling, LayoutCx, Request};
use crate::model::{Axes, WindowId};

impl DesktopTiling {
    /// Moves `wid` between the tiled layout and this desktop's floating set.
    ///
    /// A window that leaves the layout gets the floating decoration back and
    /// is maximized so the user sees something happen. A window that comes
    /// back is appended to the end of the layout like a new one.
    pub fn toggle_floating(&mut self, cx: &mut LayoutCx<'_>, wid: WindowId) {
        if self.floating.remove(&wid) {
            debug!(?wid, "floating -> tiled");
            self.insert_window(cx, wid);
        } else {
            debug!(?wid, "tiled -> floating");
            self.floating.insert(wid);
            self.remove_window(cx, wid);
            cx.push(Request::SetMaximized(wid, Axes::BOTH));
            cx.push(Request::SetDecoration(wid, cx.settings.floating_border.clone()));
        }
    }
}
