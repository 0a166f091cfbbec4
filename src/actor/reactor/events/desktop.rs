use tracing::debug;

use crate::actor::reactor::Reactor;
use crate::model::{DesktopId, WindowId};
use crate::sys::host::Host;

pub struct DesktopEventHandler;

impl DesktopEventHandler {
    pub fn handle_before_show<H: Host>(reactor: &mut Reactor<H>, desktop: DesktopId) {
        debug!(?desktop, "desktop switch started");
        reactor.currently_switching_desktop = true;
    }

    /// Ends a desktop switch. A rearrange deferred while the desktop was
    /// hidden is carried out now.
    pub fn handle_show<H: Host>(reactor: &mut Reactor<H>, desktop: DesktopId) {
        reactor.currently_switching_desktop = false;
        reactor.with_desktop(desktop, |_, _| ());
    }

    pub fn handle_window_desktop_set<H: Host>(
        reactor: &mut Reactor<H>,
        window: WindowId,
        desktop: DesktopId,
    ) {
        reactor.ensure_desktop(desktop);
        reactor.desktops.window_reassigned(window, desktop);
    }
}
