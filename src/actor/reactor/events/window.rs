use tracing::{debug, error};

use crate::actor::reactor::Reactor;
use crate::layout_engine::ObservedChange;
use crate::model::WindowId;
use crate::sys::host::Host;

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_window_ready<H: Host>(reactor: &mut Reactor<H>, wid: WindowId) {
        let Some(desktop) = reactor.host.desktop_of(wid) else {
            debug!(?wid, "ready window has no desktop");
            return;
        };
        reactor.evict_elsewhere(wid, desktop);
        reactor.with_desktop(desktop, |state, cx| state.insert_window(cx, wid));
    }

    pub fn handle_window_hidden<H: Host>(reactor: &mut Reactor<H>, wid: WindowId) {
        if reactor.currently_switching_desktop {
            debug!(?wid, "hidden by a desktop switch");
            return;
        }
        reactor.desktops.forget_floating(wid);
        reactor.remove_window(wid);
    }

    pub fn handle_geometry_changed<H: Host>(
        reactor: &mut Reactor<H>,
        wid: WindowId,
        observed: ObservedChange,
    ) {
        let Some(desktop) = reactor.host.desktop_of(wid) else {
            debug!(?wid, "changed window has no desktop");
            return;
        };
        reactor.evict_elsewhere(wid, desktop);
        let result =
            reactor.with_desktop(desktop, |state, cx| state.on_geometry_changed(cx, wid, observed));
        if let Err(err) = result {
            error!(%err, "geometry change not propagated");
        }
    }
}
