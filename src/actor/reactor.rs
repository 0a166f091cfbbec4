//! The Reactor owns the engine's state and keeps it coherent with the host.
//!
//! It takes notifications from the host, resolves the desktop they concern,
//! runs the matching layout operation and applies the requests that come
//! back. It can be driven directly through [`Reactor::handle_event`] or as an
//! actor draining a [`Receiver`].

mod events;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use self::events::command::CommandEventHandler;
use self::events::desktop::DesktopEventHandler;
use self::events::window::WindowEventHandler;
use crate::actor;
use crate::common::config::Config;
use crate::layout_engine::{
    DesktopRegistry, DesktopTiling, LayoutConfig, LayoutCx, ObservedChange,
};
use crate::model::{DesktopId, GeometryOverrides, WindowId};
use crate::sys::host::Host;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub enum Event {
    /// A window finished its initial setup, or was re-evaluated by the host
    /// (for example after becoming visible again).
    WindowReady(WindowId),
    WindowHidden(WindowId),
    /// The user or the host moved, resized or redecorated a window.
    WindowGeometryChanged(WindowId, ObservedChange),
    /// A desktop switch is starting. Windows hidden until the matching
    /// `DesktopShow` are being switched away, not closed.
    DesktopBeforeShow(DesktopId),
    DesktopShow(DesktopId),
    /// A window was assigned to a desktop.
    WindowDesktopSet {
        window: WindowId,
        desktop: DesktopId,
    },
    Command(Command),
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub enum Command {
    /// Toggles the given window, or the focused one.
    ToggleFloating(Option<WindowId>),
    /// Logs the current layout of every known desktop.
    Debug,
    SaveConfig,
}

pub struct Reactor<H> {
    config: Config,
    config_path: Option<PathBuf>,
    host: H,
    desktops: DesktopRegistry,
    overrides: GeometryOverrides,
    /// Set between `DesktopBeforeShow` and `DesktopShow`.
    currently_switching_desktop: bool,
}

impl<H: Host> Reactor<H> {
    pub fn new(config: Config, host: H) -> Self {
        Reactor {
            config,
            config_path: None,
            host,
            desktops: DesktopRegistry::new(),
            overrides: GeometryOverrides::new(),
            currently_switching_desktop: false,
        }
    }

    /// Where [`Command::SaveConfig`] writes to.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn desktops(&self) -> &DesktopRegistry { &self.desktops }

    pub fn overrides(&self) -> &GeometryOverrides { &self.overrides }

    pub fn is_switching_desktop(&self) -> bool { self.currently_switching_desktop }

    /// Drains `events` in order until every sender is gone.
    pub async fn run(mut self, mut events: Receiver) -> Self {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
        self
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::WindowGeometryChanged(..) => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event=?event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);
        match event {
            Event::WindowReady(wid) => WindowEventHandler::handle_window_ready(self, wid),
            Event::WindowHidden(wid) => WindowEventHandler::handle_window_hidden(self, wid),
            Event::WindowGeometryChanged(wid, observed) => {
                WindowEventHandler::handle_geometry_changed(self, wid, observed)
            }
            Event::DesktopBeforeShow(desktop) => {
                DesktopEventHandler::handle_before_show(self, desktop)
            }
            Event::DesktopShow(desktop) => DesktopEventHandler::handle_show(self, desktop),
            Event::WindowDesktopSet { window, desktop } => {
                DesktopEventHandler::handle_window_desktop_set(self, window, desktop)
            }
            Event::Command(cmd) => CommandEventHandler::handle_command(self, cmd),
        }
    }

    pub fn handle_events(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.handle_event(event);
        }
    }

    /// Tiles `wid` on the desktop the host says it is on.
    pub fn insert_window(&mut self, wid: WindowId) {
        let Some(desktop) = self.host.desktop_of(wid) else {
            debug!(?wid, "window has no desktop");
            return;
        };
        self.with_desktop(desktop, |state, cx| state.insert_window(cx, wid));
    }

    /// Removes `wid` from whichever desktop currently tiles it.
    pub fn remove_window(&mut self, wid: WindowId) {
        let Some(desktop) = self.desktops.locate_window(wid) else {
            trace!(?wid, "window is not tiled");
            return;
        };
        self.with_desktop(desktop, |state, cx| state.remove_window(cx, wid));
    }

    /// Toggles `wid`, or the host's focused window, between tiled and
    /// floating.
    pub fn toggle_floating(&mut self, wid: Option<WindowId>) {
        let Some(wid) = wid.or_else(|| self.host.focused_window()) else {
            debug!("no window to toggle");
            return;
        };
        let Some(desktop) = self.host.desktop_of(wid) else {
            debug!(?wid, "window has no desktop");
            return;
        };
        self.evict_elsewhere(wid, desktop);
        self.with_desktop(desktop, |state, cx| state.toggle_floating(cx, wid));
    }

    /// Drops every desktop state and override. The reactor can keep running
    /// afterwards; desktops are rebuilt as they are referenced again.
    pub fn shutdown(&mut self) {
        info!(desktops = self.desktops.len(), windows = self.overrides.len(), "shutting down");
        self.desktops.clear();
        self.overrides.clear();
        self.currently_switching_desktop = false;
    }

    pub fn draw_layout(&self) -> String {
        self.draw_layout_with(|desktop| format!("{desktop:?}"), |wid| format!("{wid:?}"))
    }

    /// Like [`draw_layout`](Self::draw_layout) with caller-chosen labels.
    pub fn draw_layout_with(
        &self,
        desktop_label: impl Fn(DesktopId) -> String,
        window_label: impl Fn(WindowId) -> String,
    ) -> String {
        let mut out = String::new();
        for desktop in self.desktops.desktops() {
            let Some(state) = self.desktops.get(desktop) else { continue };
            let tree = state.draw_tree(desktop_label(desktop), &self.overrides, &window_label);
            // Writing into a String cannot fail.
            _ = ascii_tree::write_tree(&mut out, &tree);
        }
        out
    }

    fn resolve_layout(&self, desktop: DesktopId) -> Option<LayoutConfig> {
        match self.host.desktop_coords(desktop) {
            Some(coords) => self.config.layout_for(coords),
            None => LayoutConfig::new(self.config.settings.default_columns),
        }
    }

    /// Makes sure a state exists for `desktop` without consuming a pending
    /// rearrange.
    fn ensure_desktop(&mut self, desktop: DesktopId) -> &mut DesktopTiling {
        let layout = self.resolve_layout(desktop);
        self.desktops.ensure(desktop, || layout)
    }

    /// Removes `wid` from any desktop other than `desktop` that still tiles
    /// it, so a window is never laid out twice.
    fn evict_elsewhere(&mut self, wid: WindowId, desktop: DesktopId) {
        if let Some(stale) = self.desktops.locate_window(wid).filter(|&d| d != desktop) {
            debug!(?wid, ?stale, "window left its desktop");
            self.with_desktop(stale, |state, cx| state.remove_window(cx, wid));
        }
    }

    /// Runs `f` on `desktop`'s state and applies the requests it produced.
    /// A pending rearrange of that desktop is carried out first.
    fn with_desktop<R>(
        &mut self,
        desktop: DesktopId,
        f: impl FnOnce(&mut DesktopTiling, &mut LayoutCx<'_>) -> R,
    ) -> R {
        let layout = self.resolve_layout(desktop);
        let region = self.host.usable_region(desktop);
        let state = self.desktops.activate(desktop, || layout);
        let mut cx = LayoutCx::new(&self.host, &mut self.overrides, &self.config.settings, region);
        if state.take_need_rearrange() {
            state.relayout(&mut cx);
        }
        let result = f(state, &mut cx);
        let requests = cx.into_requests();
        for request in requests {
            trace!(?request, "applying");
            self.host.apply(request);
        }
        result
    }
}
