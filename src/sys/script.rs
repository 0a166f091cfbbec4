//! Scenario scripts for the [`HeadlessHost`].
//!
//! A script declares desktops and windows by name and then lists what the
//! "user" does. Each step is turned into host changes plus the notifications
//! a real window manager would send, and fed to a [`Reactor`] through its
//! actor channel.

use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::headless::HeadlessHost;
use super::host::{DesktopCoords, Host, WindowQuery};
use crate::actor;
use crate::actor::reactor::{Command, Event, Reactor};
use crate::common::collections::{BTreeMap, HashSet};
use crate::common::config::Config;
use crate::layout_engine::{Changes, ObservedChange};
use crate::model::{Axes, DesktopId, Rect, Size, WindowId};

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub desktops: Vec<DesktopSpec>,
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DesktopSpec {
    pub name: String,
    pub region: Rect,
    /// Grid position used to look up per-desktop settings. Defaults to the
    /// desktop's index along x.
    #[serde(default)]
    pub coords: Option<DesktopCoords>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct WindowSpec {
    pub name: String,
    pub desktop: String,
    /// Defaults to the top left quarter of the desktop.
    #[serde(default)]
    pub geometry: Option<Rect>,
    #[serde(default)]
    pub dialog: bool,
    #[serde(default)]
    pub transient: bool,
    #[serde(default)]
    pub step: Size,
    #[serde(default)]
    pub min_size: Size,
}

#[derive(Deserialize, Clone, Debug)]
pub enum Step {
    /// The window appears.
    Map(String),
    Hide(String),
    /// The user moves the window's top left corner.
    Move(String, i32, i32),
    /// The user resizes the window, keeping its top left corner.
    Resize(String, Size),
    Focus(String),
    /// Toggles the focused window.
    ToggleFloating,
    SendToDesktop(String, String),
    ShowDesktop(String),
    /// Logs the layout at this point.
    Debug,
}

/// A [`Step`] with its names resolved.
#[derive(Clone, Copy, Debug)]
enum Action {
    Map(WindowId),
    Hide(WindowId),
    Move(WindowId, i32, i32),
    Resize(WindowId, Size),
    Focus(WindowId),
    ToggleFloating,
    SendToDesktop(WindowId, DesktopId),
    ShowDesktop(DesktopId),
    Debug,
}

/// A parsed script with its host built and every name resolved.
pub struct Scenario {
    host: HeadlessHost,
    actions: Vec<Action>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Scenario> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("loading script {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Scenario> {
        let script: Script = ron::from_str(text).context("parsing script")?;
        Self::build(script)
    }

    pub fn build(script: Script) -> anyhow::Result<Scenario> {
        if script.desktops.is_empty() {
            bail!("a script needs at least one desktop");
        }

        let mut host = HeadlessHost::new();
        let mut desktops = BTreeMap::new();
        for (index, spec) in script.desktops.iter().enumerate() {
            let coords = spec.coords.unwrap_or(DesktopCoords {
                x: index as i32,
                ..DesktopCoords::default()
            });
            let id = host.add_desktop_at(&spec.name, spec.region, coords);
            if desktops.insert(spec.name.clone(), id).is_some() {
                bail!("desktop {:?} is declared twice", spec.name);
            }
        }

        let mut windows = BTreeMap::new();
        for spec in &script.windows {
            let desktop = lookup(&desktops, &spec.desktop, "desktop")?;
            let region = host.usable_region(desktop);
            let geometry = spec
                .geometry
                .unwrap_or(Rect::new(region.x, region.y, region.w / 2, region.h / 2));
            let wid = host.add_named_window(&spec.name, desktop, geometry);
            let window = host.window_mut(wid);
            window.dialog = spec.dialog;
            window.transient = spec.transient;
            window.step = spec.step;
            window.min_size = spec.min_size;
            if windows.insert(spec.name.clone(), wid).is_some() {
                bail!("window {:?} is declared twice", spec.name);
            }
        }

        let window = |name: &str| lookup(&windows, name, "window");
        let desktop = |name: &str| lookup(&desktops, name, "desktop");
        let resolve = |step: &Step| -> anyhow::Result<Action> {
            Ok(match step {
                Step::Map(w) => Action::Map(window(w)?),
                Step::Hide(w) => Action::Hide(window(w)?),
                Step::Move(w, x, y) => Action::Move(window(w)?, *x, *y),
                Step::Resize(w, size) => Action::Resize(window(w)?, *size),
                Step::Focus(w) => Action::Focus(window(w)?),
                Step::ToggleFloating => Action::ToggleFloating,
                Step::SendToDesktop(w, d) => Action::SendToDesktop(window(w)?, desktop(d)?),
                Step::ShowDesktop(d) => Action::ShowDesktop(desktop(d)?),
                Step::Debug => Action::Debug,
            })
        };
        let actions = script
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                resolve(step).with_context(|| format!("step {} ({step:?})", index + 1))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Scenario { host, actions })
    }

    /// Plays every step against a fresh reactor and returns it.
    pub async fn run(self, config: Config) -> Reactor<HeadlessHost> {
        let Scenario { host, actions } = self;
        info!(steps = actions.len(), "running scenario");

        let (tx, rx) = actor::channel();
        for action in actions {
            tx.send(action);
        }
        drop(tx);

        let shown = host.desktops().next().map(|(id, _)| id);
        let driver = Driver {
            reactor: Reactor::new(config, host),
            shown,
            mapped: HashSet::default(),
        };
        driver.run(rx).await
    }
}

fn lookup<Id: Copy>(ids: &BTreeMap<String, Id>, name: &str, kind: &str) -> anyhow::Result<Id> {
    match ids.get(name) {
        Some(&id) => Ok(id),
        None => bail!("unknown {kind} {name:?}"),
    }
}

/// Plays the part of the window manager: applies each action to the host and
/// sends the reactor the notifications it would have sent.
struct Driver {
    reactor: Reactor<HeadlessHost>,
    /// Desktop currently on screen.
    shown: Option<DesktopId>,
    mapped: HashSet<WindowId>,
}

impl Driver {
    async fn run(mut self, mut actions: actor::Receiver<Action>) -> Reactor<HeadlessHost> {
        while let Some((span, action)) = actions.recv().await {
            let _guard = span.enter();
            let events = self.perform(action);
            self.reactor.handle_events(events);
        }
        self.reactor
    }

    fn perform(&mut self, action: Action) -> Vec<Event> {
        debug!(?action, "step");
        match action {
            Action::Map(wid) => {
                self.mapped.insert(wid);
                vec![Event::WindowReady(wid)]
            }
            Action::Hide(wid) => {
                self.mapped.remove(&wid);
                vec![Event::WindowHidden(wid)]
            }
            Action::Move(wid, x, y) => {
                self.user_changes(wid, |g| Rect { x, y, ..g }).into_iter().collect()
            }
            Action::Resize(wid, size) => {
                self.user_changes(wid, |g| Rect { w: size.w, h: size.h, ..g })
                    .into_iter()
                    .collect()
            }
            Action::Focus(wid) => {
                self.reactor.host_mut().set_focused(Some(wid));
                vec![]
            }
            Action::ToggleFloating => vec![Event::Command(Command::ToggleFloating(None))],
            Action::SendToDesktop(wid, desktop) => {
                self.reactor.host_mut().window_mut(wid).desktop = desktop;
                let mut events = vec![Event::WindowDesktopSet { window: wid, desktop }];
                if self.shown != Some(desktop) && self.mapped.contains(&wid) {
                    events.push(Event::WindowHidden(wid));
                }
                events
            }
            Action::ShowDesktop(desktop) => self.show_desktop(desktop),
            Action::Debug => vec![Event::Command(Command::Debug)],
        }
    }

    /// Applies a user edit to `wid`, the way dragging a window border would.
    fn user_changes(&mut self, wid: WindowId, edit: impl FnOnce(Rect) -> Rect) -> Option<Event> {
        let host = self.reactor.host_mut();
        let before = host.window(wid).geometry;
        let geometry = edit(before);
        let mut changes = Changes::empty();
        if (geometry.x, geometry.y) != (before.x, before.y) {
            changes |= Changes::POSITION;
        }
        if geometry.size() != before.size() {
            changes |= Changes::SIZE;
        }
        if changes.is_empty() {
            return None;
        }
        // A user edit drops any maximized state.
        host.clear_maximized(wid, Axes::BOTH);
        host.window_mut(wid).geometry = geometry;
        Some(Event::WindowGeometryChanged(wid, ObservedChange { geometry, changes }))
    }

    fn show_desktop(&mut self, desktop: DesktopId) -> Vec<Event> {
        let on = |d: Option<DesktopId>| {
            let host = self.reactor.host();
            host.windows()
                .filter(|(wid, w)| self.mapped.contains(wid) && Some(w.desktop) == d)
                .map(|(wid, _)| wid)
                .collect::<Vec<_>>()
        };

        let mut events = vec![Event::DesktopBeforeShow(desktop)];
        if self.shown != Some(desktop) {
            events.extend(on(self.shown).into_iter().map(Event::WindowHidden));
        }
        events.push(Event::DesktopShow(desktop));
        events.extend(on(Some(desktop)).into_iter().map(Event::WindowReady));
        self.shown = Some(desktop);
        events
    }
}

/// Renders every desktop's layout using the names from the script.
pub fn draw(reactor: &Reactor<HeadlessHost>) -> String {
    let host = reactor.host();
    reactor.draw_layout_with(
        |desktop| host.desktop(desktop).map_or_else(|| format!("{desktop:?}"), |d| d.name.clone()),
        |wid| window_name(host, wid),
    )
}

fn window_name(host: &HeadlessHost, wid: WindowId) -> String {
    host.windows()
        .find(|(id, _)| *id == wid)
        .map_or_else(|| format!("{wid:?}"), |(_, w)| w.name.clone())
}

#[derive(Serialize, Debug)]
pub struct Snapshot {
    pub desktops: Vec<DesktopSnapshot>,
}

#[derive(Serialize, Debug)]
pub struct DesktopSnapshot {
    pub name: String,
    pub columns: Vec<ColumnSnapshot>,
    pub floating: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct ColumnSnapshot {
    pub x: i32,
    pub width: i32,
    pub windows: Vec<WindowSnapshot>,
}

#[derive(Serialize, Debug)]
pub struct WindowSnapshot {
    pub name: String,
    pub geometry: Rect,
    pub maximized: Axes,
}

/// Machine-readable view of the final state, as seen by the host.
pub fn snapshot(reactor: &Reactor<HeadlessHost>) -> Snapshot {
    let host = reactor.host();
    let registry = reactor.desktops();
    let desktops = registry
        .desktops()
        .into_iter()
        .filter_map(|id| registry.get(id))
        .map(|state| {
            let columns = state
                .columns()
                .iter()
                .map(|column| ColumnSnapshot {
                    x: column.x(),
                    width: column.width(),
                    windows: column
                        .windows()
                        .iter()
                        .map(|&wid| WindowSnapshot {
                            name: window_name(host, wid),
                            geometry: host.window_geometry(wid).unwrap_or_default(),
                            maximized: host.maximized(wid),
                        })
                        .collect(),
                })
                .collect();
            let mut floating: Vec<String> =
                state.floating_windows().map(|wid| window_name(host, wid)).collect();
            floating.sort();
            DesktopSnapshot {
                name: host
                    .desktop(state.desktop())
                    .map_or_else(|| format!("{:?}", state.desktop()), |d| d.name.clone()),
                columns,
                floating,
            }
        })
        .collect();
    Snapshot { desktops }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn play(text: &str) -> Reactor<HeadlessHost> {
        let scenario = Scenario::parse(text).unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(scenario.run(Config::default()))
    }

    fn spans(snapshot: &Snapshot, desktop: usize) -> Vec<(i32, i32)> {
        snapshot.desktops[desktop].columns.iter().map(|c| (c.x, c.width)).collect()
    }

    const TWO_WINDOWS: &str = r#"Script(
        desktops: [(name: "main", region: (x: 0, y: 0, w: 1000, h: 800))],
        windows: [
            (name: "a", desktop: "main"),
            (name: "b", desktop: "main", min_size: (w: 0, h: 100)),
        ],
        steps: [Map("a"), Map("b"), Resize("a", (w: 600, h: 800))],
    )"#;

    #[test]
    fn resize_is_propagated_through_the_script() {
        let reactor = play(TWO_WINDOWS);
        let snapshot = snapshot(&reactor);
        assert_eq!(spans(&snapshot, 0), vec![(0, 600), (600, 400)]);
        let b = &snapshot.desktops[0].columns[1].windows[0];
        assert_eq!(b.name, "b");
        assert_eq!(b.geometry, Rect::new(600, 0, 400, 800));
        assert!(draw(&reactor).contains("a 600x800+0+0"));
    }

    #[test]
    fn floating_and_desktop_moves() {
        let reactor = play(
            r#"(
            desktops: [
                (name: "one", region: (x: 0, y: 0, w: 1000, h: 800)),
                (name: "two", region: (x: 0, y: 0, w: 1000, h: 800)),
            ],
            windows: [(name: "a", desktop: "one"), (name: "b", desktop: "one"), (name: "c", desktop: "one")],
            steps: [
                Map("a"), Map("b"), Map("c"),
                Focus("c"), ToggleFloating,
                SendToDesktop("b", "two"),
                ShowDesktop("two"),
            ],
        )"#,
        );
        let snapshot = snapshot(&reactor);
        assert_eq!(snapshot.desktops.len(), 2);
        let one = &snapshot.desktops[0];
        assert_eq!(one.name, "one");
        assert_eq!(one.floating, vec!["c".to_string()]);
        assert_eq!(spans(&snapshot, 0), vec![(0, 1000)]);
        assert_eq!(snapshot.desktops[1].columns[0].windows[0].name, "b");
        assert_eq!(snapshot.desktops[1].columns[0].windows[0].geometry, Rect::new(0, 0, 1000, 800));
    }

    #[test]
    fn switching_desktops_keeps_hidden_layouts() {
        let reactor = play(
            r#"(
            desktops: [
                (name: "one", region: (x: 0, y: 0, w: 1000, h: 800)),
                (name: "two", region: (x: 0, y: 0, w: 1000, h: 800)),
            ],
            windows: [(name: "a", desktop: "one"), (name: "b", desktop: "one")],
            steps: [Map("a"), Map("b"), ShowDesktop("two"), ShowDesktop("one")],
        )"#,
        );
        let snapshot = snapshot(&reactor);
        assert_eq!(spans(&snapshot, 0), vec![(0, 500), (500, 500)]);
        assert!(!reactor.is_switching_desktop());
    }

    #[test]
    fn unknown_names_are_reported_with_their_step() {
        let err = Scenario::parse(
            r#"(
            desktops: [(name: "main", region: (x: 0, y: 0, w: 10, h: 10))],
            windows: [(name: "a", desktop: "main")],
            steps: [Map("a"), Hide("nope")],
        )"#,
        )
        .err()
        .unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("step 2"), "{message}");
        assert!(message.contains("unknown window \"nope\""), "{message}");
    }

    #[test]
    fn scripts_are_validated() {
        assert!(Scenario::parse("(desktops: [])").is_err());
        assert!(
            Scenario::parse(
                r#"(desktops: [(name: "main", region: (x: 0, y: 0, w: 10, h: 10))],
                    windows: [(name: "a", desktop: "elsewhere")])"#
            )
            .is_err()
        );
        assert!(Scenario::parse("(desktops: [], bogus: 1)").is_err());
    }

    #[test]
    fn window_defaults_come_from_the_desktop() {
        let scenario = Scenario::parse(
            r#"(
            desktops: [(name: "main", region: (x: 0, y: 20, w: 1000, h: 780), coords: Some((x: 1, y: 2, zone: 0)))],
            windows: [(name: "a", desktop: "main")],
        )"#,
        )
        .unwrap();
        let (wid, window) = scenario.host.windows().next().unwrap();
        assert_eq!(window.geometry, Rect::new(0, 20, 500, 390));
        let desktop = scenario.host.desktop_of(wid).unwrap();
        assert_eq!(
            scenario.host.desktop_coords(desktop),
            Some(DesktopCoords { x: 1, y: 2, zone: 0 })
        );
    }
}
