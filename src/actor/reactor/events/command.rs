use tracing::{error, info, warn};

use crate::actor::reactor::{Command, Reactor};
use crate::sys::host::Host;

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_command<H: Host>(reactor: &mut Reactor<H>, cmd: Command) {
        info!(?cmd);
        match cmd {
            Command::ToggleFloating(wid) => reactor.toggle_floating(wid),
            Command::Debug => info!("layout:\n{}", reactor.draw_layout()),
            Command::SaveConfig => Self::handle_save_config(reactor),
        }
    }

    fn handle_save_config<H: Host>(reactor: &Reactor<H>) {
        let Some(path) = reactor.config_path.as_deref() else {
            warn!("no configuration path to save to");
            return;
        };
        match reactor.config.save(path) {
            Ok(()) => info!(path = %path.display(), "configuration saved"),
            Err(e) => error!("failed to save configuration: {e:#}"),
        }
    }
}
