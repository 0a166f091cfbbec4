//! The host side: the window environment the engine drives.

pub mod headless;
pub mod host;
pub mod script;
