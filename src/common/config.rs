use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::common::collections::HashSet;
use crate::layout_engine::{LayoutConfig, MAX_COLUMNS};
use crate::sys::host::DesktopCoords;

const DEFAULT_CONFIG: &str = include_str!("../../rift-columns.default.toml");

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".rift-columns.toml")
}

pub fn default_config_text() -> &'static str { DEFAULT_CONFIG }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub desktops: Vec<DesktopSettings>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// When false, transient windows and dialogs keep their host placement.
    #[serde(default = "yes")]
    pub tile_dialogs: bool,
    #[serde(default = "default_tiling_border")]
    pub tiling_border: String,
    #[serde(default = "default_floating_border")]
    pub floating_border: String,
    /// Column count for desktops that have no entry of their own.
    #[serde(default = "default_columns")]
    pub default_columns: usize,
}

/// Column count for one desktop, keyed by its grid position and zone.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct DesktopSettings {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub zone: u32,
    pub columns: usize,
}

impl DesktopSettings {
    fn coords(&self) -> DesktopCoords {
        DesktopCoords {
            x: self.x,
            y: self.y,
            zone: self.zone,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tile_dialogs: true,
            tiling_border: default_tiling_border(),
            floating_border: default_floating_border(),
            default_columns: default_columns(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.default_columns > MAX_COLUMNS {
            issues.push(format!(
                "default_columns must not exceed {}, got {}",
                MAX_COLUMNS, self.default_columns
            ));
        }
        if self.tiling_border.trim().is_empty() {
            issues.push("tiling_border must not be empty".to_string());
        }
        if self.floating_border.trim().is_empty() {
            issues.push("floating_border must not be empty".to_string());
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.default_columns > MAX_COLUMNS {
            self.default_columns = MAX_COLUMNS;
            fixes += 1;
        }
        if self.tiling_border.trim().is_empty() {
            self.tiling_border = default_tiling_border();
            fixes += 1;
        }
        if self.floating_border.trim().is_empty() {
            self.floating_border = default_floating_border();
            fixes += 1;
        }

        fixes
    }
}

fn yes() -> bool { true }

fn default_tiling_border() -> String { "pixel".to_string() }

fn default_floating_border() -> String { "default".to_string() }

fn default_columns() -> usize { 2 }

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            desktops: Vec::new(),
        }
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Self::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())
            .with_context(|| format!("writing config {}", path.display()))?;

        Ok(())
    }

    /// Column layout for the desktop at `coords`, or `None` if tiling is
    /// disabled there.
    pub fn layout_for(&self, coords: DesktopCoords) -> Option<LayoutConfig> {
        let columns = self
            .desktops
            .iter()
            .find(|d| d.coords() == coords)
            .map(|d| d.columns)
            .unwrap_or(self.settings.default_columns);
        LayoutConfig::new(columns)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();

        let mut seen = HashSet::default();
        for (index, desktop) in self.desktops.iter().enumerate() {
            if desktop.columns > MAX_COLUMNS {
                issues.push(format!(
                    "Desktop entry {} asks for {} columns, at most {} are supported",
                    index, desktop.columns, MAX_COLUMNS
                ));
            }
            if !seen.insert(desktop.coords()) {
                issues.push(format!(
                    "Duplicate desktop entry {} for x={} y={} zone={}",
                    index, desktop.x, desktop.y, desktop.zone
                ));
            }
        }

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.settings.auto_fix_values();

        for desktop in &mut self.desktops {
            if desktop.columns > MAX_COLUMNS {
                desktop.columns = MAX_COLUMNS;
                fixes += 1;
            }
        }

        let before = self.desktops.len();
        let mut seen = HashSet::default();
        self.desktops.retain(|d| seen.insert(d.coords()));
        fixes += before - self.desktops.len();

        fixes
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }
}
