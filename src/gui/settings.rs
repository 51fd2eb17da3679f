//! Persisted window layout

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage key for the main window settings
pub const SETTINGS_KEY: &str = "MainWindow";

pub const DEFAULT_PANEL_WIDTH: f32 = 240.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    pub status_bar_shown: bool,
    pub layers_panel_shown: bool,
    pub layers_panel_width: f32,
    /// Directory the last file dialog ended in
    pub last_directory: Option<PathBuf>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            status_bar_shown: true,
            layers_panel_shown: true,
            layers_panel_width: DEFAULT_PANEL_WIDTH,
            last_directory: None,
        }
    }
}

impl ShellSettings {
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        storage
            .and_then(|s| eframe::get_value(s, SETTINGS_KEY))
            .unwrap_or_default()
    }

    pub fn store(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, SETTINGS_KEY, self);
    }

    /// Remember the directory of a picked file
    pub fn remember(&mut self, picked: &std::path::Path) {
        if let Some(parent) = picked.parent() {
            self.last_directory = Some(parent.to_path_buf());
        }
    }
}
