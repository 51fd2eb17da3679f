//! NgView GUI Entry Point
//!
//! Launches the map viewer window with the default configuration.

#![windows_subsystem = "windows"]

use ngview::{gui, AppConfig};

fn main() {
    if let Err(e) = gui::run(AppConfig::default()) {
        gui::show_fatal_error(&e);
        std::process::exit(1);
    }
}
