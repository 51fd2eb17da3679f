pub mod app;
pub mod colors;
pub mod dialogs;
pub mod menu;
pub mod settings;
pub mod table;

use crate::logging::{self, LogTarget};
use crate::shell::Shell;
use crate::store::Session;
use crate::{AppConfig, NgViewError};

/// Entry point: initialize the store and launch the native GUI window.
///
/// A store initialization failure is returned before any window exists.
pub fn run(config: AppConfig) -> crate::Result<()> {
    logging::init(LogTarget::file_in(&config.data_dir), config.debug_mode);

    let session = Session::init(config)?;
    let shell = Shell::new(session);

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("NgView")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "NgView",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::GuiApp::new(cc, shell)))),
    )
    .map_err(|e| NgViewError::Gui(e.to_string()))
}

/// Blocking error box for failures that happen before the window opens
pub fn show_fatal_error(err: &NgViewError) {
    tracing::error!("{}", err);
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("NgView")
        .set_description(err.to_string())
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
