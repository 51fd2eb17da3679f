use crate::gui::colors::notice_color;
use crate::progress::ProgressState;
use crate::shell::Notice;
use eframe::egui;

// ============================================================================
// Progress dialog
// ============================================================================

/// Returns true when Cancel was pressed.
pub fn show_progress_dialog(ctx: &egui::Context, progress: &ProgressState) -> bool {
    let snapshot = progress.snapshot();
    let mut cancel = false;

    egui::Window::new(progress.title())
        .id(egui::Id::new("import_progress"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_width(360.0)
        .show(ctx, |ui| {
            ui.label(&snapshot.message);
            ui.add_space(4.0);
            ui.add(
                egui::ProgressBar::new((snapshot.percent / 100.0) as f32)
                    .show_percentage()
                    .desired_width(340.0),
            );
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if snapshot.cancel_requested {
                    ui.spinner();
                    ui.label("Canceling...");
                } else if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    cancel
}

// ============================================================================
// Notice dialog
// ============================================================================

/// Returns false once the user acknowledged the notice.
pub fn show_notice_dialog(ctx: &egui::Context, notice: &Notice) -> bool {
    let mut open = true;
    let mut acknowledged = false;

    egui::Window::new(notice.title.as_str())
        .id(egui::Id::new("notice"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .open(&mut open)
        .show(ctx, |ui| {
            for line in notice.text.lines() {
                if line.is_empty() {
                    ui.add_space(4.0);
                } else {
                    ui.colored_label(notice_color(notice.level), line);
                }
            }
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                acknowledged = true;
            }
        });

    open && !acknowledged
}

// ============================================================================
// Confirm dialog
// ============================================================================

/// Returns `Some(true)` for confirmed, `Some(false)` for cancelled, `None` while open.
pub fn show_confirm_dialog(ctx: &egui::Context, message: &str) -> Option<bool> {
    let mut result: Option<bool> = None;
    let mut open = true;

    egui::Window::new("Confirm")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Yes").clicked() {
                    result = Some(true);
                }
                if ui.button("No").clicked() {
                    result = Some(false);
                }
            });
        });

    if !open {
        return Some(false);
    }
    result
}

// ============================================================================
// About dialog
// ============================================================================

pub fn about_lines() -> Vec<String> {
    vec![
        format!("Version {}", crate::VERSION),
        String::new(),
        "Map viewer over a local vector store".to_string(),
        format!("Store format version {}", crate::store::FORMAT_VERSION),
    ]
}

pub fn show_info_dialog(ctx: &egui::Context, title: &str, lines: &[String]) -> bool {
    let mut open = true;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("NgView");
                for line in lines {
                    if line.is_empty() {
                        ui.add_space(4.0);
                    } else {
                        ui.label(line);
                    }
                }
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    open = false;
                }
            });
        });

    open
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn about_mentions_versions() {
        let lines = about_lines();
        assert!(lines[0].contains(crate::VERSION));
        assert!(lines.iter().any(|l| l.starts_with("Store format version")));
    }
}
