//! Main NgView window

use crate::gui::colors::{color_for_kind, icon_for_kind, type_label};
use crate::gui::dialogs;
use crate::gui::menu::{shortcut_actions, Action, MENUS};
use crate::gui::settings::ShellSettings;
use crate::gui::table::{ClickMode, LayerListState};
use crate::map::{MapDocument, DOCUMENT_EXTENSION};
use crate::shell::Shell;
use crate::store::container::{is_container_path, DATASET_EXTENSION};
use crate::store::loader::VECTOR_EXTENSIONS;
use eframe::egui;
use rfd::FileDialog;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Drag payload: position of the layer row being dragged
struct LayerDrag(usize);

/// Main application state
pub struct GuiApp {
    shell: Shell,
    /// Persisted layout
    settings: ShellSettings,
    /// Layer list selection
    layers: LayerListState,
    /// Rows waiting for removal confirmation
    confirm_remove: Option<Vec<usize>>,
    /// Show about dialog
    show_about: bool,
}

impl GuiApp {
    pub fn new(cc: &eframe::CreationContext<'_>, mut shell: Shell) -> Self {
        let ctx = cc.egui_ctx.clone();
        shell.imports_mut().set_waker(move || ctx.request_repaint());

        Self {
            shell,
            settings: ShellSettings::load(cc.storage),
            layers: LayerListState::default(),
            confirm_remove: None,
            show_about: false,
        }
    }

    /// Run one action. Menus, shortcuts and context menus all end up here.
    fn dispatch(&mut self, ctx: &egui::Context, action: Action) {
        debug!(?action, "dispatch");
        match action {
            Action::NewDocument => {
                self.shell.new_document();
                self.layers.clear();
            }
            Action::OpenDocument => {
                if let Some(path) = self
                    .file_dialog()
                    .add_filter("NgView map", &[DOCUMENT_EXTENSION])
                    .pick_file()
                {
                    self.settings.remember(&path);
                    if self.shell.open_document(&path) {
                        self.layers.clear();
                    }
                }
            }
            Action::SaveDocument => {
                let file_name = document_file_name(self.shell.map().document());
                if let Some(path) = self
                    .file_dialog()
                    .add_filter("NgView map", &[DOCUMENT_EXTENSION])
                    .set_file_name(file_name)
                    .save_file()
                {
                    self.settings.remember(&path);
                    self.shell.save_document(&path);
                }
            }
            Action::Exit => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Action::LoadData => {
                if let Some(path) = self
                    .file_dialog()
                    .add_filter("GeoJSON", VECTOR_EXTENSIONS)
                    .pick_file()
                {
                    self.settings.remember(&path);
                    // Failure is queued as a notice
                    let _ = self.shell.load_data(&path);
                }
            }
            Action::AddLayer => {
                let store = self.shell.session().store_path().to_path_buf();
                if let Some(path) = self
                    .file_dialog()
                    .add_filter("Vector data", &["geojson", "json", DATASET_EXTENSION])
                    .set_directory(&store)
                    .pick_file()
                {
                    self.shell.add_layer(&layer_source(path));
                }
            }
            Action::RemoveLayers => {
                let rows = self.layers.selected_rows();
                if !rows.is_empty() {
                    self.confirm_remove = Some(rows);
                }
            }
            Action::ToggleStatusBar => {
                self.settings.status_bar_shown = !self.settings.status_bar_shown;
            }
            Action::ToggleLayersPanel => {
                self.settings.layers_panel_shown = !self.settings.layers_panel_shown;
            }
            Action::About => {
                self.show_about = true;
            }
        }
    }

    fn file_dialog(&self) -> FileDialog {
        match &self.settings.last_directory {
            Some(dir) => FileDialog::new().set_directory(dir),
            None => FileDialog::new(),
        }
    }

    fn is_enabled(&self, action: Action) -> bool {
        match action {
            Action::LoadData => !self.shell.imports().is_running(),
            Action::RemoveLayers => !self.layers.selections.is_empty(),
            _ => true,
        }
    }

    fn is_checked(&self, action: Action) -> Option<bool> {
        match action {
            Action::ToggleStatusBar => Some(self.settings.status_bar_shown),
            Action::ToggleLayersPanel => Some(self.settings.layers_panel_shown),
            _ => None,
        }
    }

    /// True while a dialog owns the input
    fn is_modal(&self) -> bool {
        self.shell.imports().progress().is_some()
            || self.shell.current_notice().is_some()
            || self.confirm_remove.is_some()
            || self.show_about
    }

    fn handle_shortcuts(&self, ctx: &egui::Context) -> Vec<Action> {
        if self.is_modal() {
            return Vec::new();
        }
        shortcut_actions()
            .filter(|(action, _)| self.is_enabled(*action))
            .filter(|(_, shortcut)| ctx.input_mut(|i| i.consume_shortcut(shortcut)))
            .map(|(action, _)| action)
            .collect()
    }

    /// Render menu bar
    fn render_menu(&self, ctx: &egui::Context) -> Option<Action> {
        let mut clicked = None;
        let modal = self.is_modal();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.add_enabled_ui(!modal, |ui| {
                egui::menu::bar(ui, |ui| {
                    for menu in MENUS {
                        ui.menu_button(menu.title, |ui| {
                            for entry in menu.entries {
                                let Some(action) = entry else {
                                    ui.separator();
                                    continue;
                                };
                                if self.menu_entry(ui, *action) {
                                    clicked = Some(*action);
                                    ui.close_menu();
                                }
                            }
                        });
                    }
                });
            });
        });

        clicked
    }

    fn menu_entry(&self, ui: &mut egui::Ui, action: Action) -> bool {
        let response = if let Some(mut checked) = self.is_checked(action) {
            ui.checkbox(&mut checked, action.label())
        } else {
            let mut button = egui::Button::new(action.label());
            if let Some(shortcut) = action.shortcut() {
                button = button.shortcut_text(ui.ctx().format_shortcut(&shortcut));
            }
            ui.add_enabled(self.is_enabled(action), button)
        };
        response.on_hover_text(action.status_tip()).clicked()
    }

    /// Render status bar
    fn render_status_bar(&self, ctx: &egui::Context) {
        if !self.settings.status_bar_shown {
            return;
        }
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(progress) = self.shell.imports().progress() {
                    ui.spinner();
                    let snapshot = progress.snapshot();
                    ui.label(format!("{:.0}% {}", snapshot.percent, snapshot.message));
                    ui.separator();
                }
                ui.label(self.shell.status_text());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("{} layers", self.shell.map().layer_count()));
                });
            });
        });
    }

    /// Render the layer list side panel
    fn render_layers_panel(&mut self, ctx: &egui::Context) -> Option<Action> {
        if !self.settings.layers_panel_shown {
            return None;
        }
        let mut action = None;
        let mut visibility: Option<(usize, bool)> = None;
        let mut add_source: Option<PathBuf> = None;
        let mut moved: Option<(usize, usize)> = None;
        let layer_count = self.shell.map().layer_count();

        let panel = egui::SidePanel::left("layers")
            .resizable(true)
            .default_width(self.settings.layers_panel_width)
            .show(ctx, |ui| {
                ui.heading("Layers");
                ui.separator();

                egui::ScrollArea::vertical()
                    .auto_shrink([false, true])
                    .max_height(ui.available_height() - 32.0)
                    .show(ui, |ui| {
                        for (row, layer) in self.shell.map().layers().iter().enumerate() {
                            let row_response = ui.horizontal(|ui| {
                                ui.dnd_drag_source(egui::Id::new(("layer_drag", row)), LayerDrag(row), |ui| {
                                    ui.weak("\u{2261}");
                                });
                                let mut visible = layer.visible;
                                if ui.checkbox(&mut visible, "").changed() {
                                    visibility = Some((row, visible));
                                }
                                ui.colored_label(color_for_kind(layer.kind), icon_for_kind(layer.kind));

                                let response = ui
                                    .selectable_label(self.layers.is_selected(row), &layer.name)
                                    .on_hover_text(format!(
                                        "{}\n{}",
                                        type_label(layer.kind),
                                        layer.source.display()
                                    ));
                                if response.clicked() {
                                    let mode = ClickMode::from_modifiers(&ui.input(|i| i.modifiers));
                                    self.layers.click(row, mode);
                                }
                                response.context_menu(|ui| {
                                    if ui.add_enabled(row > 0, egui::Button::new("Move up")).clicked() {
                                        moved = Some((row, row - 1));
                                        ui.close_menu();
                                    }
                                    if ui
                                        .add_enabled(row + 1 < layer_count, egui::Button::new("Move down"))
                                        .clicked()
                                    {
                                        moved = Some((row, row + 1));
                                        ui.close_menu();
                                    }
                                    ui.separator();
                                    if ui.button("Select all").clicked() {
                                        self.layers.select_all(layer_count);
                                        ui.close_menu();
                                    }
                                    if ui.button("Remove").clicked() {
                                        if !self.layers.is_selected(row) {
                                            self.layers.click(row, ClickMode::Replace);
                                        }
                                        action = Some(Action::RemoveLayers);
                                        ui.close_menu();
                                    }
                                });
                            })
                            .response;

                            if let Some(dragged) = row_response.dnd_hover_payload::<LayerDrag>() {
                                if dragged.0 != row {
                                    let y = if dragged.0 < row {
                                        row_response.rect.bottom()
                                    } else {
                                        row_response.rect.top()
                                    };
                                    ui.painter().hline(
                                        row_response.rect.x_range(),
                                        y,
                                        ui.visuals().selection.stroke,
                                    );
                                }
                            }
                            if let Some(dragged) = row_response.dnd_release_payload::<LayerDrag>() {
                                moved = Some((dragged.0, row));
                            }
                        }
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    ui.menu_button("Add from store", |ui| {
                        let store = self.shell.session().store_path();
                        match self.shell.session().catalog().container_info(store) {
                            Ok(info) if !info.datasets.is_empty() => {
                                for dataset in &info.datasets {
                                    let label = format!("{} ({})", dataset.name, dataset.feature_count);
                                    if ui.button(label).clicked() {
                                        add_source = Some(store.join(&dataset.name));
                                        ui.close_menu();
                                    }
                                }
                            }
                            Ok(_) => {
                                ui.label("Store is empty");
                            }
                            Err(e) => {
                                ui.label(e.to_string());
                            }
                        }
                    });
                    if ui.button(Action::AddLayer.label()).clicked() {
                        action = Some(Action::AddLayer);
                    }
                });
            });
        self.settings.layers_panel_width = panel.response.rect.width();

        if let Some((row, visible)) = visibility {
            self.shell.set_layer_visible(row, visible);
        }
        if let Some(source) = add_source {
            self.shell.add_layer(&source);
        }
        if let Some((from, to)) = moved {
            if self.shell.move_layer(from, to) {
                self.layers.row_moved(from, to);
            }
        }
        action
    }

    /// Render the map view
    fn render_map_view(&self, ui: &mut egui::Ui) {
        use egui_extras::{Column, TableBuilder};

        let document = self.shell.map().document();
        ui.heading(&document.name);
        match document.path() {
            Some(path) => ui.label(path.display().to_string()),
            None => ui.weak("Not saved"),
        };
        if !document.description.is_empty() {
            ui.label(&document.description);
        }
        ui.separator();

        let layers = self.shell.map().layers();
        if layers.is_empty() {
            ui.weak("No layers. Load data into the store, then add a layer.");
            return;
        }

        let available_height = ui.available_height();
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(60.0).at_least(20.0))
            .column(Column::initial(180.0).at_least(40.0).clip(true))
            .column(Column::initial(110.0).at_least(40.0))
            .column(Column::remainder().at_least(40.0).clip(true))
            .min_scrolled_height(0.0)
            .max_scroll_height(available_height)
            .header(20.0, |mut header| {
                for title in ["Visible", "Name", "Type", "Source"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, layers.len(), |mut row| {
                    let layer = &layers[row.index()];
                    row.set_selected(self.layers.is_selected(row.index()));
                    row.col(|ui| {
                        ui.label(if layer.visible { "\u{2714}" } else { "" });
                    });
                    row.col(|ui| {
                        ui.label(&layer.name);
                    });
                    row.col(|ui| {
                        ui.colored_label(color_for_kind(layer.kind), type_label(layer.kind));
                    });
                    row.col(|ui| {
                        ui.label(layer.source.display().to_string());
                    });
                });
            });
    }

    /// Render whichever dialog is on top
    fn render_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(progress) = self.shell.imports().progress().cloned() {
            if dialogs::show_progress_dialog(ctx, &progress) {
                self.shell.cancel_import();
            }
            return;
        }

        if let Some(notice) = self.shell.current_notice().cloned() {
            if !dialogs::show_notice_dialog(ctx, &notice) {
                self.shell.dismiss_notice();
            }
            return;
        }

        if let Some(rows) = &self.confirm_remove {
            let message = format!("Remove {} selected layer(s)?", rows.len());
            if let Some(confirmed) = dialogs::show_confirm_dialog(ctx, &message) {
                if confirmed {
                    self.shell.remove_layers(rows);
                    self.layers.clear();
                }
                self.confirm_remove = None;
            }
            return;
        }

        if self.show_about {
            self.show_about = dialogs::show_info_dialog(ctx, "About NgView", &dialogs::about_lines());
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.shell.poll();
        self.layers.retain_within(self.shell.map().layer_count());

        let mut actions = self.handle_shortcuts(ctx);
        actions.extend(self.render_menu(ctx));
        self.render_status_bar(ctx);
        actions.extend(self.render_layers_panel(ctx));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_map_view(ui);
        });

        self.render_dialogs(ctx);

        for action in actions {
            self.dispatch(ctx, action);
        }

        if self.shell.imports().is_running() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else {
            // Timed status messages expire without input
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings.store(storage);
    }
}

/// Suggested file name for saving a document
fn document_file_name(document: &MapDocument) -> String {
    match document.path().and_then(|p| p.file_name()) {
        Some(name) => name.to_string_lossy().into_owned(),
        None => format!("{}.{}", document.name, DOCUMENT_EXTENSION),
    }
}

/// A dataset file picked inside a container stands for the dataset itself
fn layer_source(picked: PathBuf) -> PathBuf {
    let in_container = picked.parent().is_some_and(is_container_path);
    let is_dataset = picked
        .extension()
        .is_some_and(|ext| ext == DATASET_EXTENSION);
    if in_container && is_dataset {
        picked.with_extension("")
    } else {
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_dataset_file_maps_to_dataset() {
        let picked = PathBuf::from("/data/main.ngst/parks.jsonl");
        assert_eq!(layer_source(picked), PathBuf::from("/data/main.ngst/parks"));

        let plain = PathBuf::from("/data/parks.geojson");
        assert_eq!(layer_source(plain.clone()), plain);
    }

    #[test]
    fn untitled_document_suggests_name() {
        let document = MapDocument::new();
        assert_eq!(document_file_name(&document), "Untitled.ngmd");
    }
}
