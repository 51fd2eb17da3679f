use crate::map::LayerKind;
use crate::shell::NoticeLevel;
use eframe::egui::Color32;

/// Map a layer kind to an egui colour.
pub fn color_for_kind(kind: LayerKind) -> Color32 {
    match kind {
        LayerKind::Vector => Color32::from_rgb(80, 200, 80),
        LayerKind::Raster => Color32::from_rgb(220, 80, 220),
        LayerKind::Store => Color32::from_rgb(100, 180, 255),
    }
}

/// Get an icon string for a layer.
pub fn icon_for_kind(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Vector => "\u{1F4CD}",
        LayerKind::Raster => "\u{1F5BC}\u{FE0F}",
        LayerKind::Store => "\u{1F5C4}",
    }
}

/// Human-readable type label.
pub fn type_label(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Vector => "Vector file",
        LayerKind::Raster => "Raster file",
        LayerKind::Store => "Store dataset",
    }
}

pub fn notice_color(level: NoticeLevel) -> Color32 {
    match level {
        NoticeLevel::Info => Color32::from_rgb(220, 220, 220),
        NoticeLevel::Error => Color32::from_rgb(255, 80, 80),
    }
}
