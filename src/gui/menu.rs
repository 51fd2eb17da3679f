//! Menu actions
//!
//! Every command the window offers is an [`Action`]. The menu bar is built
//! from the static [`MENUS`] table and keyboard shortcuts are matched against
//! the same actions, so both paths end up in `GuiApp::dispatch`.

use eframe::egui::{Key, KeyboardShortcut, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NewDocument,
    OpenDocument,
    SaveDocument,
    Exit,
    LoadData,
    AddLayer,
    RemoveLayers,
    ToggleStatusBar,
    ToggleLayersPanel,
    About,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::NewDocument => "New",
            Action::OpenDocument => "Open...",
            Action::SaveDocument => "Save...",
            Action::Exit => "Exit",
            Action::LoadData => "Load...",
            Action::AddLayer => "Add layer...",
            Action::RemoveLayers => "Remove layers",
            Action::ToggleStatusBar => "Status bar",
            Action::ToggleLayersPanel => "Layers panel",
            Action::About => "About",
        }
    }

    /// Text shown on hover
    pub fn status_tip(&self) -> &'static str {
        match self {
            Action::NewDocument => "Create new map document",
            Action::OpenDocument => "Open map document",
            Action::SaveDocument => "Save map document",
            Action::Exit => "Exit application",
            Action::LoadData => "Load vector data into the store",
            Action::AddLayer => "Add a layer from a store dataset or file",
            Action::RemoveLayers => "Remove selected layers",
            Action::ToggleStatusBar => "Show or hide the status bar",
            Action::ToggleLayersPanel => "Show or hide the layers panel",
            Action::About => "Show information about the application",
        }
    }

    pub fn shortcut(&self) -> Option<KeyboardShortcut> {
        let command = |key| Some(KeyboardShortcut::new(Modifiers::COMMAND, key));
        match self {
            Action::NewDocument => command(Key::N),
            Action::OpenDocument => command(Key::O),
            Action::SaveDocument => command(Key::S),
            Action::Exit => command(Key::Q),
            Action::LoadData => command(Key::L),
            Action::AddLayer => command(Key::A),
            Action::RemoveLayers => Some(KeyboardShortcut::new(Modifiers::NONE, Key::Delete)),
            Action::ToggleStatusBar | Action::ToggleLayersPanel | Action::About => None,
        }
    }
}

/// A top-level menu. `None` entries are separators.
pub struct Menu {
    pub title: &'static str,
    pub entries: &'static [Option<Action>],
}

pub static MENUS: &[Menu] = &[
    Menu {
        title: "File",
        entries: &[
            Some(Action::NewDocument),
            Some(Action::OpenDocument),
            Some(Action::SaveDocument),
            None,
            Some(Action::Exit),
        ],
    },
    Menu {
        title: "Data",
        entries: &[Some(Action::LoadData)],
    },
    Menu {
        title: "Map",
        entries: &[Some(Action::AddLayer), Some(Action::RemoveLayers)],
    },
    Menu {
        title: "View",
        entries: &[Some(Action::ToggleStatusBar), Some(Action::ToggleLayersPanel)],
    },
    Menu {
        title: "Help",
        entries: &[Some(Action::About)],
    },
];

/// Actions that carry a keyboard shortcut
pub fn shortcut_actions() -> impl Iterator<Item = (Action, KeyboardShortcut)> {
    MENUS
        .iter()
        .flat_map(|menu| menu.entries.iter().flatten())
        .filter_map(|action| action.shortcut().map(|sc| (*action, sc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_action_appears_once() {
        let actions: Vec<Action> = MENUS
            .iter()
            .flat_map(|m| m.entries.iter().flatten().copied())
            .collect();
        let unique: HashSet<_> = actions.iter().collect();
        assert_eq!(actions.len(), unique.len());
        assert_eq!(actions.len(), 10);
    }

    #[test]
    fn shortcuts_do_not_collide() {
        let shortcuts: Vec<_> = shortcut_actions().map(|(_, sc)| sc).collect();
        for (i, a) in shortcuts.iter().enumerate() {
            assert!(!shortcuts[i + 1..].contains(a));
        }
        assert!(shortcut_actions().any(|(a, _)| a == Action::RemoveLayers));
    }
}
