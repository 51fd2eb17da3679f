//! Map model: the current document and its layer list

use crate::error::{NgViewError, Result};
use crate::map::document::{Layer, MapDocument};
use std::path::Path;
use tracing::{debug, info};

/// Holds the open map document. Mutated only from the interactive thread.
#[derive(Debug, Default)]
pub struct MapModel {
    document: MapDocument,
}

impl MapModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &MapDocument {
        &self.document
    }

    pub fn layers(&self) -> &[Layer] {
        &self.document.layers
    }

    pub fn layer_count(&self) -> usize {
        self.document.layers.len()
    }

    /// Replace the document with an empty one
    pub fn create(&mut self) {
        self.document = MapDocument::new();
        info!(map = %self.document.id(), "new map document");
    }

    /// Open a document. The current one is replaced only if the file loads
    /// and validates completely.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let document = MapDocument::load(path)?;
        info!(map = %document.id(), path = %path.display(), layers = document.layers.len(), "map opened");
        self.document = document;
        Ok(())
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.document.save(path)?;
        info!(map = %self.document.id(), path = %path.display(), "map saved");
        Ok(())
    }

    /// Append a layer; returns its position
    pub fn create_layer(&mut self, name: &str, source: &Path) -> Result<usize> {
        if name.trim().is_empty() {
            return Err(NgViewError::InvalidDocument("layer name must not be empty".to_string()));
        }
        self.document.layers.push(Layer::new(name, source));
        debug!(name, source = %source.display(), "layer added");
        Ok(self.document.layers.len() - 1)
    }

    pub fn delete_layer(&mut self, position: usize) -> Option<Layer> {
        if position < self.document.layers.len() {
            Some(self.document.layers.remove(position))
        } else {
            None
        }
    }

    /// Delete every layer at `positions`, all taken as positions in the list
    /// before any removal. Duplicates and out-of-range positions are ignored.
    /// Returns the removed layers in list order.
    pub fn delete_layers(&mut self, positions: &[usize]) -> Vec<Layer> {
        let mut positions: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.document.layers.len())
            .collect();
        positions.sort_unstable();
        positions.dedup();

        // Highest first, so earlier positions stay valid
        let mut removed: Vec<Layer> = positions
            .iter()
            .rev()
            .filter_map(|&p| self.delete_layer(p))
            .collect();
        removed.reverse();
        removed
    }

    /// Move the layer at `from` so it ends up at `to`. Both are positions in
    /// the current list; returns false if either is out of range.
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        let count = self.document.layers.len();
        if from >= count || to >= count {
            return false;
        }
        if from != to {
            let layer = self.document.layers.remove(from);
            self.document.layers.insert(to, layer);
            debug!(from, to, "layer moved");
        }
        true
    }

    pub fn set_layer_visible(&mut self, position: usize, visible: bool) {
        if let Some(layer) = self.document.layers.get_mut(position) {
            layer.visible = visible;
        }
    }
}
