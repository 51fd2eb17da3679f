//! Map documents and the layer model

pub mod document;
pub mod model;

pub use document::{Layer, LayerKind, MapDocument, MapId, DOCUMENT_EXTENSION};
pub use model::MapModel;
