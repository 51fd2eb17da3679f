//! Internal data store
//!
//! Containers (`*.ngst`) hold imported vector datasets. The catalog resolves
//! objects, creates containers and runs imports; the session owns the
//! catalog for the lifetime of the process.

pub mod catalog;
pub mod container;
pub mod loader;
pub mod options;
pub mod session;

pub use catalog::{Catalog, ImportSummary};
pub use container::{ContainerInfo, DatasetInfo, FORMAT_VERSION};
pub use options::{CreateOptions, LoadOptions};
pub use session::Session;
