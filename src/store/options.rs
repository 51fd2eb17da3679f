//! Options for store operations
//!
//! Options can be built directly or parsed from `KEY=VALUE` pairs, the form
//! the CLI accepts with `-o`.

use crate::error::{NgViewError, Result};

/// Default number of features written per batch
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Options for loading a data source into a store container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip features without geometry or with empty coordinates
    pub skip_empty_geometry: bool,
    /// Features serialized per batch; progress is reported once per batch
    pub batch_size: usize,
    /// Dataset name inside the container (defaults to the source file stem)
    pub dataset_name: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            skip_empty_geometry: true,
            batch_size: DEFAULT_BATCH_SIZE,
            dataset_name: None,
        }
    }
}

impl LoadOptions {
    /// Parse `KEY=VALUE` pairs on top of an all-off base.
    ///
    /// Known keys: `FEATURES_SKIP` (`EMPTY_GEOMETRY` or `NONE`),
    /// `BATCH_SIZE` (positive integer), `NAME` (dataset name).
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        let mut options = Self {
            skip_empty_geometry: false,
            ..Self::default()
        };
        for pair in pairs {
            options.apply(pair.as_ref())?;
        }
        Ok(options)
    }

    /// Apply a single `KEY=VALUE` pair
    pub fn apply(&mut self, pair: &str) -> Result<()> {
        let (key, value) = split_pair(pair)?;
        match key.to_ascii_uppercase().as_str() {
            "FEATURES_SKIP" => {
                self.skip_empty_geometry = match value.to_ascii_uppercase().as_str() {
                    "EMPTY_GEOMETRY" => true,
                    "NONE" => false,
                    _ => {
                        return Err(NgViewError::InvalidOption(
                            pair.to_string(),
                            "expected EMPTY_GEOMETRY or NONE".to_string(),
                        ))
                    }
                };
            }
            "BATCH_SIZE" => {
                self.batch_size = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        NgViewError::InvalidOption(
                            pair.to_string(),
                            "expected a positive integer".to_string(),
                        )
                    })?;
            }
            "NAME" => {
                if value.trim().is_empty() {
                    return Err(NgViewError::InvalidOption(
                        pair.to_string(),
                        "name must not be empty".to_string(),
                    ));
                }
                self.dataset_name = Some(value.trim().to_string());
            }
            _ => {
                return Err(NgViewError::InvalidOption(
                    pair.to_string(),
                    "unknown key".to_string(),
                ))
            }
        }
        Ok(())
    }
}

/// Options for creating a store container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Pick a free name (`name_1`, `name_2`, ...) instead of failing when taken
    pub unique: bool,
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(NgViewError::InvalidOption(
            pair.to_string(),
            "expected KEY=VALUE".to_string(),
        )),
    }
}
