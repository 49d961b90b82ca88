use include_dir::{include_dir, Dir};
use thiserror::Error;
use tracing::info;

use crate::models::Example;

static DATA_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/data");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("bundled file missing: {0}")] Missing(&'static str),
    #[error("invalid example data: {0}")] Parse(#[from] serde_json::Error),
}

/// Static example records, loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    examples: Vec<Example>,
}

impl Catalog {
    pub fn bundled() -> Result<Self, CatalogError> {
        let file = DATA_DIR
            .get_file("examples.json")
            .ok_or(CatalogError::Missing("examples.json"))?;
        let catalog = Self::from_json(file.contents())?;
        info!("📚 Loaded {} bundled examples", catalog.examples.len());
        Ok(catalog)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        Ok(Self { examples: serde_json::from_slice(bytes)? })
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn get(&self, index: usize) -> Option<&Example> {
        self.examples.get(index)
    }

    /// First record is the default pre-seed target.
    pub fn default_example(&self) -> Option<&Example> {
        self.examples.first()
    }
}
