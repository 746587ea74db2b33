//! Compiler configuration loaded from a JSON file

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::compiler::CompileOptions;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Entity name to SQL table name
    #[serde(default)]
    pub table_mapping: HashMap<String, String>,

    #[serde(flatten)]
    pub options: CompileOptions,

    /// Page size used when a request sets none; `None` leaves such requests unpaged
    #[serde(default)]
    pub default_page_size: Option<u64>,
}

impl CompilerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let display = path_ref.display().to_string();

        if !path_ref.exists() {
            return Err(ConfigError::Missing { path: display });
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Table for an entity, the lower-cased entity name when unmapped
    pub fn get_table_name(&self, entity: &str) -> String {
        self.table_mapping
            .get(entity)
            .cloned()
            .unwrap_or_else(|| entity.to_lowercase())
    }
}
