//! YAML engine configuration.
//!
//! ```yaml
//! selection: exclusive
//! extensions: [textobj-indent]
//! mappings:
//!   - mode: n
//!     from: "<Space>i"
//!     to: "vii"
//!   - mode: xo
//!     from: "ic"
//!     to: "<Plug>textobj-indent-ii"
//!     remap: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::key::parse_keys;
use crate::keymap::{Extension, Keymap, KeymapBuilder, ModeMask};
use crate::textobj::IndentObjectExtension;
use crate::types::SelectionBehavior;

/// Root of an engine configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub selection: SelectionBehavior,
    /// Extensions to load, by name, in order.
    pub extensions: Vec<String>,
    /// User mappings, applied after extensions so they can shadow them.
    pub mappings: Vec<MappingConfig>,
}

/// One user mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Vim map-mode letters (`n`, `xo`, `v`, ...). Empty means `:map`.
    #[serde(default)]
    pub mode: String,
    pub from: String,
    pub to: String,
    #[serde(default = "default_remap")]
    pub remap: bool,
}

fn default_remap() -> bool {
    true
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&content)
    }

    /// Built-ins, then the listed extensions, then the user mappings.
    pub fn keymap(&self) -> Result<Keymap> {
        let mut builder = KeymapBuilder::with_builtins();
        for name in &self.extensions {
            let extension = known_extension(name)?;
            builder.register_extension(extension.as_ref())?;
        }
        for mapping in &self.mappings {
            let modes: ModeMask = mapping.mode.parse()?;
            let from = parse_keys(&mapping.from)?;
            let to = parse_keys(&mapping.to)?;
            builder.register_key_mapping(modes, from, to, mapping.remap);
        }
        debug!(
            extensions = self.extensions.len(),
            mappings = self.mappings.len(),
            "keymap built from config"
        );
        Ok(builder.build())
    }
}

/// Extensions that ship with the crate, looked up by name.
pub fn known_extension(name: &str) -> Result<Box<dyn Extension>> {
    match name {
        IndentObjectExtension::NAME => Ok(Box::new(IndentObjectExtension)),
        _ => Err(EngineError::UnknownExtension(name.to_string())),
    }
}
