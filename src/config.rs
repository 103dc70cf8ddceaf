//! Evaluation configuration — instrument catalog and initial attribute
//! overrides, loaded from ~/.partitura/config.yaml.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attribute::{AttributeRegistry, RawValue};
use crate::error::EvalError;
use crate::score::instrument::default_instrument_names;
use crate::score::InstrumentCatalog;

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid attribute override: {0}")]
    Attribute(#[from] EvalError),
}

/// Evaluation settings loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Instrument names a score may reference.
    #[serde(default = "EvalConfig::default_instruments")]
    pub instruments: Vec<String>,
    /// Initial value overrides, keyed by attribute name or alias, written the
    /// way a score would write them (e.g. `vol: 80`).
    #[serde(default)]
    pub attributes: BTreeMap<String, RawValue>,
}

impl EvalConfig {
    /// Load config from the standard path (~/.partitura/config.yaml).
    /// Returns None if the file doesn't exist or doesn't parse.
    pub fn load() -> Option<Self> {
        Self::load_from_home(&dirs::home_dir()?)
    }

    /// Load `.partitura/config.yaml` under `home`, if present and valid.
    pub fn load_from_home(home: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(config_path(home)).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Load config from an explicit path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// A read-only registry snapshot with the overrides applied.
    pub fn registry(&self) -> Result<Arc<AttributeRegistry>, ConfigError> {
        let mut registry = AttributeRegistry::builtin();
        for (name, value) in &self.attributes {
            registry = registry.with_initial(name, value)?;
        }
        Ok(Arc::new(registry))
    }

    pub fn catalog(&self) -> InstrumentCatalog {
        InstrumentCatalog::new(self.instruments.iter().cloned())
    }

    fn default_instruments() -> Vec<String> {
        default_instrument_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            instruments: Self::default_instruments(),
            attributes: BTreeMap::new(),
        }
    }
}

fn config_path(home: &Path) -> PathBuf {
    home.join(".partitura").join("config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = EvalConfig::default();
        assert!(config.attributes.is_empty());
        assert!(config.catalog().contains("piano"));
        let values = config.registry().unwrap().initial_values();
        assert_eq!(values.get("tempo"), Some(120.0));
    }

    #[test]
    fn partial_yaml_keeps_default_instruments() {
        let config: EvalConfig = serde_yaml::from_str("attributes: { tempo: 90 }").unwrap();
        assert_eq!(config.instruments, EvalConfig::default().instruments);
        let values = config.registry().unwrap().initial_values();
        assert_eq!(values.get("tempo"), Some(90.0));
    }

    #[test]
    fn custom_config_deserialize() {
        let yaml = r#"
instruments: [theremin, piano]
attributes:
  vol: 80
  octave: 3
"#;
        let config: EvalConfig = serde_yaml::from_str(yaml).unwrap();
        let catalog = config.catalog();
        assert!(catalog.contains("theremin"));
        assert!(!catalog.contains("violin"));
        let values = config.registry().unwrap().initial_values();
        assert_eq!(values.get("volume"), Some(0.8));
        assert_eq!(values.get("octave"), Some(3.0));
    }

    #[test]
    fn bad_override_is_reported() {
        let config: EvalConfig = serde_yaml::from_str("attributes: { pan: 250 }").unwrap();
        assert!(matches!(
            config.registry(),
            Err(ConfigError::Attribute(EvalError::OutOfRange { .. }))
        ));
        let config: EvalConfig = serde_yaml::from_str("attributes: { swing: 1 }").unwrap();
        assert!(matches!(
            config.registry(),
            Err(ConfigError::Attribute(EvalError::UnknownAttribute(_)))
        ));
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "instruments: [piano]").unwrap();
        let config = EvalConfig::from_path(file.path()).unwrap();
        assert_eq!(config.instruments, vec!["piano".to_string()]);
    }

    #[test]
    fn from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = EvalConfig::from_path(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_from_home_reads_dot_directory() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(EvalConfig::load_from_home(home.path()), None);

        let dir = home.path().join(".partitura");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "instruments: [organ]\nattributes: { tempo: 72 }\n",
        )
        .unwrap();
        let config = EvalConfig::load_from_home(home.path()).unwrap();
        assert_eq!(config.instruments, vec!["organ".to_string()]);
        assert_eq!(config.attributes.get("tempo"), Some(&RawValue::Number(72.0)));
    }

    #[test]
    fn load_from_home_ignores_broken_file() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".partitura");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "instruments: {").unwrap();
        assert_eq!(EvalConfig::load_from_home(home.path()), None);
    }
}
