//! Configuration loading for providers and zones.
//!
//! Provider models are read from `<config_dir>/models/*.yaml`; extra zones from
//! `<config_dir>/zones.yaml`, merged over the built-in registry.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use grib_common::{ProviderModel, ZoneRegistry, DEFAULT_ARGS};

/// Root configuration loaded from a model YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub model: ModelInfo,
    pub source: SourceConfig,
}

/// Basic model identification.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    /// Used in output file names
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Where and how the provider is queried.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Template with {long_min} {long_max} {lat_min} {lat_max} {args} slots
    pub url_template: String,
    #[serde(default = "default_args")]
    pub args: String,
}

fn default_args() -> String {
    DEFAULT_ARGS.to_string()
}

impl ProviderConfig {
    /// Load a provider configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ProviderConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .to_model()
            .validate()
            .with_context(|| format!("Invalid provider in {}", path.display()))?;

        debug!(model = %config.model.id, path = %path.display(), "Loaded provider config");
        Ok(config)
    }

    /// A fresh model with no zone selected.
    pub fn to_model(&self) -> ProviderModel {
        ProviderModel::new(self.model.name.clone(), self.source.url_template.clone())
            .with_args(self.source.args.clone())
    }
}

/// Enabled providers, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<ProviderConfig>,
}

impl ProviderCatalog {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    /// Look a provider up by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.model.id.eq_ignore_ascii_case(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Fresh model for `id`, or an error listing what is configured.
    pub fn model(&self, id: &str) -> Result<ProviderModel> {
        match self.get(id) {
            Some(config) => Ok(config.to_model()),
            None => {
                let known: Vec<&str> = self.iter().map(|p| p.model.id.as_str()).collect();
                bail!("Unknown model '{}' (configured: {})", id, known.join(", "))
            }
        }
    }
}

/// Load all enabled provider configurations from a directory.
pub fn load_provider_configs(config_dir: &Path) -> Result<ProviderCatalog> {
    let models_dir = config_dir.join("models");

    if !models_dir.exists() {
        warn!(path = %models_dir.display(), "Models config directory not found");
        return Ok(ProviderCatalog::default());
    }

    let mut paths: Vec<_> = std::fs::read_dir(&models_dir)
        .with_context(|| format!("Failed to list {}", models_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml"))
        .collect();
    paths.sort();

    let mut providers = Vec::new();
    for path in paths {
        match ProviderConfig::load(&path) {
            Ok(config) => {
                if config.model.enabled {
                    info!(
                        model = %config.model.id,
                        name = %config.model.name,
                        "Loaded provider configuration"
                    );
                    providers.push(config);
                } else {
                    debug!(model = %config.model.id, "Skipping disabled provider");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "Failed to load provider config");
            }
        }
    }

    info!(count = providers.len(), "Loaded provider configurations");
    Ok(ProviderCatalog::new(providers))
}

/// Built-in zones plus `<config_dir>/zones.yaml` when it exists.
pub fn load_zones(config_dir: &Path) -> Result<ZoneRegistry> {
    let mut registry = ZoneRegistry::builtin();
    let path = config_dir.join("zones.yaml");

    if path.exists() {
        let extra = ZoneRegistry::load(&path)?;
        info!(path = %path.display(), count = extra.len(), "Loaded zone definitions");
        registry.merge(extra);
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARPEGE: &str = r#"
model:
  id: arpege
  name: Arpege
  description: "Arpege 0.5 degree"

source:
  url_template: "http://grib.example.org/arpege?lo1={long_min}&lo2={long_max}&la1={lat_min}&la2={lat_max}&p={args}"
"#;

    #[test]
    fn test_parse_provider_config() {
        let config: ProviderConfig = serde_yaml::from_str(ARPEGE).unwrap();
        assert_eq!(config.model.id, "arpege");
        assert!(config.model.enabled);
        assert_eq!(config.source.args, "wgtprn");

        let model = config.to_model();
        assert_eq!(model.name(), "Arpege");
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir(&models).unwrap();
        std::fs::write(models.join("arpege.yaml"), ARPEGE).unwrap();
        std::fs::write(
            models.join("disabled.yaml"),
            "model:\n  id: old\n  name: Old\n  enabled: false\nsource:\n  url_template: \"{long_min}{long_max}{lat_min}{lat_max}{args}\"\n",
        )
        .unwrap();
        std::fs::write(
            models.join("broken.yaml"),
            "model:\n  id: broken\n  name: Broken\nsource:\n  url_template: \"http://x/{lat_min}\"\n",
        )
        .unwrap();
        std::fs::write(models.join("notes.txt"), "ignored").unwrap();

        let catalog = load_provider_configs(dir.path()).unwrap();
        let ids: Vec<&str> = catalog.iter().map(|p| p.model.id.as_str()).collect();
        assert_eq!(ids, vec!["arpege"]);
        assert!(catalog.get("ARPEGE").is_some());
        assert!(catalog.model("gfs").is_err());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_provider_configs(dir.path()).unwrap().is_empty());
        assert_eq!(load_zones(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_zone_file_merged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("zones.yaml"),
            "zones:\n  - id: corse\n    long_min: 8\n    long_max: 10\n    lat_min: 41\n    lat_max: 43.5\n",
        )
        .unwrap();

        let zones = load_zones(dir.path()).unwrap();
        assert_eq!(zones.zone_ids().collect::<Vec<_>>(), vec!["corse", "hyeres"]);
    }
}
