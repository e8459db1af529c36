//! Named zones and their resolution into provider request URLs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bbox::BoundingBox;
use crate::error::{GribError, GribResult};
use crate::provider::ProviderModel;

/// One registry entry as it appears in `zones.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub id: String,
    pub long_min: f64,
    pub long_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl ZoneDefinition {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.long_min, self.long_max, self.lat_min, self.lat_max)
    }
}

#[derive(Debug, Deserialize)]
struct ZoneFile {
    #[serde(default)]
    zones: Vec<ZoneDefinition>,
}

/// Lookup table from zone identifier to bounding box.
///
/// Lookups are case-sensitive exact matches.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: BTreeMap<String, BoundingBox>,
}

impl ZoneRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the zones shipped with the tool.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        // Latitudes kept as shipped (lat_min > lat_max).
        registry.insert("hyeres", BoundingBox::new(1.0, 13.0, 45.0, 38.0));
        registry
    }

    /// Add or replace a zone.
    pub fn insert(&mut self, id: impl Into<String>, bbox: BoundingBox) {
        let id = id.into();
        if bbox.is_inverted() {
            warn!(zone = %id, ?bbox, "Zone has min above max on at least one axis");
        }
        self.zones.insert(id, bbox);
    }

    pub fn get(&self, id: &str) -> Option<&BoundingBox> {
        self.zones.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.zones.contains_key(id)
    }

    /// Zone identifiers in sorted order.
    pub fn zone_ids(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Parse zone definitions from YAML (`zones: [{id, long_min, ...}]`).
    pub fn from_yaml_str(yaml: &str) -> GribResult<Self> {
        let file: ZoneFile = serde_yaml::from_str(yaml)?;
        let mut registry = Self::new();
        for zone in file.zones {
            if zone.id.is_empty() {
                return Err(GribError::Config("zone entry has an empty id".to_string()));
            }
            let bbox = zone.bbox();
            registry.insert(zone.id, bbox);
        }
        Ok(registry)
    }

    /// Load zone definitions from a YAML file.
    pub fn load(path: &Path) -> GribResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GribError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let registry = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), count = registry.len(), "Loaded zone definitions");
        Ok(registry)
    }

    /// Add every zone of `other`, replacing entries with the same id.
    pub fn merge(&mut self, other: ZoneRegistry) {
        for (id, bbox) in other.zones {
            self.zones.insert(id, bbox);
        }
    }

    /// Resolve `zone_id` for `model`: copy the zone's bounding box into the
    /// model and render its request URL.
    ///
    /// On error the model is left exactly as it was.
    pub fn resolve(
        &self,
        model: &mut ProviderModel,
        zone_id: &str,
    ) -> GribResult<(BoundingBox, String)> {
        let bbox = match self.get(zone_id) {
            Some(bbox) => *bbox,
            None => {
                debug!(zone = %zone_id, "Wrong zone name");
                return Err(GribError::UnknownZone(zone_id.to_string()));
            }
        };

        let url = model.render_url(&bbox)?;
        model.apply_resolution(zone_id, bbox, url.clone());

        debug!(zone = %zone_id, model = %model.name(), url = %url, "Set zone");
        Ok((bbox, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ZoneRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.zone_ids().count(), 0);
        assert!(!ZoneRegistry::builtin().is_empty());
    }

    #[test]
    fn test_builtin_has_hyeres() {
        let registry = ZoneRegistry::builtin();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("hyeres"),
            Some(&BoundingBox::new(1.0, 13.0, 45.0, 38.0))
        );
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = ZoneRegistry::builtin();
        assert!(registry.contains("hyeres"));
        assert!(!registry.contains("Hyeres"));
        assert!(!registry.contains("hyeres "));
    }

    #[test]
    fn test_parse_zone_yaml() {
        let yaml = r#"
zones:
  - id: corse
    long_min: 8.0
    long_max: 10.0
    lat_min: 41.0
    lat_max: 43.5
  - id: bretagne
    long_min: -6
    long_max: -1
    lat_min: 46.5
    lat_max: 49
"#;
        let registry = ZoneRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.zone_ids().collect::<Vec<_>>(), vec!["bretagne", "corse"]);
        assert_eq!(registry.get("corse").unwrap().lat_max, 43.5);
    }

    #[test]
    fn test_merge_overrides() {
        let mut registry = ZoneRegistry::builtin();
        let mut extra = ZoneRegistry::new();
        extra.insert("hyeres", BoundingBox::new(5.0, 7.0, 42.0, 44.0));
        extra.insert("corse", BoundingBox::new(8.0, 10.0, 41.0, 43.5));
        registry.merge(extra);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("hyeres").unwrap().long_min, 5.0);
    }

    #[test]
    fn test_empty_id_rejected() {
        let yaml = "zones:\n  - id: \"\"\n    long_min: 0\n    long_max: 1\n    lat_min: 0\n    lat_max: 1\n";
        assert!(matches!(
            ZoneRegistry::from_yaml_str(yaml),
            Err(GribError::Config(_))
        ));
    }
}
