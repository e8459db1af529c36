//! Tests for zone resolution against provider templates.

use std::io::Write;

use grib_common::{BoundingBox, GribError, ProviderModel, ZoneRegistry};

const STUB_TEMPLATE: &str = "http://x/{lat_min}/{lat_max}/{long_min}/{long_max}/{args}";

fn stub_model() -> ProviderModel {
    ProviderModel::new("Stub", STUB_TEMPLATE)
}

fn sample_registry() -> ZoneRegistry {
    let mut registry = ZoneRegistry::builtin();
    registry.insert("corse", BoundingBox::new(8.0, 10.0, 41.0, 43.5));
    registry.insert("golfe-du-lion", BoundingBox::new(2.5, 6.0, 41.5, 43.75));
    registry
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolve_hyeres() {
    let registry = ZoneRegistry::builtin();
    let mut model = stub_model();

    let (bbox, url) = registry.resolve(&mut model, "hyeres").unwrap();

    assert_eq!(bbox, BoundingBox::new(1.0, 13.0, 45.0, 38.0));
    assert_eq!(url, "http://x/45/38/1/13/wgtprn");
    assert_eq!(model.zone(), Some("hyeres"));
    assert_eq!(model.bbox(), Some(&bbox));
    assert_eq!(model.api_url(), Some("http://x/45/38/1/13/wgtprn"));
}

#[test]
fn test_every_registered_zone_resolves_fully() {
    let registry = sample_registry();

    for zone in registry.zone_ids() {
        let mut model = stub_model();
        let (bbox, url) = model.set_zone(&registry, zone).unwrap();

        assert_eq!(Some(&bbox), registry.get(zone));
        assert!(!url.contains('{') && !url.contains('}'), "unresolved slot in {}", url);
        assert!(url.ends_with("/wgtprn"));
    }
}

#[test]
fn test_resolve_can_be_repeated_on_one_model() {
    let registry = sample_registry();
    let mut model = stub_model();

    model.set_zone(&registry, "hyeres").unwrap();
    let (_, url) = model.set_zone(&registry, "corse").unwrap();

    assert_eq!(url, "http://x/41/43.5/8/10/wgtprn");
    assert_eq!(model.zone(), Some("corse"));
}

// ============================================================================
// Unknown zones
// ============================================================================

#[test]
fn test_unknown_zone_is_an_error() {
    let registry = ZoneRegistry::builtin();
    let mut model = stub_model();

    let err = registry.resolve(&mut model, "atlantis").unwrap_err();
    match err {
        GribError::UnknownZone(zone) => assert_eq!(zone, "atlantis"),
        other => panic!("expected UnknownZone, got {:?}", other),
    }
}

#[test]
fn test_unknown_zone_leaves_model_untouched() {
    let registry = ZoneRegistry::builtin();
    let mut model = stub_model();
    model.set_zone(&registry, "hyeres").unwrap();
    let before = model.clone();

    assert!(model.set_zone(&registry, "HYERES").is_err());
    assert_eq!(model, before);
}

// ============================================================================
// Loading from disk
// ============================================================================

#[test]
fn test_load_zone_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "zones:\n  - id: corse\n    long_min: 8\n    long_max: 10\n    lat_min: 41\n    lat_max: 43.5"
    )
    .unwrap();

    let mut registry = ZoneRegistry::builtin();
    registry.merge(ZoneRegistry::load(file.path()).unwrap());

    let mut model = stub_model();
    let (_, url) = model.set_zone(&registry, "corse").unwrap();
    assert_eq!(url, "http://x/41/43.5/8/10/wgtprn");
    assert!(registry.contains("hyeres"));
}

#[test]
fn test_load_missing_zone_file() {
    let result = ZoneRegistry::load(std::path::Path::new("/nonexistent/zones.yaml"));
    assert!(matches!(result, Err(GribError::Config(_))));
}
