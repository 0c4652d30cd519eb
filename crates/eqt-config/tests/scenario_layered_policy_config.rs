//! Scenario: layered config drives the normalizer and sync policies.
//!
//! Validates:
//! 1) No layers (or empty layers) reproduce the legacy policies.
//! 2) Later layers override earlier ones leaf by leaf.
//! 3) Config hash is stable and independent of key order.
//! 4) Unused keys are reported in Warn mode and rejected in Fail mode.

use std::time::Duration;

use eqt_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};
use eqt_normalize::{Action, ActionPolicy, EquipmentKey, IdentifierPolicy};

const BASE_YAML: &str = r#"
normalizer:
  placeholders: ["-", "na", "n/a", "null", "undefined", "tbd"]
sync:
  min_interval_ms: 8000
  force_update_all: false
store:
  history_path: "exports/form_responses.csv"
  equipment_path: "exports/master_alat.csv"
"#;

const BASE_YAML_REORDERED: &str = r#"
store:
  equipment_path: "exports/master_alat.csv"
  history_path: "exports/form_responses.csv"
sync:
  force_update_all: false
  min_interval_ms: 8000
normalizer:
  placeholders: ["-", "na", "n/a", "null", "undefined", "tbd"]
"#;

const STRICT_OVERLAY: &str = r#"
normalizer:
  unknown_action: checkout
  checkin:
    prefixes: ["Pengembali"]
    contains: ["kembali", "checkin", "balik"]
    exact: ["return"]
sync:
  min_interval_ms: 2000
"#;

#[test]
fn empty_layers_reproduce_legacy_policies() {
    let loaded = load_layered_yaml_from_strings(&[]).expect("load");
    assert_eq!(loaded.tracker.action_policy(), ActionPolicy::legacy());
    assert_eq!(loaded.tracker.identifier_policy(), IdentifierPolicy::default());
    assert_eq!(loaded.tracker.sync.min_interval(), Duration::from_secs(8));

    let blank = load_layered_yaml_from_strings(&["", "# comment only\n"]).expect("load");
    assert_eq!(blank.tracker, loaded.tracker);
}

#[test]
fn overlay_overrides_leaf_by_leaf() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, STRICT_OVERLAY]).expect("load");
    let t = &loaded.tracker;

    assert_eq!(t.sync.min_interval_ms, 2000);
    assert!(!t.sync.force_update_all);
    assert_eq!(t.store.history_path.as_deref(), Some("exports/form_responses.csv"));

    let actions = t.action_policy();
    assert_eq!(actions.fallback, Action::Checkout);
    assert_eq!(actions.resolve("dibalikin"), Action::Checkin);
    // checkout terms were not overridden
    assert_eq!(actions.checkout, ActionPolicy::legacy().checkout);
    // overlay terms are lower-cased
    assert_eq!(actions.checkin.prefixes, vec!["pengembali".to_string()]);

    let ids = t.identifier_policy();
    assert!(!ids.is_valid(&EquipmentKey::normalize("TBD")));
}

#[test]
fn hash_is_stable_and_key_order_independent() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).expect("load");
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).expect("load");
    let c = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).expect("load");
    let d = load_layered_yaml_from_strings(&[BASE_YAML, STRICT_OVERLAY]).expect("load");

    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.config_hash, c.config_hash);
    assert_eq!(a.canonical_json, c.canonical_json);
    assert_ne!(a.config_hash, d.config_hash);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn unused_keys_warn_or_fail() {
    let yaml = r#"
sync:
  min_interval_ms: 1000
spreadsheet:
  id: "abc"
  range: "A2:K"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("load");

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).expect("warn");
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/spreadsheet/id".to_string(), "/spreadsheet/range".to_string()]
    );

    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect_err("fail mode must reject unused keys");
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));

    let clean = load_layered_yaml_from_strings(&[BASE_YAML]).expect("load");
    assert!(report_unused_keys(&clean.config_json, UnusedKeyPolicy::Fail)
        .expect("clean")
        .is_clean());
}

#[test]
fn wrong_types_are_rejected() {
    let err = load_layered_yaml_from_strings(&["sync:\n  min_interval_ms: soon\n"])
        .expect_err("must reject");
    assert!(err.to_string().contains("tracker schema"));
}

#[test]
fn shipped_base_layer_is_clean_and_legacy() {
    let base = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config/defaults/base.yaml");
    let base_s = base.to_string_lossy().to_string();

    let loaded = eqt_config::load_layered_yaml(&[base_s.as_str()]).expect("load base");
    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("no unused keys")
        .is_clean());
    assert_eq!(loaded.tracker.action_policy(), ActionPolicy::legacy());
    assert_eq!(loaded.tracker.identifier_policy(), IdentifierPolicy::default());
    assert_eq!(loaded.tracker.sync.min_interval(), Duration::from_secs(8));
}
