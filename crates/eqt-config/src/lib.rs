//! eqt-config
//!
//! Layered YAML configuration for the equipment tracker.
//!
//! Documents are merged in order (earlier = base, later = override), rendered
//! to canonical JSON and hashed (sha256 hex) so a sync report can say exactly
//! which policy produced it. [`TrackerConfig`] is the typed view; every field
//! has a default, so an empty layer set reproduces the legacy behaviour.

use anyhow::{bail, Context, Result};
use eqt_normalize::{Action, ActionPolicy, ActionTerms, IdentifierPolicy, DEFAULT_PLACEHOLDERS};
use eqt_reconcile::ReconcilePolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::time::Duration;

/// JSON-pointer prefixes read by [`TrackerConfig`]. Any leaf outside these
/// is unused.
pub const CONSUMED_POINTERS: &[&str] = &["/normalizer", "/sync", "/store"];

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub normalizer: NormalizerConfig,
    pub sync: SyncConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Replaces the legacy checkout terms when present.
    pub checkout: Option<ActionTerms>,
    /// Replaces the legacy checkin terms when present.
    pub checkin: Option<ActionTerms>,
    /// Action given to text that matches neither rule set.
    pub unknown_action: Action,
    pub placeholders: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            checkout: None,
            checkin: None,
            unknown_action: Action::Checkin,
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub min_interval_ms: u64,
    pub force_update_all: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 8_000,
            force_update_all: false,
        }
    }
}

impl SyncConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub history_path: Option<String>,
    pub equipment_path: Option<String>,
}

impl TrackerConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone()).context("config does not match tracker schema")
    }

    pub fn action_policy(&self) -> ActionPolicy {
        let legacy = ActionPolicy::legacy();
        let lower = |t: &ActionTerms| ActionTerms::new(&t.prefixes, &t.contains, &t.exact);
        ActionPolicy {
            checkout: self.normalizer.checkout.as_ref().map(lower).unwrap_or(legacy.checkout),
            checkin: self.normalizer.checkin.as_ref().map(lower).unwrap_or(legacy.checkin),
            fallback: self.normalizer.unknown_action,
        }
    }

    pub fn identifier_policy(&self) -> IdentifierPolicy {
        IdentifierPolicy::with_placeholders(&self.normalizer.placeholders)
    }

    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            actions: self.action_policy(),
            identifiers: self.identifier_policy(),
        }
    }
}

// ---------------------------------------------------------------------------
// Layered loading + hashing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub tracker: TrackerConfig,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document parses as null; treat it as "no overrides".
        if !v_json.is_null() {
            merged = deep_merge(merged, v_json);
        }
    }

    let tracker = TrackerConfig::from_json(&merged)?;
    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        tracker,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json::Map is BTreeMap-backed (no preserve_order), so keys serialize sorted.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Unused-key report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves that nothing reads.
/// `Fail` turns a non-empty report into an error; `Warn` always returns it.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = CONSUMED_POINTERS.iter().map(|p| normalize_pointer(p)).collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {}",
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}
