//! obd-config
//!
//! Layered YAML configuration for the outbound reconciler.
//!
//! Layers are merged in order on top of the built-in [`DEFAULT_CONFIG_YAML`]:
//! mappings merge key by key, everything else (including sequences such as
//! `channels`) is replaced by the later layer. The merged document is
//! canonicalised to JSON and hashed (SHA-256) so every run can record exactly
//! which configuration produced it.

use std::collections::BTreeSet;
use std::fs;

use anyhow::{bail, Context, Result};
use obd_ingest::{InventoryAliases, OrderColumns};
use obd_sheets::SheetLayout;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Built-in base layer.
pub const DEFAULT_CONFIG_YAML: &str = include_str!("defaults.yaml");

/// JSON-pointer prefixes the application reads. A leaf outside all of them is
/// reported as unused.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/channels",
    "/warehouses",
    "/orders/columns",
    "/inventory/aliases",
    "/sheet",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersSection {
    pub columns: OrderColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySection {
    pub aliases: InventoryAliases,
}

/// Typed view of the merged configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundConfig {
    /// Processing and output order of sales channels.
    pub channels: Vec<String>,
    /// Accepted warehouse tags.
    pub warehouses: Vec<String>,
    pub orders: OrdersSection,
    pub inventory: InventorySection,
    pub sheet: SheetLayout,
}

impl OutboundConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: OutboundConfig =
            serde_json::from_value(v.clone()).context("config does not match expected shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            bail!("CONFIG_INVALID: channels must list at least one sales channel");
        }
        let mut seen = BTreeSet::new();
        for c in &self.channels {
            if c.trim().is_empty() {
                bail!("CONFIG_INVALID: channel names must not be empty");
            }
            if !seen.insert(c.as_str()) {
                bail!("CONFIG_INVALID: duplicate channel '{}'", c);
            }
        }
        if self.warehouses.iter().all(|w| w.trim().is_empty()) {
            bail!("CONFIG_INVALID: warehouses must list at least one warehouse");
        }
        if self.sheet.header.len() != 6 {
            bail!(
                "CONFIG_INVALID: sheet.header must have 6 labels, got {}",
                self.sheet.header.len()
            );
        }
        Ok(())
    }

    /// Reject a warehouse tag that is not configured.
    pub fn check_warehouse(&self, warehouse: &str) -> Result<()> {
        if self.warehouses.iter().any(|w| w == warehouse) {
            return Ok(());
        }
        bail!(
            "invalid warehouse '{}'. expected one of: {}",
            warehouse,
            self.warehouses.join(" | ")
        )
    }
}

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

/// Produce an unused-key report against [`CONSUMED_POINTERS`].
/// `Fail` returns an error when unused keys exist; `Warn` always returns the report.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut consumed_prefixes: Vec<String> =
        CONSUMED_POINTERS.iter().map(|p| p.to_string()).collect();
    consumed_prefixes.sort();

    let mut unused: Vec<String> = leaf_pointers(config_json)
        .into_iter()
        .filter(|leaf| !CONSUMED_POINTERS.iter().any(|c| pointer_covers(c, leaf)))
        .collect();
    unused.sort();
    unused.dedup();

    if policy == UnusedKeyPolicy::Fail && !unused.is_empty() {
        let first: Vec<&String> = unused.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {:?}",
            unused.len(),
            first
        );
    }

    Ok(UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    })
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc".
fn pointer_covers(prefix: &str, leaf: &str) -> bool {
    leaf.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// JSON pointers (RFC 6901) of every scalar leaf. Empty mappings and
/// sequences contribute nothing.
fn leaf_pointers(root: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), root)];
    while let Some((path, v)) = stack.pop() {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let token = k.replace('~', "~0").replace('/', "~1");
                    stack.push((format!("{path}/{token}"), child));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    stack.push((format!("{path}/{i}"), child));
                }
            }
            _ if path.is_empty() => out.push("/".to_string()),
            _ => out.push(path),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub config: OutboundConfig,
}

/// Load YAML files in merge order on top of the built-in defaults.
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
    let mut merged = yaml_to_json(DEFAULT_CONFIG_YAML).context("built-in defaults")?;
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer = yaml_to_json(raw).with_context(|| format!("config layer {}", i + 1))?;
        merge_layer(&mut merged, layer);
    }

    let config = OutboundConfig::from_json(&merged)?;

    // serde_json::Map is a BTreeMap here (no preserve_order), so the
    // serialized form has sorted keys.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        config,
    })
}

fn yaml_to_json(raw: &str) -> Result<Value> {
    // An empty document is an empty layer, not `null`.
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
    serde_json::to_value(v_yaml).context("yaml->json conversion failed")
}

/// Mappings merge key by key; any other layer value replaces the base.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (k, v) in layer_map {
                match base_map.get_mut(&k) {
                    Some(slot) => merge_layer(slot, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, other) => *slot = other,
    }
}
