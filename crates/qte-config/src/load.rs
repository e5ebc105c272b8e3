//! Layered YAML load, deep-merge, canonicalization, and content hashing.
//!
//! Later files in `paths` override earlier ones key-by-key, the merged
//! tree is canonicalized by recursively sorting object keys before
//! hashing, so two equivalent layer stacks always produce the same
//! `config_hash` regardless of key order in the source YAML.

use std::fs;

use qte_domain::{DomainError, DomainResult};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Result of loading and merging one or more YAML layers.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load and deep-merge YAML files in order. Later paths override earlier
/// ones. A missing or unparseable layer is `ConfigMissing` — fatal, the
/// caller refuses to start.
pub fn load_layered_yaml(paths: &[&str]) -> DomainResult<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let s = fs::read_to_string(p)
            .map_err(|e| DomainError::new(qte_domain::ErrorKind::ConfigMissing, format!("read config {p}: {e}")))?;
        let yaml_val: serde_yaml::Value = serde_yaml::from_str(&s)
            .map_err(|e| DomainError::new(qte_domain::ErrorKind::ConfigMissing, format!("parse yaml {p}: {e}")))?;
        let json_val = serde_json::to_value(yaml_val)
            .map_err(|e| DomainError::new(qte_domain::ErrorKind::ConfigMissing, format!("yaml->json {p}: {e}")))?;
        deep_merge(&mut merged, json_val);
    }

    let canonical = canonicalize_json(&merged);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    let config_json = serde_json::from_str(&canonical)
        .map_err(|e| DomainError::new(qte_domain::ErrorKind::ConfigMissing, format!("canonical json parse: {e}")))?;

    Ok(LoadedConfig { config_json, canonical_json: canonical, config_hash })
}

/// Merge an empty layer set into a bare default tree, so callers that run
/// with no config files on disk still get a deterministic empty object to
/// read defaults out of.
pub fn empty_config() -> LoadedConfig {
    let canonical = canonicalize_json(&Value::Object(Default::default()));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    LoadedConfig {
        config_json: Value::Object(Default::default()),
        canonical_json: canonical,
        config_hash: hex::encode(hasher.finalize()),
    }
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}
