//! Command handler modules for obd-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use obd_config::{LoadedConfig, UnusedKeyPolicy};
use tracing::warn;

/// Env var consulted when `--out-dir` is not given.
pub const ENV_OUT_DIR: &str = "OBD_OUT_DIR";
pub const DEFAULT_OUT_DIR: &str = "out";

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config (built-in defaults first, then `paths` in order).
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    obd_config::load_layered_yaml(&path_refs)
}

/// `--out-dir`, else `$OBD_OUT_DIR`, else `./out`.
pub fn resolve_out_dir(flag: Option<String>) -> PathBuf {
    flag.or_else(|| std::env::var(ENV_OUT_DIR).ok().filter(|v| !v.trim().is_empty()))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
}

/// Execute `obd check-config`.
pub fn check_config(paths: &[String], strict: bool) -> Result<()> {
    let loaded = load_config(paths)?;
    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = obd_config::report_unused_keys(&loaded.config_json, policy)?;

    println!("config_ok=true");
    println!("config_hash={}", loaded.config_hash);
    println!("channels={}", loaded.config.channels.len());
    println!("warehouses={}", loaded.config.warehouses.join(","));
    println!("unused_keys={}", report.unused_leaf_pointers.len());
    for p in &report.unused_leaf_pointers {
        warn!(pointer = %p, "unused config key");
        println!("unused_key={}", p);
    }
    Ok(())
}
