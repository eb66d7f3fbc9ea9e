//! Settings file loading with deep merge and env overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::Result;
use crate::types::ArborSettings;

/// Default settings file location: `~/.arbor/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".arbor").join("settings.json")
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key-by-key recursively; any other value type in the overlay
/// replaces the base value wholesale.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<ArborSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path.
///
/// Layers, lowest priority first: compiled defaults, the JSON file (if it
/// exists), then `ARBOR_*` environment variables.
pub fn load_settings_from_path(path: &Path) -> Result<ArborSettings> {
    let defaults = serde_json::to_value(ArborSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let file_value: Value = serde_json::from_str(&raw)?;
        deep_merge(defaults, file_value)
    } else {
        defaults
    };

    let mut settings: ArborSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Apply `ARBOR_*` environment variable overrides (highest priority).
fn apply_env_overrides(settings: &mut ArborSettings) {
    if let Ok(port) = std::env::var("ARBOR_PORT")
        && let Ok(port) = port.parse()
    {
        settings.server.port = port;
    }
    if let Ok(bind) = std::env::var("ARBOR_BIND") {
        settings.server.bind = bind;
    }
    if let Ok(url) = std::env::var("ARBOR_LLM_URL") {
        settings.llm.base_url = url;
    }
    if let Ok(model) = std::env::var("ARBOR_MODEL") {
        settings.llm.model = model;
    }
    if let Ok(db_path) = std::env::var("ARBOR_DB_PATH") {
        settings.store.db_path = db_path;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_merge_nested_objects() {
        let base = serde_json::json!({"a": {"x": 1, "y": 2}, "b": 3});
        let overlay = serde_json::json!({"a": {"y": 9}});
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["a"]["x"], 1);
        assert_eq!(merged["a"]["y"], 9);
        assert_eq!(merged["b"], 3);
    }

    #[test]
    fn deep_merge_scalar_replaces() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": "two"}));
        assert_eq!(merged["a"], "two");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings_from_path(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, ArborSettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"llm": {"model": "llama3"}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.llm.model, "llama3");
        // Untouched keys keep their defaults.
        assert_eq!(settings.server.port, 5001);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }
}
