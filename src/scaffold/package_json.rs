use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::scaffold::ScaffoldError;

pub const PACKAGE_JSON: &str = "package.json";

/// Manifest for a freshly created project named after its directory.
pub fn project_manifest(name: &str) -> Value {
    json!({
        "name": name,
        "version": "0.1.0",
        "description": "A brief description of your package",
        "main": "index.js",
        "scripts": {
            "dev": "vx3 serve --debug"
        },
        "author": "Your Name",
        "license": "ISC",
        "devDependencies": {
            "typescript": "^4.0.0"
        }
    })
}

/// Write `package.json` into `project_dir` unless one exists.
///
/// Returns whether a file was written.
pub fn write_package_json(project_dir: &Path) -> Result<bool, ScaffoldError> {
    let path = project_dir.join(PACKAGE_JSON);
    if path.exists() {
        tracing::info!("package.json already exists at {}", path.display());
        return Ok(false);
    }

    let name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my-vx-project");
    write_json(&path, &project_manifest(name))?;
    tracing::info!("Created package.json at {}", path.display());
    Ok(true)
}

/// Keys to add under one top-level section when they are missing.
pub struct Section {
    pub name: &'static str,
    pub entries: &'static [(&'static str, &'static str)],
}

/// Add missing keys to `package.json`, never replacing existing values.
///
/// A missing or unreadable file is treated as `{}`.
pub fn upsert_package_json(project_dir: &Path, sections: &[Section]) -> Result<Value, ScaffoldError> {
    let path = project_dir.join(PACKAGE_JSON);
    let mut root = match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!("{} is not a JSON object; starting from {{}}", path.display());
                Map::new()
            }
        },
        Err(_) => Map::new(),
    };

    for section in sections {
        let slot = root
            .entry(section.name)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(map) = slot {
            for (key, value) in section.entries {
                map.entry(*key)
                    .or_insert_with(|| Value::String((*value).to_string()));
            }
        }
    }

    let value = Value::Object(root);
    write_json(&path, &value)?;
    Ok(value)
}

fn write_json(path: &Path, value: &Value) -> Result<(), ScaffoldError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| ScaffoldError::Io {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    fs::write(path, content).map_err(|e| ScaffoldError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
