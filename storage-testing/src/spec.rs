// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storage_types::DeviceInfo;

use crate::errors::{Result, TestingError};

/// A device snapshot to build a pool from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
}

pub fn workspace_root() -> PathBuf {
    if let Ok(value) = std::env::var("STORAGE_PRESENTABLE_WORKSPACE_ROOT") {
        return PathBuf::from(value);
    }

    if let Ok(current_dir) = std::env::current_dir()
        && current_dir.join("resources/lab-specs").exists()
    {
        return current_dir;
    }

    let manifest_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if manifest_root.join("resources/lab-specs").exists() {
        return manifest_root;
    }

    PathBuf::from(".")
}

pub fn specs_root() -> PathBuf {
    workspace_root().join("resources/lab-specs")
}

/// Where `spec` lives: a path when it looks like one, otherwise a spec
/// name under `specs_dir` (or the bundled specs).
pub fn resolve_spec_path(spec: &str, specs_dir: Option<&Path>) -> PathBuf {
    if spec.ends_with(".toml") || spec.contains('/') {
        return PathBuf::from(spec);
    }

    specs_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(specs_root)
        .join(format!("{spec}.toml"))
}

pub fn load_by_name(spec_name: &str) -> Result<LabSpec> {
    load(spec_name, None)
}

pub fn load(spec: &str, specs_dir: Option<&Path>) -> Result<LabSpec> {
    let path = resolve_spec_path(spec, specs_dir);
    if !path.exists() {
        return Err(TestingError::SpecNotFound {
            spec_name: spec.to_string(),
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        });
    }

    let raw = fs::read_to_string(&path).map_err(|error| TestingError::SpecInvalid {
        spec_name: spec.to_string(),
        reason: error.to_string(),
    })?;

    parse(spec, &raw)
}

pub fn parse(spec_name: &str, raw: &str) -> Result<LabSpec> {
    let spec: LabSpec = toml::from_str(raw).map_err(|error| TestingError::SpecInvalid {
        spec_name: spec_name.to_string(),
        reason: error.to_string(),
    })?;

    validate(&spec)?;
    Ok(spec)
}

pub fn validate(spec: &LabSpec) -> Result<()> {
    let invalid = |reason: String| TestingError::SpecInvalid {
        spec_name: spec.name.clone(),
        reason,
    };

    if spec.name.is_empty() {
        return Err(TestingError::SpecInvalid {
            spec_name: "<unknown>".to_string(),
            reason: "name must not be empty".to_string(),
        });
    }

    if spec.devices.is_empty() {
        return Err(invalid("devices must not be empty".to_string()));
    }

    let mut object_paths = HashSet::new();
    for device in &spec.devices {
        if device.object_path.is_empty() {
            return Err(invalid(format!(
                "device {} has no object_path",
                device.device_file
            )));
        }
        if !object_paths.insert(device.object_path.as_str()) {
            return Err(invalid(format!(
                "object_path {} is listed twice",
                device.object_path
            )));
        }
    }

    for device in &spec.devices {
        if let Some(partition) = &device.partition
            && !object_paths.contains(partition.table.as_str())
        {
            return Err(invalid(format!(
                "partition {} refers to unknown table {}",
                device.object_path, partition.table
            )));
        }
        if let Some(luks) = &device.luks_cleartext
            && !object_paths.contains(luks.slave.as_str())
        {
            return Err(invalid(format!(
                "cleartext device {} refers to unknown backing device {}",
                device.object_path, luks.slave
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spec_name_without_extension() {
        let spec = load_by_name("mbr-two-primaries").unwrap();
        assert_eq!(spec.name, "mbr-two-primaries");
        assert_eq!(spec.devices.len(), 3);
    }

    #[test]
    fn paths_are_taken_as_given() {
        assert_eq!(
            resolve_spec_path("/tmp/custom.toml", None),
            PathBuf::from("/tmp/custom.toml")
        );
        assert_eq!(
            resolve_spec_path("raid", Some(Path::new("/srv/specs"))),
            PathBuf::from("/srv/specs/raid.toml")
        );
    }

    #[test]
    fn rejects_dangling_partition_table() {
        let err = parse(
            "dangling",
            r#"
            name = "dangling"

            [[devices]]
            object_path = "/devices/sda1"
            device_file = "/dev/sda1"

            [devices.partition]
            table = "/devices/sda"
            scheme = "mbr"
            number = 1
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown table /devices/sda"));
    }

    #[test]
    fn rejects_duplicate_object_paths_and_empty_specs() {
        let err = parse(
            "twice",
            r#"
            name = "twice"

            [[devices]]
            object_path = "/devices/sda"

            [[devices]]
            object_path = "/devices/sda"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("listed twice"));

        let err = parse("empty", "name = \"empty\"").unwrap_err();
        assert!(err.to_string().contains("devices must not be empty"));

        assert!(matches!(
            load_by_name("does-not-exist"),
            Err(TestingError::SpecNotFound { .. })
        ));
    }
}
