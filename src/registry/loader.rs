// Trap descriptor loading
// Parses YAML descriptor files and merges them into a registry, one file at a time
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{normalize_oid, MibEntry, Registry, TrapDefinition};
use crate::error::{NetmetaError, Result};

/// One variable binding declared under a trap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    #[serde(alias = "OID")]
    pub oid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "enum", default)]
    pub enum_values: HashMap<String, i64>,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub conversion: String,
}

/// One trap entry of a descriptor document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapSpec {
    #[serde(rename = "trap_oid")]
    pub oid: String,
    #[serde(rename = "trap_name", default)]
    pub name: String,
    #[serde(rename = "drop_undefined", default)]
    pub drop_undefined: bool,
    #[serde(default)]
    pub events: Vec<EventDescriptor>,
}

/// Descriptor document structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrapDescriptor {
    #[serde(default)]
    pub traps: Vec<TrapSpec>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
}

/// What one successful load contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Descriptor origin (`from`, or the file name)
    pub source: String,
    /// Trap variables (events) merged
    pub variables: usize,
    /// Traps merged
    pub traps: usize,
}

/// Outcome of loading a directory of descriptors
#[derive(Debug, Default)]
pub struct DirLoadReport {
    pub loaded: Vec<LoadSummary>,
    pub failed: Vec<(PathBuf, NetmetaError)>,
}

impl DirLoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds a [`Registry`] from descriptor files
///
/// Each file is all-or-nothing: it is parsed completely before anything is
/// merged, so a malformed file leaves earlier contributions untouched.
#[derive(Debug, Default)]
pub struct RegistryLoader {
    registry: Registry,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one descriptor file
    pub fn load(&mut self, path: &Path) -> Result<LoadSummary> {
        let data = std::fs::read_to_string(path).map_err(|e| NetmetaError::Io {
            source: e,
            context: format!("Failed to read trap descriptor: {:?}", path),
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let summary = self.load_str(&file_name, &data).map_err(|e| match e {
            NetmetaError::Yaml(err) => NetmetaError::Descriptor {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
            other => other,
        })?;

        tracing::info!(
            "Loading {} snmp trap data points and {} traps from {}.",
            summary.variables,
            summary.traps,
            path.display()
        );

        Ok(summary)
    }

    /// Parse and merge a descriptor document held in memory
    ///
    /// `source` is used as the descriptor origin when the document has no `from`.
    pub fn load_str(&mut self, source: &str, data: &str) -> Result<LoadSummary> {
        let mut descriptor: TrapDescriptor = serde_yaml::from_str(data)?;
        if descriptor.from.is_empty() {
            descriptor.from = source.to_string();
        }
        Ok(self.merge(descriptor))
    }

    /// Load every `.yml`/`.yaml` file in a directory, in file-name order
    ///
    /// A failing file is logged and recorded; the remaining files still load.
    pub fn load_dir(&mut self, dir: &Path) -> Result<DirLoadReport> {
        let entries = std::fs::read_dir(dir).map_err(|e| NetmetaError::Io {
            source: e,
            context: format!("Failed to read descriptor directory: {:?}", dir),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_descriptor_file(p))
            .collect();
        paths.sort();

        let mut report = DirLoadReport::default();
        for path in paths {
            match self.load(&path) {
                Ok(summary) => report.loaded.push(summary),
                Err(e) => {
                    tracing::warn!("Skipping trap descriptor {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        Ok(report)
    }

    /// Registry built so far
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Finish the load pass
    pub fn finish(self) -> Registry {
        self.registry
    }

    fn merge(&mut self, descriptor: TrapDescriptor) -> LoadSummary {
        let mut added = 0;
        let trap_count = descriptor.traps.len();

        for trap in descriptor.traps {
            for event in &trap.events {
                let entry = build_entry(event, &trap);
                added += 1;
                self.registry
                    .variables
                    .insert(normalize_oid(&entry.oid), entry);
            }

            self.registry.traps.insert(
                normalize_oid(&trap.oid),
                TrapDefinition {
                    oid: trap.oid,
                    name: trap.name,
                    drop_undefined: trap.drop_undefined,
                    events: trap.events,
                },
            );
        }

        LoadSummary {
            source: descriptor.from,
            variables: added,
            traps: trap_count,
        }
    }
}

fn build_entry(event: &EventDescriptor, trap: &TrapSpec) -> MibEntry {
    let mut entry = MibEntry {
        oid: event.oid.clone(),
        name: event.name.clone(),
        enum_values: event.enum_values.clone(),
        enum_reverse: HashMap::new(),
        tag: event.tag.clone(),
        conversion: event.conversion.clone(),
        trap_name: trap.name.clone(),
        trap_oid: trap.oid.clone(),
    };

    // Reverse from the original labels before the lowercase aliases go in
    for (label, value) in &event.enum_values {
        entry.enum_reverse.insert(*value, label.clone());
    }
    // An alias never replaces a label that was written that way
    for (label, value) in &event.enum_values {
        entry
            .enum_values
            .entry(label.to_lowercase())
            .or_insert(*value);
    }

    entry
}

fn is_descriptor_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}
