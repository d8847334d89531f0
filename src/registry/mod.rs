//! MIB / trap registry
//!
//! This module provides:
//! - OID normalization (every stored key starts with a leading dot)
//! - Trap definitions keyed by trap OID
//! - Variable (Mib) entries keyed by variable OID, with case-insensitive
//!   enumeration lookup
//!
//! A [`Registry`] is produced by [`RegistryLoader::finish`] and is immutable
//! afterwards; share it behind an `Arc` for concurrent readers.

mod loader;

pub use loader::{DirLoadReport, EventDescriptor, LoadSummary, RegistryLoader, TrapDescriptor, TrapSpec};

use ahash::HashMap;
use std::collections::HashMap as StdHashMap;

/// Prefix an OID with `.` unless it already has one
pub fn normalize_oid(oid: &str) -> String {
    if oid.starts_with('.') {
        oid.to_string()
    } else {
        format!(".{}", oid)
    }
}

/// A trap and the events (variable bindings) it may carry
#[derive(Debug, Clone, PartialEq)]
pub struct TrapDefinition {
    pub oid: String,
    pub name: String,
    pub drop_undefined: bool,
    pub events: Vec<EventDescriptor>,
}

impl TrapDefinition {
    /// Whether variables not declared for this trap should be discarded
    pub fn drop_undefined_vars(&self) -> bool {
        self.drop_undefined
    }
}

/// A named SNMP variable definition with optional enumeration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MibEntry {
    pub oid: String,
    pub name: String,
    /// Label -> value, with a lowercase alias for every label
    pub enum_values: StdHashMap<String, i64>,
    /// Value -> label as originally written
    pub enum_reverse: StdHashMap<i64, String>,
    pub tag: String,
    pub conversion: String,
    /// Name of the trap this variable was declared under
    pub trap_name: String,
    /// OID of the trap this variable was declared under
    pub trap_oid: String,
}

impl MibEntry {
    pub fn has_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    /// Look up an enumeration value by label, falling back to the lowercase alias
    pub fn enum_value(&self, label: &str) -> Option<i64> {
        self.enum_values
            .get(label)
            .or_else(|| self.enum_values.get(&label.to_lowercase()))
            .copied()
    }

    /// Original-case label for an enumeration value
    pub fn enum_label(&self, value: i64) -> Option<&str> {
        self.enum_reverse.get(&value).map(String::as_str)
    }
}

/// Read-only dictionary of traps and variables keyed by normalized OID
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub(crate) traps: HashMap<String, TrapDefinition>,
    pub(crate) variables: HashMap<String, MibEntry>,
}

impl Registry {
    /// Trap definition for an OID (leading dot optional)
    pub fn trap(&self, oid: &str) -> Option<&TrapDefinition> {
        self.traps.get(&normalize_oid(oid))
    }

    /// Variable entry for an OID (leading dot optional)
    pub fn variable(&self, oid: &str) -> Option<&MibEntry> {
        self.variables.get(&normalize_oid(oid))
    }

    /// `drop_undefined` for a trap; unknown traps never drop
    pub fn drop_undefined_vars(&self, trap_oid: &str) -> bool {
        self.trap(trap_oid)
            .map(TrapDefinition::drop_undefined_vars)
            .unwrap_or(false)
    }

    pub fn trap_count(&self) -> usize {
        self.traps.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traps.is_empty() && self.variables.is_empty()
    }

    pub fn traps(&self) -> impl Iterator<Item = &TrapDefinition> {
        self.traps.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &MibEntry> {
        self.variables.values()
    }
}
