// Metadata snapshot and its atomically swapped store
use arc_swap::ArcSwap;
use std::sync::Arc;

use super::rules::RuleSet;
use super::types::{InterfaceTable, ADMIN_STATUS};
use crate::config::FilterConfig;
use crate::error::Result;

/// Immutable bundle used for one evaluation: rule set plus interface metadata
#[derive(Debug, Clone)]
pub struct MetadataSnapshot {
    pub rules: RuleSet,
    pub interfaces: InterfaceTable,
}

impl MetadataSnapshot {
    pub fn new(rules: RuleSet, interfaces: InterfaceTable) -> Self {
        Self { rules, interfaces }
    }

    /// Compile the configured rules into a snapshot
    pub fn from_config(config: &FilterConfig, interfaces: InterfaceTable) -> Result<Self> {
        let rules = RuleSet::compile(&config.gate_attribute, &config.rules)?;
        Ok(Self::new(rules, interfaces))
    }

    /// Snapshot with no rules and no interface data
    pub fn empty() -> Self {
        Self::new(RuleSet::empty(ADMIN_STATUS), InterfaceTable::new())
    }

    /// Same rules, new interface table
    pub fn with_interfaces(&self, interfaces: InterfaceTable) -> Self {
        Self::new(self.rules.clone(), interfaces)
    }
}

impl Default for MetadataSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Holds the current snapshot; reloads swap in a whole new one
///
/// Readers get an `Arc` to a complete snapshot and keep it for as long as they
/// need it, so a concurrent reload is never observed half way through.
pub struct SnapshotStore {
    current: ArcSwap<MetadataSnapshot>,
}

impl SnapshotStore {
    pub fn new(snapshot: MetadataSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<MetadataSnapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot
    pub fn publish(&self, snapshot: MetadataSnapshot) {
        tracing::debug!(
            "Publishing metadata snapshot: {} rules, {} interfaces",
            snapshot.rules.len(),
            snapshot.interfaces.len()
        );
        self.current.store(Arc::new(snapshot));
    }

    /// Recompile rules from config, keeping the current interface table
    ///
    /// On an invalid pattern the current snapshot stays in place.
    pub fn reload_rules(&self, config: &FilterConfig) -> Result<()> {
        let interfaces = self.load().interfaces.clone();
        let snapshot = MetadataSnapshot::from_config(config, interfaces)?;
        self.publish(snapshot);
        Ok(())
    }

    /// Swap in a new interface table, keeping the current rules
    pub fn update_interfaces(&self, interfaces: InterfaceTable) {
        let snapshot = self.load().with_interfaces(interfaces);
        self.publish(snapshot);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(MetadataSnapshot::empty())
    }
}
