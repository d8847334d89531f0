// Enrichment and keep/drop filtering for telemetry records
//
// enrich: copy interface metadata into the attribute map (never overwriting)
// evaluate: gate check, required rules, then "any applicable rule matches"

mod enrich;
mod evaluate;
mod rules;
mod snapshot;
mod types;

pub use enrich::enrich;
pub use evaluate::should_drop;
pub use rules::{GateRule, Rule, RuleSet};
pub use snapshot::{MetadataSnapshot, SnapshotStore};
pub use types::{
    value_text, AttributeMap, FilterDecision, IfaceId, InterfaceTable, MetricInfo, MetricTable,
    Record, ADMIN_STATUS, DEVICE_NAME, INTERFACE_PREFIX, REQUIRED_MARKER,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Runs enrichment and evaluation against the current snapshot
/// Safe to share across worker tasks; each call uses its own attribute map
pub struct RecordFilter {
    snapshots: Arc<SnapshotStore>,
    kept: AtomicU64,
    dropped: AtomicU64,
}

impl RecordFilter {
    /// Create new record filter
    ///
    /// # Arguments
    /// * `snapshots` - Store holding the current rules and interface table
    pub fn new(snapshots: Arc<SnapshotStore>) -> Self {
        Self {
            snapshots,
            kept: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enrich `attrs` for `record` and decide whether to keep it
    ///
    /// One snapshot is loaded per call so enrichment and evaluation always see
    /// the same rules and interface data.
    pub fn process(
        &self,
        record: &Record,
        attrs: &mut AttributeMap,
        metrics: &MetricTable,
    ) -> FilterDecision {
        let snapshot = self.snapshots.load();
        enrich(attrs, record, metrics, &snapshot);

        let interface_scoped = attrs.keys().any(|k| k.starts_with(INTERFACE_PREFIX));
        let decision = FilterDecision::from_drop(should_drop(attrs, &snapshot, interface_scoped));

        match decision {
            FilterDecision::Keep => self.kept.fetch_add(1, Ordering::Relaxed),
            FilterDecision::Drop => self.dropped.fetch_add(1, Ordering::Relaxed),
        };

        decision
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    /// Get counts of kept and dropped records
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            kept: self.kept.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Statistics from filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: u64,
    pub dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn create_test_store() -> Arc<SnapshotStore> {
        let rules = RuleSet::compile(
            "AdminStatus",
            [
                ("if_Description", "igb3"),
                ("AdminStatus", "up"),
                ("device_name", "bart"),
            ],
        )
        .unwrap();

        let mut table = InterfaceTable::new();
        table.insert(
            20,
            HashMap::from([("Description".to_string(), json!("igb2"))]),
        );
        table.insert(
            30,
            HashMap::from([("Description".to_string(), json!("igb3"))]),
        );

        Arc::new(SnapshotStore::new(MetadataSnapshot::new(rules, table)))
    }

    #[test]
    fn test_enriched_mismatch_drops() {
        let filter = RecordFilter::new(create_test_store());
        let mut attrs = AttributeMap::from([("AdminStatus".to_string(), json!("up"))]);

        let decision = filter.process(
            &Record::new().with_interface(20),
            &mut attrs,
            &HashMap::new(),
        );

        assert_eq!(decision, FilterDecision::Drop);
        assert_eq!(attrs.get("if_Description"), Some(&json!("igb2")));
    }

    #[test]
    fn test_enriched_match_keeps() {
        let filter = RecordFilter::new(create_test_store());
        let mut attrs = AttributeMap::from([("AdminStatus".to_string(), json!("up"))]);

        let decision = filter.process(
            &Record::new().with_interface(30),
            &mut attrs,
            &HashMap::new(),
        );

        assert_eq!(decision, FilterDecision::Keep);
    }

    #[test]
    fn test_stats_count_verdicts() {
        let filter = RecordFilter::new(create_test_store());

        for iface in [20, 30, 30] {
            let mut attrs = AttributeMap::new();
            filter.process(
                &Record::new().with_interface(iface),
                &mut attrs,
                &HashMap::new(),
            );
        }

        assert_eq!(filter.stats(), FilterStats { kept: 2, dropped: 1 });
    }
}
