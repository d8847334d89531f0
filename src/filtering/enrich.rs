// Enrichment: copies interface metadata into a record's attributes
use serde_json::Value;

use super::snapshot::MetadataSnapshot;
use super::types::{AttributeMap, MetricTable, Record, DEVICE_NAME, INTERFACE_PREFIX};

/// Add derived attributes for `record` to `attrs`
///
/// The record's device name is added as `device_name` and every field of its
/// interface entry as `if_<field>`. Keys already present in `attrs` are never
/// overwritten, which also makes repeated calls a no-op. `_metrics` is accepted but not projected yet.
pub fn enrich(
    attrs: &mut AttributeMap,
    record: &Record,
    _metrics: &MetricTable,
    snapshot: &MetadataSnapshot,
) {
    if let Some(device) = &record.device_name {
        attrs
            .entry(DEVICE_NAME.to_string())
            .or_insert_with(|| Value::String(device.clone()));
    }

    let Some(iface) = record.interface() else {
        return;
    };
    let Some(info) = snapshot.interfaces.get(&iface) else {
        return;
    };

    for (field, value) in info {
        attrs
            .entry(format!("{}{}", INTERFACE_PREFIX, field))
            .or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::rules::RuleSet;
    use crate::filtering::types::InterfaceTable;
    use serde_json::json;
    use std::collections::HashMap;

    fn snapshot_with_iface(id: u32, fields: &[(&str, serde_json::Value)]) -> MetadataSnapshot {
        let mut table = InterfaceTable::new();
        table.insert(
            id,
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        MetadataSnapshot::new(RuleSet::empty("AdminStatus"), table)
    }

    #[test]
    fn test_copies_fields_with_prefix() {
        let snapshot = snapshot_with_iface(
            10,
            &[("Description", json!("myIfDesc")), ("Speed", json!(1000))],
        );
        let mut attrs = AttributeMap::new();

        enrich(
            &mut attrs,
            &Record::new().with_interface(10),
            &HashMap::new(),
            &snapshot,
        );

        assert_eq!(attrs.get("if_Description"), Some(&json!("myIfDesc")));
        assert_eq!(attrs.get("if_Speed"), Some(&json!(1000)));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_existing_keys_win() {
        let snapshot = snapshot_with_iface(10, &[("Description", json!("fromTable"))]);
        let mut attrs = AttributeMap::new();
        attrs.insert("if_Description".to_string(), json!("fromCaller"));

        enrich(
            &mut attrs,
            &Record::new().with_interface(10),
            &HashMap::new(),
            &snapshot,
        );

        assert_eq!(attrs.get("if_Description"), Some(&json!("fromCaller")));
    }

    #[test]
    fn test_idempotent() {
        let snapshot = snapshot_with_iface(3, &[("Alias", json!("uplink"))]);
        let record = Record::new().with_interface(3);
        let mut attrs = AttributeMap::new();
        attrs.insert("device_name".to_string(), json!("edge1"));

        enrich(&mut attrs, &record, &HashMap::new(), &snapshot);
        let once = attrs.clone();
        enrich(&mut attrs, &record, &HashMap::new(), &snapshot);

        assert_eq!(attrs, once);
    }

    #[test]
    fn test_noop_without_interface_or_entry() {
        let snapshot = snapshot_with_iface(3, &[("Alias", json!("uplink"))]);
        let mut attrs = AttributeMap::new();

        enrich(&mut attrs, &Record::new(), &HashMap::new(), &snapshot);
        assert!(attrs.is_empty());

        enrich(
            &mut attrs,
            &Record::new().with_interface(4),
            &HashMap::new(),
            &snapshot,
        );
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_projects_device_name() {
        let snapshot = snapshot_with_iface(3, &[("Alias", json!("uplink"))]);
        let mut attrs = AttributeMap::new();

        enrich(
            &mut attrs,
            &Record::new().with_device("bart"),
            &HashMap::new(),
            &snapshot,
        );
        assert_eq!(attrs.get("device_name"), Some(&json!("bart")));
        assert_eq!(attrs.len(), 1);

        let mut attrs = AttributeMap::from([("device_name".to_string(), json!("caller"))]);
        enrich(
            &mut attrs,
            &Record::new().with_device("bart").with_interface(3),
            &HashMap::new(),
            &snapshot,
        );
        assert_eq!(attrs.get("device_name"), Some(&json!("caller")));
        assert_eq!(attrs.get("if_Alias"), Some(&json!("uplink")));
    }
}
