// Shared types for enrichment and filter evaluation
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Interface identifier (SNMP ifIndex)
pub type IfaceId = u32;

/// Queryable fields of one record: attribute name -> value
pub type AttributeMap = HashMap<String, Value>;

/// Per-interface attribute snapshots supplied by the SNMP poller
pub type InterfaceTable = HashMap<IfaceId, HashMap<String, Value>>;

/// Metric name -> metric identity, handed to enrichment alongside a record
pub type MetricTable = HashMap<String, MetricInfo>;

/// Prefix for attributes copied from the interface table
pub const INTERFACE_PREFIX: &str = "if_";

/// Marker on a rule key that makes the attribute mandatory
pub const REQUIRED_MARKER: char = '!';

/// Attribute the record's device name is projected into
pub const DEVICE_NAME: &str = "device_name";

/// Default gate attribute name
pub const ADMIN_STATUS: &str = "if_AdminStatus";

/// Keep/drop verdict for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Record continues downstream
    Keep,
    /// Record is discarded
    Drop,
}

impl FilterDecision {
    pub fn from_drop(drop: bool) -> Self {
        if drop {
            FilterDecision::Drop
        } else {
            FilterDecision::Keep
        }
    }
}

/// Minimal view of a flow or SNMP record used by enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_port: Option<IfaceId>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interface(mut self, id: IfaceId) -> Self {
        self.input_port = Some(id);
        self
    }

    pub fn with_device(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Interface this record is attributed to
    pub fn interface(&self) -> Option<IfaceId> {
        self.input_port
    }
}

/// Identity of a polled metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricInfo {
    #[serde(default)]
    pub oid: String,
    #[serde(default)]
    pub mib: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub table: String,
}

/// Text a rule pattern is matched against
///
/// Strings are used verbatim, null is empty, everything else is rendered.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("up")), "up");
        assert_eq!(value_text(&json!(10)), "10");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&Value::Null), "");
    }

    #[test]
    fn test_with_interface_sets_input_port() {
        let record = Record::new().with_interface(10);
        assert_eq!(record.input_port, Some(10));
        assert_eq!(record.interface(), Some(10));
        assert_eq!(Record::new().interface(), None);
    }
}
