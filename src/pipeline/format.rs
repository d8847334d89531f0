// Output formatting for kept records
use crate::error::{NetmetaError, Result};
use crate::filtering::AttributeMap;

/// Serializes a batch of kept records into one payload
pub trait Formatter: Send + Sync {
    fn format(&self, records: &[AttributeMap]) -> Result<Vec<u8>>;
}

/// One JSON object per line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesFormatter;

impl Formatter for JsonLinesFormatter {
    fn format(&self, records: &[AttributeMap]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for record in records {
            serde_json::to_writer(&mut out, record).map_err(|e| NetmetaError::Json {
                source: e,
                context: "Failed to format record".to_string(),
            })?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_one_object_per_line() {
        let records = vec![
            AttributeMap::from([("if_Description".to_string(), json!("igb3"))]),
            AttributeMap::from([("device_name".to_string(), json!("edge1"))]),
        ];

        let out = JsonLinesFormatter.format(&records).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["if_Description"], "igb3");
    }

    #[test]
    fn test_empty_batch() {
        assert!(JsonLinesFormatter.format(&[]).unwrap().is_empty());
    }
}
