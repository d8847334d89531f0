// Rule set compilation
// Turns the configured `attribute -> regex` mapping into compiled rules,
// splitting out the gate attribute and parsing the `!` required marker once.
use regex::Regex;
use serde_json::Value;

use super::types::{value_text, REQUIRED_MARKER};
use crate::error::{NetmetaError, Result};

/// Ordinary keep/drop rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Attribute name with any `!` marker removed
    pub attribute: String,
    /// Unanchored pattern
    pub pattern: Regex,
    /// Absence of the attribute forces a drop
    pub required: bool,
}

impl Rule {
    /// Build a rule from a configured key, honouring the `!` marker
    pub fn new(key: &str, pattern: Regex) -> Self {
        let (attribute, required) = match key.strip_prefix(REQUIRED_MARKER) {
            Some(stripped) => (stripped.to_string(), true),
            None => (key.to_string(), false),
        };
        Self {
            attribute,
            pattern,
            required,
        }
    }

    pub fn is_match(&self, value: &Value) -> bool {
        self.pattern.is_match(&value_text(value))
    }
}

/// Rule on the gate attribute; a present, mismatching value always drops
#[derive(Debug, Clone)]
pub struct GateRule {
    pub attribute: String,
    pub pattern: Regex,
}

impl GateRule {
    pub fn is_match(&self, value: &Value) -> bool {
        self.pattern.is_match(&value_text(value))
    }
}

/// Compiled rule set: an optional gate plus ordinary rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    gate_attribute: String,
    gate: Option<GateRule>,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile configured patterns
    ///
    /// The entry whose key equals `gate_attribute` becomes the gate rule; every
    /// other entry becomes an ordinary rule. Invalid patterns are rejected here
    /// so evaluation itself never fails.
    pub fn compile<I, K, V>(gate_attribute: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let compiled = entries
            .into_iter()
            .map(|(key, pattern)| {
                let key = key.as_ref();
                Regex::new(pattern.as_ref())
                    .map(|regex| (key.to_string(), regex))
                    .map_err(|e| NetmetaError::InvalidPattern {
                        key: key.to_string(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_regexes(gate_attribute, compiled))
    }

    /// Build from already compiled patterns
    pub fn from_regexes<I>(gate_attribute: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Regex)>,
    {
        let mut gate = None;
        let mut rules = Vec::new();

        for (key, pattern) in entries {
            if key == gate_attribute {
                gate = Some(GateRule {
                    attribute: key,
                    pattern,
                });
            } else {
                rules.push(Rule::new(&key, pattern));
            }
        }

        Self {
            gate_attribute: gate_attribute.to_string(),
            gate,
            rules,
        }
    }

    /// Rule set with no rules; keeps everything
    pub fn empty(gate_attribute: &str) -> Self {
        Self {
            gate_attribute: gate_attribute.to_string(),
            gate: None,
            rules: Vec::new(),
        }
    }

    pub fn gate_attribute(&self) -> &str {
        &self.gate_attribute
    }

    pub fn gate(&self) -> Option<&GateRule> {
        self.gate.as_ref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.gate.is_none() && self.rules.is_empty()
    }

    /// Number of entries including the gate
    pub fn len(&self) -> usize {
        self.rules.len() + usize::from(self.gate.is_some())
    }
}
