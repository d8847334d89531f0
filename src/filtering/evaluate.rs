// Filter evaluation: keep/drop verdict for an enriched attribute map
use super::snapshot::MetadataSnapshot;
use super::types::AttributeMap;

/// Decide whether a record should be discarded
///
/// Order of checks:
/// 1. no rules at all keeps everything
/// 2. a present gate attribute that does not match drops
/// 3. a required rule whose attribute is absent drops
/// 4. if any rule applied (attribute present) and none matched, drop
///
/// Absent optional attributes contribute nothing. The result does not depend
/// on rule order. `_interface_scoped` is accepted but has no effect.
pub fn should_drop(
    attrs: &AttributeMap,
    snapshot: &MetadataSnapshot,
    _interface_scoped: bool,
) -> bool {
    let rules = &snapshot.rules;
    if rules.is_empty() {
        return false;
    }

    if let Some(gate) = rules.gate() {
        if let Some(value) = attrs.get(&gate.attribute) {
            if !gate.is_match(value) {
                tracing::trace!("Dropping: gate {} did not match", gate.attribute);
                return true;
            }
        }
    }

    let mut applicable = false;
    let mut satisfied = false;
    for rule in rules.rules() {
        match attrs.get(&rule.attribute) {
            None if rule.required => {
                tracing::trace!("Dropping: required attribute {} missing", rule.attribute);
                return true;
            }
            None => {}
            Some(value) => {
                applicable = true;
                if rule.is_match(value) {
                    satisfied = true;
                }
            }
        }
    }

    applicable && !satisfied
}
