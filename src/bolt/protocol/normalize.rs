//! Canonical metadata keys.

use std::collections::HashMap;

use crate::bolt::packstream::PackStreamValue;

pub const RESULT_AVAILABLE_AFTER: &str = "result_available_after";
pub const RESULT_CONSUMED_AFTER: &str = "result_consumed_after";

/// Short keys sent by servers and their canonical names.
const RENAMES: [(&str, &str); 2] = [
    ("t_first", RESULT_AVAILABLE_AFTER),
    ("t_last", RESULT_CONSUMED_AFTER),
];

/// Rename version-specific SUCCESS keys to the canonical set.
///
/// A canonical key that is already present is kept as is.
pub fn normalize_metadata(
    mut metadata: HashMap<String, PackStreamValue>,
) -> HashMap<String, PackStreamValue> {
    for (short, canonical) in RENAMES {
        if let Some(value) = metadata.remove(short) {
            metadata.entry(canonical.to_string()).or_insert(value);
        }
    }
    metadata
}
