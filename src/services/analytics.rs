// Shapes grouped counts into the JSON forms the API returns.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::database::models::{Dimension, PreferenceSubmission};
use crate::database::GroupCount;

/// Key used for unanswered questions in flattened breakdowns.
pub const NULL_KEY: &str = "null";

/// `[{"genderIdentity": "CISGENDER_WOMAN", "count": 3}, {"genderIdentity": null, "count": 1}]`
pub fn distribution(dimension: Dimension, groups: &[GroupCount]) -> Value {
    Value::Array(
        groups
            .iter()
            .map(|group| {
                let mut row = Map::new();
                row.insert(dimension.field().to_string(), json!(group.value));
                row.insert("count".to_string(), json!(group.count));
                Value::Object(row)
            })
            .collect(),
    )
}

/// `{"CISGENDER_WOMAN": 3, "null": 1}`
pub fn flatten(groups: &[GroupCount]) -> BTreeMap<String, i64> {
    groups
        .iter()
        .map(|group| {
            let key = group.value.clone().unwrap_or_else(|| NULL_KEY.to_string());
            (key, group.count)
        })
        .collect()
}

/// Frequency of every preference across the submissions; a submission with
/// N preferences contributes N increments.
pub fn tally_preferences(submissions: &[PreferenceSubmission]) -> BTreeMap<String, i64> {
    let mut tally = BTreeMap::new();
    for preference in submissions.iter().flat_map(|s| s.preferences.iter()) {
        *tally.entry(preference.clone()).or_insert(0) += 1;
    }
    tally
}
