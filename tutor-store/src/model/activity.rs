use serde::{Deserialize, Serialize};

use crate::model::de::string_or_number;

/// Activity record. Only the identifier is interpreted client-side; every
/// other field is carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Activity {
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(serde_json::Value::as_str)
    }
}

/// Body of the `mark-as-done` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub student_id: String,
    pub activity_id: String,
    pub score: u32,
}
