use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A knowledge-base document cited by an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub file_name: String,
}

impl SourceRef {
    pub fn new(
        project: impl Into<String>,
        file: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            file: file.into(),
            file_name: file_name.into(),
        }
    }
}

/// Deserializes an optional source list, skipping entries that are not
/// objects.
pub fn lenient_sources<'de, D>(deserializer: D) -> Result<Option<Vec<SourceRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<SourceRef>(item).ok())
                .collect(),
        ),
        _ => None,
    })
}
