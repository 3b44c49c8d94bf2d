use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One structurally distinct unit of rendered markdown.
///
/// The serialized form matches the block payloads the chat service attaches
/// to `replace` and `done` frames, e.g. `{"type":"heading","level":2,"text":"X"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        #[serde(default = "default_level")]
        level: u8,
        #[serde(default)]
        text: String,
    },
    Paragraph {
        #[serde(default)]
        text: String,
    },
    Blockquote {
        #[serde(default)]
        text: String,
    },
    List {
        #[serde(default)]
        ordered: bool,
        /// Only meaningful for ordered lists.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u32>,
        #[serde(default)]
        items: Vec<String>,
    },
    Code {
        #[serde(default = "default_language")]
        language: String,
        #[serde(default)]
        code: String,
    },
    #[serde(rename = "hr")]
    HorizontalRule,
}

fn default_level() -> u8 {
    1
}

fn default_language() -> String {
    "text".to_string()
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading { level, text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn blockquote(text: impl Into<String>) -> Self {
        Self::Blockquote { text: text.into() }
    }

    pub fn unordered<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::List {
            ordered: false,
            start: None,
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ordered<I, T>(start: u32, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::List {
            ordered: true,
            start: Some(start),
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn code(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Code { language: language.into(), code: code.into() }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code { .. })
    }
}

/// Deserializes an optional block list, dropping entries that do not match a
/// known block shape instead of rejecting the whole list.
pub fn lenient_blocks<'de, D>(deserializer: D) -> Result<Option<Vec<Block>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<Block>(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_server_blocks() {
        let fixture = json!([
            {"type": "heading", "level": 2, "text": "X"},
            {"type": "list", "ordered": false, "items": ["A", "B"]},
            {"type": "code", "code": "ls"},
            {"type": "hr"}
        ]);
        let actual: Vec<Block> = serde_json::from_value(fixture).unwrap();
        let expected = vec![
            Block::heading(2, "X"),
            Block::unordered(["A", "B"]),
            Block::code("text", "ls"),
            Block::HorizontalRule,
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_serialize_omits_start_for_unordered() {
        let actual = serde_json::to_value(Block::unordered(["a"])).unwrap();
        let expected = json!({"type": "list", "ordered": false, "items": ["a"]});
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_serialize_hr() {
        let actual = serde_json::to_value(Block::HorizontalRule).unwrap();
        assert_eq!(actual, json!({"type": "hr"}));
    }

    #[test]
    fn test_lenient_blocks_skips_unknown_types() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default, deserialize_with = "lenient_blocks")]
            blocks: Option<Vec<Block>>,
        }

        let fixture = json!({"blocks": [{"type": "table", "rows": []}, {"type": "paragraph", "text": "ok"}]});
        let actual = serde_json::from_value::<Wrapper>(fixture).unwrap().blocks;
        assert_eq!(actual, Some(vec![Block::paragraph("ok")]));
    }
}
