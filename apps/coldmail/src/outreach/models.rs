use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Keys tried, in order, when a skill comes back as an object.
const SKILL_NAME_KEYS: [&str; 3] = ["name", "skill", "title"];

/// One job posting as the model extracted it.
///
/// Every key is optional: a key the model left out stays out when the posting is
/// serialized back into the composition prompt. Field shapes are never fatal. Lists of
/// text are joined and anything else is kept as its JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "inline_text"
    )]
    pub role: Option<String>,

    /// Free text. Bare numbers such as `3` are kept as `"3"`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "inline_text"
    )]
    pub experience: Option<String>,

    /// Accepts a JSON array or one comma-separated string.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "skill_list"
    )]
    pub skills: Option<Vec<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "block_text"
    )]
    pub description: Option<String>,
}

impl JobPosting {
    /// Skills to retrieve links for. Empty when the model omitted the key.
    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or(&[])
    }

    /// Role for logs and error messages.
    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or("unknown role")
    }
}

fn inline_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| text_of(v, ", ")))
}

fn block_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| text_of(v, "\n")))
}

fn skill_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let skills = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items.into_iter().filter_map(skill_of).collect(),
        Some(Value::Object(map)) => map.into_iter().filter_map(|(_, v)| skill_of(v)).collect(),
        Some(other) => skill_of(other).into_iter().collect(),
    };
    Ok(Some(skills))
}

/// Text of a scalar, a list of scalars joined by `separator`, or the JSON text of
/// anything else. `None` for null and empty lists.
fn text_of(value: Value, separator: &str) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) if items.iter().all(is_scalar) => Some(
            items
                .into_iter()
                .filter_map(|item| text_of(item, separator))
                .collect::<Vec<_>>()
                .join(separator),
        ),
        other => Some(other.to_string()),
    }
}

fn skill_of(value: Value) -> Option<String> {
    let text = match value {
        Value::Object(ref map) => {
            let named = SKILL_NAME_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            Some(named.map_or_else(|| value.to_string(), str::to_string))
        }
        other => text_of(other, ", "),
    };
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
