//! Tagged value variants for queryable nodes
//!
//! Everything a node can wrap is one of these variants. Shape checks and
//! per-shape behavior are matches on the tag, not runtime probing of the
//! underlying data.

use crate::element::ElementSet;
use serde_json::Value as Json;

/// The value wrapped by one [`crate::Node`]
#[derive(Debug, Clone)]
pub enum Value {
    /// One or more document elements from a native tree query
    Elements(ElementSet),
    /// A plain object, traversed via synthetic paths
    Object(serde_json::Map<String, Json>),
    /// A plain array, traversed via synthetic paths
    Array(Vec<Json>),
    /// A string, number, or boolean
    Scalar(Json),
    /// Nothing selected, or a traversal that found no match
    Null,
}

impl Value {
    /// Classify a JSON value into its variant
    pub fn from_json(value: Json) -> Self {
        match value {
            Json::Null => Self::Null,
            Json::Object(map) => Self::Object(map),
            Json::Array(items) => Self::Array(items),
            scalar => Self::Scalar(scalar),
        }
    }

    /// The type tag assertions like `is("array")` match against
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Elements(_) => "element",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Scalar(Json::String(_)) => "string",
            Self::Scalar(Json::Number(_)) => "number",
            Self::Scalar(Json::Bool(_)) => "boolean",
            Self::Scalar(_) | Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::Scalar(Json::String(_)))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_elements(&self) -> bool {
        matches!(self, Self::Elements(_))
    }

    pub fn as_elements(&self) -> Option<&ElementSet> {
        match self {
            Self::Elements(set) => Some(set),
            _ => None,
        }
    }

    /// First element's tag name, for element values only
    pub fn tag_name(&self) -> Option<String> {
        self.as_elements().and_then(|set| set.tag_name())
    }

    /// Element count, array length, or string character count; zero for
    /// anything that has no length
    pub fn len(&self) -> usize {
        match self {
            Self::Elements(set) => set.len(),
            Self::Array(items) => items.len(),
            Self::Scalar(Json::String(s)) => s.chars().count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The string form used by comparisons and scalar transforms
    ///
    /// Elements render their combined text, falling back to the first
    /// form value when the text is empty. Scalars render without JSON
    /// quoting. Null renders as the literal `"null"`.
    pub fn render_string(&self) -> String {
        match self {
            Self::Elements(set) => {
                let text = set.text();
                if text.is_empty() {
                    set.form_value().unwrap_or_default()
                } else {
                    text
                }
            }
            Self::Object(map) => Json::Object(map.clone()).to_string(),
            Self::Array(items) => Json::Array(items.clone()).to_string(),
            Self::Scalar(Json::String(s)) => s.clone(),
            Self::Scalar(other) => other.to_string(),
            Self::Null => "null".to_string(),
        }
    }

    /// Numeric view of the value, when its string form parses as one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(Json::Number(n)) => n.as_f64(),
            _ => self.render_string().trim().parse().ok(),
        }
    }

    /// Convert back to a plain JSON value; elements degrade to their
    /// rendered text
    pub fn to_json(&self) -> Json {
        match self {
            Self::Elements(set) => Json::String(set.text()),
            Self::Object(map) => Json::Object(map.clone()),
            Self::Array(items) => Json::Array(items.clone()),
            Self::Scalar(scalar) => scalar.clone(),
            Self::Null => Json::Null,
        }
    }
}
