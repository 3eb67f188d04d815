//! Parsed-document abstraction and accessor-path resolution
//!
//! The fetch collaborator hands over an already-parsed document. Tree
//! content arrives behind [`DomDocument`]; structured data arrives as a
//! JSON value and is traversed with dotted/bracketed accessor paths;
//! opaque bodies (media, generic resources) arrive raw.

use crate::element::ElementHandle;
use mast_core::{MastError, Result};
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

/// Native tree-query capability for markup-backed responses
pub trait DomDocument: Send + Sync {
    /// First element matching the selector
    fn query_one(&self, selector: &str) -> Option<ElementHandle>;

    /// Every element matching the selector, in document order
    fn query_all(&self, selector: &str) -> Vec<ElementHandle>;

    /// Run a script against the live document. Only rendering-engine
    /// adapters override this.
    fn evaluate(&self, script: &str) -> Result<Json> {
        let _ = script;
        Err(MastError::Other(
            "document does not support script evaluation".to_string(),
        ))
    }
}

/// One parsed document, owned exclusively by its response
#[derive(Clone)]
pub enum Document {
    /// Markup tree with a native query mechanism
    Dom(Arc<dyn DomDocument>),
    /// Structured data traversed by accessor path
    Data(Json),
    /// Opaque bytes (images, video, generic resources)
    Raw(Vec<u8>),
}

impl Document {
    pub fn is_dom(&self) -> bool {
        matches!(self, Self::Dom(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    pub fn as_data(&self) -> Option<&Json> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_dom(&self) -> Option<&Arc<dyn DomDocument>> {
        match self {
            Self::Dom(doc) => Some(doc),
            _ => None,
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dom(_) => write!(f, "Document::Dom"),
            Self::Data(_) => write!(f, "Document::Data"),
            Self::Raw(bytes) => write!(f, "Document::Raw({} bytes)", bytes.len()),
        }
    }
}

/// Split an accessor path into segments
///
/// Bracket indexing is normalized to dots: `items[2].title` and
/// `items.2.title` both split to `["items", "2", "title"]`. Quotes are
/// stripped inside bracket segments only, so a bare key containing one
/// stays addressable.
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;
    for c in path.chars() {
        match c {
            '.' | '[' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                in_bracket = c == '[';
            }
            ']' if in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                in_bracket = false;
            }
            '"' | '\'' if in_bracket => {}
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Resolve an accessor path against a data document
///
/// An empty path resolves to the root. A segment that is not an object
/// key or a valid array index resolves to nothing.
pub fn resolve_path<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    let mut current = root;
    for segment in split_path(path) {
        current = match current {
            Json::Object(map) => map.get(&segment)?,
            Json::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Join a base path and a child selector into one dotted path
pub fn join_path(base: &str, child: &str) -> String {
    if base.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        base.to_string()
    } else {
        format!("{}.{}", base, child)
    }
}
