//! Document-element capability contract
//!
//! Mast does not parse markup or drive a rendering engine itself. An
//! external adapter (static HTML parser, browser bridge) exposes its
//! elements through [`DomElement`] and the node layer works purely
//! against that trait.

use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

/// Shared handle to one element owned by an external document adapter
pub type ElementHandle = Arc<dyn DomElement>;

/// The per-element capability set the node layer requires
///
/// Accessors come first, then the native structural queries. Selector
/// strings are passed through to the adapter verbatim; Mast does not
/// define its own selector language.
pub trait DomElement: Send + Sync {
    fn tag_name(&self) -> String;

    fn attribute(&self, key: &str) -> Option<String>;

    /// Element property lookup; adapters without a property concept fall
    /// back to attributes
    fn property(&self, key: &str) -> Option<Json> {
        self.attribute(key).map(Json::String)
    }

    /// `data-*` lookup
    fn data(&self, key: &str) -> Option<Json> {
        self.attribute(&format!("data-{}", key)).map(Json::String)
    }

    /// Rendered text content
    fn text(&self) -> String;

    /// Current form value, for elements that carry one
    fn form_value(&self) -> Option<String> {
        None
    }

    /// Set the form value; returns false when the element is not a field
    fn set_form_value(&self, value: &str) -> bool {
        let _ = value;
        false
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Name/value pairs of the fields under a form element
    fn serialize_fields(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    // Native structural queries

    fn parent(&self) -> Option<ElementHandle>;

    fn children(&self, selector: Option<&str>) -> Vec<ElementHandle>;

    fn siblings(&self, selector: Option<&str>) -> Vec<ElementHandle>;

    fn next(&self, selector: Option<&str>) -> Option<ElementHandle>;

    fn prev(&self, selector: Option<&str>) -> Option<ElementHandle>;

    fn closest(&self, selector: &str) -> Option<ElementHandle>;

    fn parents(&self, selector: &str) -> Vec<ElementHandle>;

    fn find(&self, selector: &str) -> Vec<ElementHandle>;
}

/// Ordered collection of element handles
///
/// Selection and traversal return sets rather than single elements, the
/// way native query mechanisms do; a set may be empty, which `exists()`
/// assertions treat as absence.
#[derive(Clone, Default)]
pub struct ElementSet {
    elements: Vec<ElementHandle>,
}

impl ElementSet {
    pub fn new(elements: Vec<ElementHandle>) -> Self {
        Self { elements }
    }

    pub fn single(element: ElementHandle) -> Self {
        Self {
            elements: vec![element],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_option(element: Option<ElementHandle>) -> Self {
        match element {
            Some(el) => Self::single(el),
            None => Self::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first(&self) -> Option<&ElementHandle> {
        self.elements.first()
    }

    pub fn get(&self, index: usize) -> Option<&ElementHandle> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementHandle> {
        self.elements.iter()
    }

    /// Combined rendered text of every element in the set
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .map(|el| el.text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// First element's form value
    pub fn form_value(&self) -> Option<String> {
        self.first().and_then(|el| el.form_value())
    }

    /// First element's tag name
    pub fn tag_name(&self) -> Option<String> {
        self.first().map(|el| el.tag_name())
    }

    /// First element's attribute
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.first().and_then(|el| el.attribute(key))
    }

    /// First element's property
    pub fn property(&self, key: &str) -> Option<Json> {
        self.first().and_then(|el| el.property(key))
    }

    /// First element's data attribute
    pub fn data(&self, key: &str) -> Option<Json> {
        self.first().and_then(|el| el.data(key))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.first().map(|el| el.has_class(class)).unwrap_or(false)
    }
}

impl fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<String> = self.elements.iter().map(|el| el.tag_name()).collect();
        f.debug_struct("ElementSet").field("tags", &tags).finish()
    }
}

impl From<Vec<ElementHandle>> for ElementSet {
    fn from(elements: Vec<ElementHandle>) -> Self {
        Self::new(elements)
    }
}
