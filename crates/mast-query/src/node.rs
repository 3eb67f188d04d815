//! Queryable node: one immutable, chainable wrapper per traversed value
//!
//! Every traversal, transform, and assertion returns a new node; the
//! receiver is never mutated. Traversal context (the resolved accessor
//! path for data values, the most recent element selection, pending
//! `not`/`label` modifiers) rides along explicitly on each node instead
//! of living as shared response state.

use crate::element::ElementSet;
use crate::response::Response;
use crate::value::Value;
use mast_core::Result;
use regex::Regex;
use serde_json::Value as Json;
use url::form_urlencoded;

/// Traversal state carried through one assertion chain
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    /// Resolved dotted path of the current selection, for data-backed
    /// values that have no native ancestry
    pub path: Option<String>,
    /// Most recent element selection in this chain, used as the final
    /// fallback for attribute/property/data lookups
    pub last_elements: Option<ElementSet>,
    /// Invert the outcome of the next assertion
    pub flip_next: bool,
    /// Override the next assertion's message
    pub label: Option<String>,
}

impl SelectionContext {
    pub fn for_elements(set: ElementSet) -> Self {
        Self {
            last_elements: Some(set),
            ..Self::default()
        }
    }

    pub fn for_path(path: String) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }
}

/// A scenario that node-level navigation (click, submit) can configure
///
/// Implemented by the runner layer; the node layer only needs to point
/// the next scenario at a URL with the right method and payload.
pub trait Navigable {
    fn is_done(&self) -> bool;
    fn open(&self, url: &str);
    fn set_method(&self, method: &str);
    fn set_form(&self, fields: Vec<(String, String)>);
}

/// One traversed/transformed value plus its display name
#[derive(Clone)]
pub struct Node<'r> {
    response: &'r Response,
    name: String,
    value: Value,
    ctx: SelectionContext,
}

impl<'r> Node<'r> {
    pub(crate) fn new(
        response: &'r Response,
        name: impl Into<String>,
        value: Value,
        ctx: SelectionContext,
    ) -> Self {
        Self {
            response,
            name: name.into(),
            value,
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw wrapped value
    pub fn get(&self) -> &Value {
        &self.value
    }

    /// The indexed child for arrays and element collections
    pub fn get_index(&self, index: usize) -> Value {
        match &self.value {
            Value::Array(items) => items
                .get(index)
                .cloned()
                .map(Value::from_json)
                .unwrap_or(Value::Null),
            Value::Elements(set) => set
                .get(index)
                .cloned()
                .map(|el| Value::Elements(ElementSet::single(el)))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    pub fn context(&self) -> &SelectionContext {
        &self.ctx
    }

    // Type introspection

    pub fn is_null_or_undefined(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    pub fn is_string(&self) -> bool {
        self.value.is_string()
    }

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn is_dom_element(&self) -> bool {
        self.value.is_elements()
    }

    pub fn tag_name(&self) -> Option<String> {
        self.value.tag_name()
    }

    pub fn is_form_element(&self) -> bool {
        self.tag_name().as_deref() == Some("form")
    }

    pub fn is_button_element(&self) -> bool {
        self.tag_name().as_deref() == Some("button")
    }

    pub fn is_link_element(&self) -> bool {
        self.tag_name().as_deref() == Some("a")
    }

    pub fn is_clickable(&self) -> bool {
        self.is_link_element() || self.is_button_element()
    }

    // Derivation helpers; transforms keep the chain context with pending
    // modifiers cleared

    fn carried_ctx(&self) -> SelectionContext {
        SelectionContext {
            flip_next: false,
            label: None,
            ..self.ctx.clone()
        }
    }

    fn derive(&self, name: String, value: Value) -> Node<'r> {
        Node::new(self.response, name, value, self.carried_ctx())
    }

    fn elements_node(&self, name: String, set: ElementSet) -> Node<'r> {
        let ctx = SelectionContext {
            path: self.ctx.path.clone(),
            ..SelectionContext::for_elements(set.clone())
        };
        Node::new(self.response, name, Value::Elements(set), ctx)
    }

    fn null_node(&self, name: String) -> Node<'r> {
        Node::new(self.response, name, Value::Null, SelectionContext::default())
    }

    fn log_fail(&self, message: &str) {
        self.response.sink().fail(message);
    }

    /// Select another value from the owning response
    pub fn select(&self, path: &str) -> Result<Node<'r>> {
        self.response.select(path)
    }

    /// One response header wrapped as a node
    pub fn headers(&self, key: &str) -> Node<'r> {
        self.response.headers(Some(key))
    }

    /// The HTTP status wrapped as a node
    pub fn status(&self) -> Node<'r> {
        self.response.status()
    }

    /// The fetch time wrapped as a node
    pub fn load_time(&self) -> Node<'r> {
        self.response.load_time()
    }

    /// Get back to the last selected element in this chain
    pub fn and(&self) -> Node<'r> {
        if let Some(set) = &self.ctx.last_elements {
            if !set.is_empty() {
                return self.elements_node("last selected element".to_string(), set.clone());
            }
        }
        if let Some(path) = self.ctx.path.clone() {
            if let Ok(node) = self.response.select(&path) {
                return node;
            }
        }
        self.null_node("last selected element".to_string())
    }

    /// Flip the outcome of the next assertion
    pub fn not(&self) -> Node<'r> {
        let mut node = self.clone();
        node.ctx.flip_next = true;
        node
    }

    /// Write a comment line to the scenario log
    pub fn comment(&self, message: &str) -> Node<'r> {
        self.response.sink().comment(message);
        self.clone()
    }

    /// Override the next assertion's message with something more
    /// human readable
    pub fn label(&self, message: &str) -> Node<'r> {
        let mut node = self.clone();
        node.ctx.label = Some(message.to_string());
        node
    }

    /// Spit out the current value, for debugging
    pub fn echo(&self) -> Node<'r> {
        self.comment(&format!("{} = {}", self.name, self.value.render_string()))
    }

    /// Spit out the current value's type, for debugging
    pub fn type_of(&self) -> Node<'r> {
        self.comment(&format!("typeof {} = {}", self.name, self.value.type_name()))
    }

    // Simulated actions

    /// Click this link or submit button, pointing the next scenario at
    /// the target. Anything else logs a failure and the chain continues.
    pub fn click(&self, next: &dyn Navigable) -> Node<'r> {
        if self.is_link_element() {
            let href = self
                .value
                .as_elements()
                .and_then(|set| set.attribute("href"))
                .unwrap_or_default();
            if href.is_empty() {
                self.log_fail("Link has no href");
            } else if !next.is_done() {
                next.open(&href);
            }
        } else if self.is_button_element() {
            let button_type = self
                .value
                .as_elements()
                .and_then(|set| set.attribute("type"))
                .unwrap_or_default();
            if button_type.eq_ignore_ascii_case("submit") {
                let form = self
                    .value
                    .as_elements()
                    .and_then(|set| set.first())
                    .and_then(|el| el.closest("form"));
                match form {
                    Some(form) => {
                        self.elements_node("form".to_string(), ElementSet::single(form))
                            .submit(next);
                    }
                    None => self.log_fail("No form found for submit button"),
                }
            }
        } else {
            self.log_fail("Not a clickable element");
        }
        self.clone()
    }

    /// Submit this form, serializing its fields onto the next scenario
    pub fn submit(&self, next: &dyn Navigable) -> Node<'r> {
        if !self.is_form_element() {
            self.log_fail("Not a form");
            return self.clone();
        }
        let set = match self.value.as_elements() {
            Some(set) => set,
            None => return self.clone(),
        };
        // Submit to the form action, or back to self
        let action = set
            .attribute("action")
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.response.meta().url.clone());
        if action.is_empty() {
            return self.clone();
        }
        let method = set
            .attribute("method")
            .unwrap_or_else(|| "get".to_string())
            .to_lowercase();
        let fields = set
            .first()
            .map(|el| el.serialize_fields())
            .unwrap_or_default();
        next.set_method(&method);
        let target = if method == "get" {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            format!("{}?{}", action.split('?').next().unwrap_or(""), query)
        } else {
            next.set_form(fields);
            action
        };
        if !next.is_done() {
            self.response.sink().comment("Submitting form");
            next.open(&target);
        }
        self.clone()
    }

    /// Set named form fields, asserting each took the requested value
    pub fn fill_form(&self, fields: &[(String, String)]) -> Node<'r> {
        if !self.is_form_element() {
            self.log_fail("Not a form");
            return self.clone();
        }
        self.response.sink().comment("Filling out form");
        let form = self.value.as_elements().and_then(|set| set.first());
        for (name, value) in fields {
            let selector = format!("[name=\"{}\"]", name);
            let field = form.and_then(|el| el.find(&selector).into_iter().next());
            let took = field
                .map(|f| {
                    f.set_form_value(value);
                    f.form_value().as_deref() == Some(value.as_str())
                })
                .unwrap_or(false);
            self.response.assert(
                took,
                &format!("Form field {} equals {}", name, value),
                &format!("Form field {} does not equal {}", name, value),
            );
        }
        self.clone()
    }

    // Traversal. Element values use the document's native structural
    // queries; object/array values synthesize ancestry from the dotted
    // selection path.

    /// Select within the current value
    pub fn find(&self, selector: &str) -> Node<'r> {
        match &self.value {
            Value::Elements(set) => {
                let found = set
                    .first()
                    .map(|el| el.find(selector))
                    .unwrap_or_default();
                self.elements_node(selector.to_string(), ElementSet::new(found))
            }
            Value::Object(_) | Value::Array(_) => self.select_relative(selector),
            _ => self.null_node(selector.to_string()),
        }
    }

    fn select_relative(&self, selector: &str) -> Node<'r> {
        let base = self.ctx.path.clone().unwrap_or_default();
        let joined = crate::document::join_path(&base, selector);
        match self.response.select(&joined) {
            Ok(node) => node,
            Err(_) => self.null_node(selector.to_string()),
        }
    }

    fn path_segments(&self) -> Vec<String> {
        self.ctx
            .path
            .as_deref()
            .map(crate::document::split_path)
            .unwrap_or_default()
    }

    fn reselect_segments(&self, segments: &[String]) -> Node<'r> {
        match self.response.select(&segments.join(".")) {
            Ok(node) => node,
            Err(_) => self.null_node("parent".to_string()),
        }
    }

    /// Closest ancestor matching the selector
    ///
    /// For data values the scan walks the path segments backward
    /// starting at the last one, comparing each segment textually
    /// against the selector.
    pub fn closest(&self, selector: &str) -> Node<'r> {
        let name = format!("closest {}", selector);
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().and_then(|el| el.closest(selector));
                self.elements_node(name, ElementSet::from_option(found))
            }
            Value::Object(_) | Value::Array(_) => {
                let segments = self.path_segments();
                for i in (0..segments.len()).rev() {
                    if segments[i] == selector {
                        return self.reselect_segments(&segments[..=i]);
                    }
                }
                self.null_node(name)
            }
            _ => self.null_node(name),
        }
    }

    /// Ancestors matching the selector; with no selector this is the
    /// same as `parent`
    ///
    /// The data-value scan starts at the second-to-last path segment.
    pub fn parents(&self, selector: Option<&str>) -> Node<'r> {
        let selector = match selector {
            Some(selector) => selector,
            None => return self.parent(),
        };
        let name = format!("parent {}", selector);
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().map(|el| el.parents(selector)).unwrap_or_default();
                self.elements_node(name, ElementSet::new(found))
            }
            Value::Object(_) | Value::Array(_) => {
                let segments = self.path_segments();
                if segments.len() > 1 {
                    for i in (0..segments.len() - 1).rev() {
                        if segments[i] == selector {
                            return self.reselect_segments(&segments[..=i]);
                        }
                    }
                }
                self.null_node(name)
            }
            _ => self.null_node(name),
        }
    }

    /// Immediate parent; for data values, the path minus its last
    /// segment, or the document root at depth one
    pub fn parent(&self) -> Node<'r> {
        let name = "parent".to_string();
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().and_then(|el| el.parent());
                self.elements_node(name, ElementSet::from_option(found))
            }
            Value::Object(_) | Value::Array(_) => {
                let segments = self.path_segments();
                if segments.len() > 1 {
                    self.reselect_segments(&segments[..segments.len() - 1])
                } else {
                    Node::new(
                        self.response,
                        name,
                        self.response.root_value(),
                        SelectionContext::for_path(String::new()),
                    )
                }
            }
            _ => self.null_node(name),
        }
    }

    /// Siblings matching the selector; data values re-select the
    /// selector under the same parent path
    pub fn siblings(&self, selector: Option<&str>) -> Node<'r> {
        let name = format!("siblings {}", selector.unwrap_or(""));
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().map(|el| el.siblings(selector)).unwrap_or_default();
                self.elements_node(name, ElementSet::new(found))
            }
            Value::Object(_) | Value::Array(_) => self.parent().children(selector),
            _ => self.null_node(name),
        }
    }

    /// Children matching the selector
    pub fn children(&self, selector: Option<&str>) -> Node<'r> {
        let name = format!("children {}", selector.unwrap_or(""));
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().map(|el| el.children(selector)).unwrap_or_default();
                self.elements_node(name, ElementSet::new(found))
            }
            Value::Object(_) | Value::Array(_) => match selector {
                Some(selector) => self.select_relative(selector),
                None => self.derive(name, self.value.clone()),
            },
            _ => self.null_node(name),
        }
    }

    /// Next sibling; data values only distinguish sibling existence
    /// under the same parent, not ordinal position
    pub fn next(&self, selector: Option<&str>) -> Node<'r> {
        let name = format!("next {}", selector.unwrap_or(""));
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().and_then(|el| el.next(selector));
                self.elements_node(name, ElementSet::from_option(found))
            }
            Value::Object(_) | Value::Array(_) => self.parent().children(selector),
            _ => self.null_node(name),
        }
    }

    /// Previous sibling; same synthetic semantics as `next`
    pub fn prev(&self, selector: Option<&str>) -> Node<'r> {
        let name = format!("prev {}", selector.unwrap_or(""));
        match &self.value {
            Value::Elements(set) => {
                let found = set.first().and_then(|el| el.prev(selector));
                self.elements_node(name, ElementSet::from_option(found))
            }
            Value::Object(_) | Value::Array(_) => self.parent().children(selector),
            _ => self.null_node(name),
        }
    }

    // Indexing

    /// The i-th entry of an array or element collection; out of range or
    /// negative wraps null
    pub fn nth(&self, index: i64) -> Node<'r> {
        let name = format!("{}[{}]", self.name, index);
        if index < 0 {
            return self.null_node(name);
        }
        match self.get_index(index as usize) {
            Value::Elements(set) => self.elements_node(name, set),
            Value::Null => self.null_node(name),
            other => {
                let mut ctx = self.carried_ctx();
                if self.value.is_array() {
                    ctx.path = ctx
                        .path
                        .map(|p| crate::document::join_path(&p, &index.to_string()));
                }
                Node::new(self.response, name, other, ctx)
            }
        }
    }

    /// Alias for nth
    pub fn eq(&self, index: i64) -> Node<'r> {
        self.nth(index)
    }

    pub fn first(&self) -> Node<'r> {
        self.nth(0)
    }

    pub fn last(&self) -> Node<'r> {
        let len = self.value.len();
        if len > 0 {
            self.nth(len as i64 - 1)
        } else {
            self.nth(-1)
        }
    }

    // Properties and attributes. Three tiers: native element lookup,
    // own-property lookup on a plain object, then the chain's last
    // selected element.

    fn keyed_lookup(
        &self,
        key: &str,
        from_elements: impl Fn(&ElementSet) -> Option<Json>,
    ) -> Node<'r> {
        let name = format!("{}[{}]", self.name, key);
        let value = match &self.value {
            Value::Elements(set) => from_elements(set),
            Value::Object(map) if map.contains_key(key) => map.get(key).cloned(),
            _ => self
                .ctx
                .last_elements
                .as_ref()
                .filter(|set| !set.is_empty())
                .and_then(|set| from_elements(set)),
        };
        self.derive(
            name,
            value.map(Value::from_json).unwrap_or(Value::Null),
        )
    }

    pub fn attribute(&self, key: &str) -> Node<'r> {
        self.keyed_lookup(key, |set| set.attribute(key).map(Json::String))
    }

    pub fn property(&self, key: &str) -> Node<'r> {
        self.keyed_lookup(key, |set| set.property(key))
    }

    pub fn data(&self, key: &str) -> Node<'r> {
        self.keyed_lookup(key, |set| set.data(key))
    }

    // Scalar transforms

    /// The form value of an element, or the value itself
    pub fn val(&self) -> Node<'r> {
        let name = format!("Value of {}", self.name);
        let value = match &self.value {
            Value::Elements(set) => set
                .form_value()
                .map(|v| Value::Scalar(Json::String(v)))
                .unwrap_or(Value::Null),
            Value::Null => Value::Null,
            other => other.clone(),
        };
        self.derive(name, value)
    }

    /// The rendered text of an element, or the string form of the value
    pub fn text(&self) -> Node<'r> {
        let name = format!("Text of {}", self.name);
        let value = match &self.value {
            Value::Elements(set) => Value::Scalar(Json::String(set.text())),
            Value::Null => Value::Null,
            other => Value::Scalar(Json::String(other.render_string())),
        };
        self.derive(name, value)
    }

    /// Element count, array length, or string length; zero otherwise
    pub fn length(&self) -> Node<'r> {
        self.derive(
            format!("Length of {}", self.name),
            Value::Scalar(Json::from(self.value.len())),
        )
    }

    pub fn parse_float(&self) -> Node<'r> {
        let name = format!("Float of {}", self.name);
        let value = parse_prefix_float(&self.value.render_string())
            .and_then(|f| serde_json::Number::from_f64(f).map(Json::Number))
            .map(Value::Scalar)
            .unwrap_or(Value::Null);
        self.derive(name, value)
    }

    pub fn parse_int(&self) -> Node<'r> {
        let name = format!("Integer of {}", self.name);
        let value = parse_prefix_int(&self.value.render_string())
            .map(|i| Value::Scalar(Json::from(i)))
            .unwrap_or(Value::Null);
        self.derive(name, value)
    }

    pub fn trim(&self) -> Node<'r> {
        self.derive(
            format!("Trimmed text of {}", self.name),
            Value::Scalar(Json::String(self.value.render_string().trim().to_string())),
        )
    }

    pub fn to_lower_case(&self) -> Node<'r> {
        self.derive(
            format!("Lowercased text of {}", self.name),
            Value::Scalar(Json::String(self.value.render_string().to_lowercase())),
        )
    }

    pub fn to_upper_case(&self) -> Node<'r> {
        self.derive(
            format!("Uppercased text of {}", self.name),
            Value::Scalar(Json::String(self.value.render_string().to_uppercase())),
        )
    }

    pub fn replace(&self, search: &str, replacement: &str) -> Node<'r> {
        self.derive(
            format!("Replaced text of {}", self.name),
            Value::Scalar(Json::String(
                self.value.render_string().replace(search, replacement),
            )),
        )
    }

    // Loops

    /// Child node for one array item or object entry, extending the
    /// synthetic path so relative selection keeps working
    fn child_at(&self, segment: &str, item: Json) -> Node<'r> {
        let mut ctx = self.carried_ctx();
        ctx.path = ctx
            .path
            .map(|p| crate::document::join_path(&p, segment));
        Node::new(
            self.response,
            format!("{}[{}]", self.name, segment),
            Value::from_json(item),
            ctx,
        )
    }

    fn for_each_child(&self, mut callback: impl FnMut(Node<'r>)) {
        match &self.value {
            Value::Elements(set) => {
                for (i, el) in set.iter().enumerate() {
                    let child = ElementSet::single(el.clone());
                    callback(self.elements_node(format!("{}[{}]", self.name, i), child));
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    callback(self.child_at(&i.to_string(), item.clone()));
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    callback(self.child_at(key, item.clone()));
                }
            }
            Value::Scalar(Json::String(s)) => {
                for (i, word) in s.trim().split_whitespace().enumerate() {
                    callback(self.derive(
                        format!("{}[{}]", self.name, i),
                        Value::Scalar(Json::String(word.to_string())),
                    ));
                }
            }
            _ => {}
        }
    }

    /// Invoke the callback once per element, array item, object value,
    /// or whitespace-delimited word
    pub fn each(&self, mut callback: impl FnMut(Node<'r>)) -> Node<'r> {
        self.for_each_child(&mut callback);
        self.clone()
    }

    /// Like `each`, but suppresses assertion recording during the
    /// callbacks and logs one aggregate line: Pass iff every callback
    /// returned true
    pub fn every(&self, mut callback: impl FnMut(Node<'r>) -> bool) -> Node<'r> {
        let mut every = true;
        self.response.start_ignoring_assertions();
        self.for_each_child(|child| {
            if !callback(child) {
                every = false;
            }
        });
        self.response.stop_ignoring_assertions();
        self.assert(
            every,
            &format!("Every {} passed", self.name),
            &format!("Every {} did not pass", self.name),
        )
    }

    /// Like `every`, but the aggregate line is Pass iff at least one
    /// callback returned true
    pub fn some(&self, mut callback: impl FnMut(Node<'r>) -> bool) -> Node<'r> {
        let mut some = false;
        self.response.start_ignoring_assertions();
        self.for_each_child(|child| {
            if callback(child) {
                some = true;
            }
        });
        self.response.stop_ignoring_assertions();
        self.assert(
            some,
            &format!("Some {} passed", self.name),
            &format!("No {} passed", self.name),
        )
    }

    /// Alias for some
    pub fn any(&self, callback: impl FnMut(Node<'r>) -> bool) -> Node<'r> {
        self.some(callback)
    }

    // Assertions. A false predicate logs a Fail line and the chain
    // keeps going; nothing here ever panics or errors.

    /// The shared assertion primitive, applying any pending `not`/
    /// `label` modifiers
    pub fn assert(&self, statement: bool, pass_msg: &str, fail_msg: &str) -> Node<'r> {
        let statement = if self.ctx.flip_next {
            !statement
        } else {
            statement
        };
        match &self.ctx.label {
            Some(label) => self.response.assert(statement, label, label),
            None => self.response.assert(statement, pass_msg, fail_msg),
        };
        let mut node = self.clone();
        node.ctx.flip_next = false;
        node.ctx.label = None;
        node
    }

    /// Does this element or value exist?
    pub fn exists(&self) -> Node<'r> {
        let exists = match &self.value {
            Value::Elements(set) => !set.is_empty(),
            Value::Null => false,
            _ => true,
        };
        self.assert(
            exists,
            &format!("{} exists", self.name),
            &format!("{} does not exist", self.name),
        )
    }

    /// Is the value equal to this? Permissive matching lowercases and
    /// trims both sides first.
    pub fn equals(&self, value: impl ToString, permissive: bool) -> Node<'r> {
        let mut actual = self.value.render_string();
        let mut expected = value.to_string();
        let (positive, negative) = if permissive {
            actual = actual.trim().to_lowercase();
            expected = expected.trim().to_lowercase();
            ("is similar to", "is not similar to")
        } else {
            ("equals", "does not equal")
        };
        self.assert(
            actual == expected,
            &format!("{} {} {}", self.name, positive, expected),
            &format!("{} {} {} ({})", self.name, negative, expected, actual),
        )
    }

    /// Alias for permissive equals
    pub fn similar_to(&self, value: impl ToString) -> Node<'r> {
        self.equals(value, true)
    }

    /// Substring for strings, membership for arrays, key presence for
    /// objects
    pub fn contains(&self, needle: &str) -> Node<'r> {
        let contains = match &self.value {
            Value::Array(items) => items.iter().any(|item| {
                item == &Json::String(needle.to_string())
                    || Value::from_json(item.clone()).render_string() == needle
            }),
            Value::Object(map) => map.contains_key(needle),
            Value::Null => false,
            other => other.render_string().contains(needle),
        };
        self.assert(
            contains,
            &format!("{} contains {}", self.name, needle),
            &format!("{} does not contain {}", self.name, needle),
        )
    }

    /// Alias for contains
    pub fn contain(&self, needle: &str) -> Node<'r> {
        self.contains(needle)
    }

    /// Test the string form with a regular expression
    pub fn matches(&self, pattern: &Regex) -> Node<'r> {
        let value = self.value.render_string();
        self.assert(
            pattern.is_match(&value),
            &format!("{} matches {}", self.name, pattern),
            &format!("{} does not match {} ({})", self.name, pattern, value),
        )
    }

    pub fn starts_with(&self, prefix: &str) -> Node<'r> {
        let value = if self.value.is_null() {
            String::new()
        } else {
            self.value.render_string()
        };
        self.assert(
            !self.value.is_null() && value.starts_with(prefix),
            &format!("{} starts with {}", self.name, prefix),
            &format!("{} does not start with {} ({})", self.name, prefix, value),
        )
    }

    pub fn ends_with(&self, suffix: &str) -> Node<'r> {
        let value = if self.value.is_null() {
            String::new()
        } else {
            self.value.render_string()
        };
        self.assert(
            !self.value.is_null() && value.ends_with(suffix),
            &format!("{} ends with {}", self.name, suffix),
            &format!("{} does not end with {} ({})", self.name, suffix, value),
        )
    }

    /// Does the value's type tag match?
    pub fn is(&self, type_name: &str) -> Node<'r> {
        let actual = self.value.type_name();
        self.assert(
            actual == type_name.to_lowercase(),
            &format!("{} is type {}", self.name, type_name),
            &format!("{} is not type {} ({})", self.name, type_name, actual),
        )
    }

    /// Does this element have the class? No-op for non-element values.
    pub fn has_class(&self, class: &str) -> Node<'r> {
        if let Value::Elements(set) = &self.value {
            return self.assert(
                set.has_class(class),
                &format!("{} has class {}", self.name, class),
                &format!("{} does not have class {}", self.name, class),
            );
        }
        self.clone()
    }

    fn numeric_compare(
        &self,
        value: f64,
        relation: &str,
        compare: impl Fn(f64, f64) -> bool,
    ) -> Node<'r> {
        let actual = self.value.as_f64();
        let statement = actual.map(|a| compare(a, value)).unwrap_or(false);
        let rendered = self.value.render_string();
        self.assert(
            statement,
            &format!("{} is {} {} ({})", self.name, relation, value, rendered),
            &format!("{} is not {} {} ({})", self.name, relation, value, rendered),
        )
    }

    pub fn greater_than(&self, value: f64) -> Node<'r> {
        self.numeric_compare(value, "greater than", |a, b| a > b)
    }

    pub fn greater_than_or_equals(&self, value: f64) -> Node<'r> {
        self.numeric_compare(value, "greater than or equal to", |a, b| a >= b)
    }

    pub fn less_than(&self, value: f64) -> Node<'r> {
        self.numeric_compare(value, "less than", |a, b| a < b)
    }

    pub fn less_than_or_equals(&self, value: f64) -> Node<'r> {
        self.numeric_compare(value, "less than or equal to", |a, b| a <= b)
    }
}

impl std::fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value.render_string())
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// Longest numeric prefix, the way `parseFloat` reads "3.5em" as 3.5
fn parse_prefix_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    s[..end].parse().ok()
}

fn parse_prefix_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit() || ((c == '-' || c == '+') && i == 0) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    s[..end].parse().ok()
}
