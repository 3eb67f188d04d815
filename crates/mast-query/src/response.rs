//! Response abstraction
//!
//! A response owns one parsed document plus the status/header/timing
//! metadata that came with it, and mediates between the document and
//! node-level selection. Exactly one response exists per scenario; the
//! scenario's log is reached through a shared [`AssertionSink`].

use crate::document::{resolve_path, split_path, Document};
use crate::element::ElementSet;
use crate::node::{Node, SelectionContext};
use crate::value::Value;
use mast_core::{LogLine, MastError, ResponseKind, Result};
use serde_json::Value as Json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Status, headers, and timing captured when the resource was fetched
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub load_time_ms: u64,
}

impl ResponseMeta {
    /// Case-insensitive header lookup
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Records-or-discards handle onto one scenario's log
///
/// Cloning shares the underlying log, quiet depth, and frozen flag.
/// While the quiet depth is above zero every record call is discarded;
/// predicates are still evaluated by the caller. The depth is
/// re-entrant so nested `every`/`some` blocks compose. Once frozen the
/// log is permanently immutable.
#[derive(Clone, Default)]
pub struct AssertionSink {
    log: Arc<Mutex<Vec<LogLine>>>,
    quiet_depth: Arc<AtomicUsize>,
    frozen: Arc<AtomicBool>,
}

impl AssertionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, line: LogLine) {
        if self.frozen.load(Ordering::SeqCst) {
            return;
        }
        if self.quiet_depth.load(Ordering::SeqCst) == 0 {
            self.log.lock().expect("log lock poisoned").push(line);
        }
    }

    /// Stop recording for good; the owning scenario calls this when it
    /// reaches its terminal state
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    pub fn pass(&self, message: impl Into<String>) {
        self.record(LogLine::pass(message));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.record(LogLine::fail(message));
    }

    pub fn comment(&self, message: impl Into<String>) {
        self.record(LogLine::comment(message));
    }

    pub fn begin_quiet(&self) {
        self.quiet_depth.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end_quiet(&self) {
        let _ = self
            .quiet_depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| {
                depth.checked_sub(1)
            });
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet_depth.load(Ordering::SeqCst) > 0
    }

    /// Snapshot of the accumulated log
    pub fn lines(&self) -> Vec<LogLine> {
        self.log.lock().expect("log lock poisoned").clone()
    }

    pub fn has_failures(&self) -> bool {
        self.log
            .lock()
            .expect("log lock poisoned")
            .iter()
            .any(|line| line.log_type == mast_core::LogType::Fail)
    }
}

/// One fetched-and-parsed resource under test
pub struct Response {
    kind: ResponseKind,
    document: Document,
    meta: ResponseMeta,
    sink: AssertionSink,
}

impl Response {
    /// Wrap a parsed document, running this kind's construction-time
    /// validation
    ///
    /// Status and content-type checks are recorded as assertion lines on
    /// the sink. A body whose required format is missing entirely is a
    /// usage error and fails construction outright.
    pub fn new(
        kind: ResponseKind,
        document: Document,
        meta: ResponseMeta,
        sink: AssertionSink,
    ) -> Result<Self> {
        let response = Self {
            kind,
            document,
            meta,
            sink,
        };
        response.validate_format()?;
        response.assert_status();
        response.assert_content_type();
        if kind == ResponseKind::Stylesheet {
            response.assert_stylesheet_valid();
        }
        Ok(response)
    }

    fn validate_format(&self) -> Result<()> {
        let required = match self.kind {
            ResponseKind::Json | ResponseKind::Stylesheet => self.document.is_data(),
            ResponseKind::Html | ResponseKind::Browser => self.document.is_dom(),
            _ => true,
        };
        if required {
            Ok(())
        } else {
            Err(MastError::MalformedBody {
                kind: self.kind,
                detail: format!("{:?} cannot back a {} response", self.document, self.kind),
            })
        }
    }

    fn assert_status(&self) {
        let status = self.meta.status;
        self.assert(
            (200..300).contains(&status),
            &format!("HTTP status OK ({})", status),
            &format!("HTTP status not OK ({})", status),
        );
    }

    fn assert_content_type(&self) {
        let content_type = self.meta.header("Content-Type").unwrap_or("");
        if let Some(matched) = self.kind.content_type_matches(content_type) {
            self.assert(
                matched,
                &format!("MIME type matches expected value for {}", self.kind),
                &format!(
                    "MIME type '{}' does not match expected value for {}",
                    content_type, self.kind
                ),
            );
        }
    }

    fn assert_stylesheet_valid(&self) {
        let valid = self
            .document
            .as_data()
            .and_then(|doc| doc.get("stylesheet"))
            .map(|sheet| {
                let no_errors = sheet
                    .get("parsingErrors")
                    .and_then(Json::as_array)
                    .map(Vec::is_empty)
                    .unwrap_or(true);
                sheet.get("rules").map(Json::is_array).unwrap_or(false) && no_errors
            })
            .unwrap_or(false);
        self.assert(valid, "CSS is valid", "CSS is not valid");
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn sink(&self) -> &AssertionSink {
        &self.sink
    }

    /// The shared assertion primitive every node-level assertion routes
    /// through. Returns the statement so callers can branch on it.
    pub fn assert(&self, statement: bool, pass_msg: &str, fail_msg: &str) -> bool {
        if statement {
            self.sink.pass(pass_msg);
        } else {
            self.sink.fail(fail_msg);
        }
        statement
    }

    /// Suppress assertion recording until the matching stop call.
    /// Re-entrant; nested blocks resume only when the outermost ends.
    pub fn start_ignoring_assertions(&self) {
        self.sink.begin_quiet();
    }

    pub fn stop_ignoring_assertions(&self) {
        self.sink.end_quiet();
    }

    /// Select the first match for a path
    ///
    /// Tree-backed documents use their native query mechanism; data
    /// documents resolve the dotted/bracketed accessor path, recording
    /// the resolved path so relative traversal can reconstruct ancestry.
    /// Kinds without a selection mechanism reject the call.
    pub fn select(&self, path: &str) -> Result<Node<'_>> {
        if !self.kind.supports_selection() {
            return Err(MastError::unsupported(self.kind, "select"));
        }
        debug!(kind = %self.kind, path, "select");
        match &self.document {
            Document::Dom(doc) => {
                let set = ElementSet::from_option(doc.query_one(path));
                let value = if set.is_empty() {
                    Value::Null
                } else {
                    Value::Elements(set.clone())
                };
                Ok(Node::new(
                    self,
                    path,
                    value,
                    SelectionContext::for_elements(set),
                ))
            }
            Document::Data(root) => {
                if self.kind == ResponseKind::Stylesheet {
                    return self.select_rule(root, path);
                }
                let resolved = split_path(path).join(".");
                let value = resolve_path(root, path)
                    .cloned()
                    .map(Value::from_json)
                    .unwrap_or(Value::Null);
                Ok(Node::new(
                    self,
                    path,
                    value,
                    SelectionContext::for_path(resolved),
                ))
            }
            Document::Raw(_) => Err(MastError::unsupported(self.kind, "select")),
        }
    }

    /// Select every match for a path
    pub fn select_all(&self, path: &str) -> Result<Vec<Node<'_>>> {
        if !self.kind.supports_selection() {
            return Err(MastError::unsupported(self.kind, "select_all"));
        }
        debug!(kind = %self.kind, path, "select_all");
        match &self.document {
            Document::Dom(doc) => Ok(doc
                .query_all(path)
                .into_iter()
                .enumerate()
                .map(|(i, el)| {
                    let set = ElementSet::single(el);
                    Node::new(
                        self,
                        format!("{} [{}]", path, i),
                        Value::Elements(set.clone()),
                        SelectionContext::for_elements(set),
                    )
                })
                .collect()),
            Document::Data(root) => {
                if self.kind == ResponseKind::Stylesheet {
                    return self.select_all_rules(root, path);
                }
                let resolved = split_path(path).join(".");
                match resolve_path(root, path) {
                    Some(Json::Array(items)) => Ok(items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            Node::new(
                                self,
                                format!("{}[{}]", path, i),
                                Value::from_json(item.clone()),
                                SelectionContext::for_path(format!("{}.{}", resolved, i)),
                            )
                        })
                        .collect()),
                    Some(other) => Ok(vec![Node::new(
                        self,
                        path,
                        Value::from_json(other.clone()),
                        SelectionContext::for_path(resolved),
                    )]),
                    None => Ok(Vec::new()),
                }
            }
            Document::Raw(_) => Err(MastError::unsupported(self.kind, "select_all")),
        }
    }

    /// Stylesheet selection: match parsed rules whose selector list
    /// contains the path verbatim
    fn select_rule<'r>(&'r self, root: &Json, path: &str) -> Result<Node<'r>> {
        let rules = self.stylesheet_rules(root)?;
        let matched = rules.iter().find(|rule| rule_matches(rule, path));
        let value = matched
            .map(|rule| Value::from_json((*rule).clone()))
            .unwrap_or(Value::Null);
        Ok(Node::new(
            self,
            format!("CSS Rule for {}", path),
            value,
            SelectionContext::default(),
        ))
    }

    fn select_all_rules<'r>(&'r self, root: &Json, path: &str) -> Result<Vec<Node<'r>>> {
        let rules = self.stylesheet_rules(root)?;
        Ok(rules
            .iter()
            .filter(|rule| rule_matches(rule, path))
            .map(|rule| {
                Node::new(
                    self,
                    format!("CSS Rule for {}", path),
                    Value::from_json(rule.clone()),
                    SelectionContext::default(),
                )
            })
            .collect())
    }

    fn stylesheet_rules<'a>(&self, root: &'a Json) -> Result<&'a Vec<Json>> {
        root.get("stylesheet")
            .and_then(|sheet| sheet.get("rules"))
            .and_then(Json::as_array)
            .ok_or_else(|| MastError::MalformedBody {
                kind: self.kind,
                detail: "stylesheet rules missing".to_string(),
            })
    }

    /// Run a script against the live document. Only browser-backed
    /// responses support this.
    pub fn evaluate(&self, script: &str) -> Result<Json> {
        if !self.kind.supports_evaluate() {
            return Err(MastError::unsupported(self.kind, "evaluate"));
        }
        match &self.document {
            Document::Dom(doc) => doc.evaluate(script),
            _ => Err(MastError::unsupported(self.kind, "evaluate")),
        }
    }

    /// One header as a node, or the whole header map with no key
    pub fn headers(&self, key: Option<&str>) -> Node<'_> {
        match key {
            Some(key) => {
                let value = self
                    .meta
                    .header(key)
                    .map(|v| Value::Scalar(Json::String(v.to_string())))
                    .unwrap_or(Value::Null);
                Node::new(
                    self,
                    format!("headers[{}]", key),
                    value,
                    SelectionContext::default(),
                )
            }
            None => {
                let map: serde_json::Map<String, Json> = self
                    .meta
                    .headers
                    .iter()
                    .map(|(name, value)| (name.clone(), Json::String(value.clone())))
                    .collect();
                Node::new(
                    self,
                    "headers",
                    Value::Object(map),
                    SelectionContext::default(),
                )
            }
        }
    }

    /// The HTTP status code as a node
    pub fn status(&self) -> Node<'_> {
        Node::new(
            self,
            "HTTP status",
            Value::Scalar(Json::from(self.meta.status)),
            SelectionContext::default(),
        )
    }

    /// Elapsed fetch time in milliseconds as a node
    pub fn load_time(&self) -> Node<'_> {
        Node::new(
            self,
            "load time",
            Value::Scalar(Json::from(self.meta.load_time_ms)),
            SelectionContext::default(),
        )
    }

    /// The document root for synthetic traversal that walks above the
    /// top path segment
    pub(crate) fn root_value(&self) -> Value {
        match &self.document {
            Document::Data(root) => Value::from_json(root.clone()),
            _ => Value::Null,
        }
    }
}

fn rule_matches(rule: &Json, path: &str) -> bool {
    rule.get("type").and_then(Json::as_str) == Some("rule")
        && rule
            .get("selectors")
            .and_then(Json::as_array)
            .map(|selectors| selectors.iter().any(|s| s.as_str() == Some(path)))
            .unwrap_or(false)
}
