//! Integration tests for synthetic-path traversal and assertions over
//! data-backed responses

use mast_core::{LogType, ResponseKind};
use mast_query::{AssertionSink, Document, Response, ResponseMeta};
use regex::Regex;
use serde_json::json;

fn meta() -> ResponseMeta {
    ResponseMeta {
        url: "https://example.com/api/items".to_string(),
        status: 200,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        load_time_ms: 20,
    }
}

fn fixture() -> serde_json::Value {
    json!({
        "items": [
            {"title": "First Post", "tags": ["news", "tech"]},
            {"title": "Second Post", "tags": ["opinion"]},
            {"title": "Third Post", "tags": []}
        ],
        "meta": {
            "count": 3,
            "label": " Hello "
        }
    })
}

fn response(sink: &AssertionSink) -> Response {
    Response::new(
        ResponseKind::Json,
        Document::Data(fixture()),
        meta(),
        sink.clone(),
    )
    .unwrap()
}

/// Lines recorded after the two construction assertions
fn scenario_lines(sink: &AssertionSink) -> Vec<mast_core::LogLine> {
    sink.lines().into_iter().skip(2).collect()
}

#[test]
fn test_nth_matches_array_indexing() {
    let sink = AssertionSink::new();
    let response = response(&sink);
    let items = response.select("items").unwrap();

    assert_eq!(items.get().len(), 3);
    assert_eq!(items.nth(1).get_index(0).render_string(), "null");
    assert!(items.nth(1).get().is_object());
    assert_eq!(items.nth(1).find("title").to_string(), "Second Post");

    // Out of range and negative wrap null
    assert!(items.nth(3).get().is_null());
    assert!(items.nth(-1).get().is_null());
    assert!(items.eq(0).get().is_object());
    assert_eq!(items.first().find("title").to_string(), "First Post");
    assert_eq!(items.last().find("title").to_string(), "Third Post");
}

#[test]
fn test_parent_then_children_reproduces_selection() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    let node = response.select("items[0].tags").unwrap();
    assert!(node.get().is_array());

    let back = node.parent().children(Some("tags"));
    assert!(back.get().is_array());
    assert_eq!(
        back.context().path.as_deref(),
        node.context().path.as_deref()
    );
}

#[test]
fn test_parent_at_depth_one_returns_root() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    let root = response.select("meta").unwrap().parent();
    assert!(root.get().is_object());
    assert_eq!(root.context().path.as_deref(), Some(""));
}

#[test]
fn test_closest_and_parents_scan_path_segments() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    let tags = response.select("items.0.tags").unwrap();

    // closest scans from the last segment inclusive
    let closest = tags.closest("tags");
    assert_eq!(closest.context().path.as_deref(), Some("items.0.tags"));
    let closest_items = tags.closest("items");
    assert_eq!(closest_items.context().path.as_deref(), Some("items"));

    // parents starts at the second-to-last segment, so "tags" misses
    assert!(tags.parents(Some("tags")).get().is_null());
    let items = tags.parents(Some("items"));
    assert_eq!(items.context().path.as_deref(), Some("items"));

    // no matching ancestor wraps null, detectable via exists
    tags.closest("nothing").exists();
    let lines = scenario_lines(&sink);
    assert_eq!(lines.last().unwrap().log_type, LogType::Fail);
}

#[test]
fn test_siblings_reselect_under_parent_path() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    let item = response.select("items.0").unwrap();
    let sibling = item.siblings(Some("1"));
    assert!(sibling.get().is_object());
    assert_eq!(sibling.find("title").to_string(), "Second Post");

    // Scalars have no synthetic ancestry; only objects and arrays do
    assert!(response.select("meta.count").unwrap().parent().get().is_null());
}

#[test]
fn test_every_logs_single_aggregate_line() {
    let sink = AssertionSink::new();
    let response = response(&sink);
    let before = scenario_lines(&sink).len();

    response
        .select("items")
        .unwrap()
        .every(|item| item.find("title").exists().get().is_null() == false);

    let lines = scenario_lines(&sink);
    assert_eq!(lines.len(), before + 1);
    assert_eq!(lines.last().unwrap().log_type, LogType::Pass);
    assert!(lines.last().unwrap().message.starts_with("Every items"));
}

#[test]
fn test_every_fails_when_any_callback_is_false() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response
        .select("items")
        .unwrap()
        .every(|item| item.find("tags").get().len() > 0);

    let lines = scenario_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].log_type, LogType::Fail);
}

#[test]
fn test_some_passes_when_any_callback_is_true() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response
        .select("items")
        .unwrap()
        .some(|item| item.find("tags").get().len() == 2);

    let lines = scenario_lines(&sink);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].log_type, LogType::Pass);
    assert!(lines[0].message.starts_with("Some items"));
}

#[test]
fn test_nested_every_some_resumes_recording() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response.select("items").unwrap().every(|item| {
        // Inner some also suppresses; only the outer aggregate records
        let inner = item.find("tags").any(|tag| tag.to_string().len() > 2);
        !inner.get().is_null()
    });
    // Recording resumes for statements outside both nested calls
    response.select("meta.count").unwrap().equals(3, false);

    let lines = scenario_lines(&sink);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].message.starts_with("Every items"));
    assert!(lines[1].message.contains("equals 3"));
    assert!(lines.iter().all(|l| l.log_type == LogType::Pass));
}

#[test]
fn test_equals_permissive_and_strict() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    let label = response.select("meta.label").unwrap();
    label.equals("hello", true);
    label.similar_to("HELLO");
    label.equals("hello", false);

    let lines = scenario_lines(&sink);
    assert_eq!(lines[0].log_type, LogType::Pass);
    assert_eq!(lines[1].log_type, LogType::Pass);
    assert_eq!(lines[2].log_type, LogType::Fail);
}

#[test]
fn test_assertions_never_stop_the_chain() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response
        .select("meta.count")
        .unwrap()
        .equals(99, false)
        .greater_than(2.0)
        .less_than(2.0)
        .exists();

    let lines = scenario_lines(&sink);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].log_type, LogType::Fail);
    assert_eq!(lines[1].log_type, LogType::Pass);
    assert_eq!(lines[2].log_type, LogType::Fail);
    assert_eq!(lines[3].log_type, LogType::Pass);
}

#[test]
fn test_contains_across_shapes() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response.select("items.0.tags").unwrap().contains("news");
    response.select("meta").unwrap().contains("count");
    response.select("items.0.title").unwrap().contain("First");
    response.select("items.0.title").unwrap().contains("Missing");

    let lines = scenario_lines(&sink);
    assert_eq!(lines[0].log_type, LogType::Pass);
    assert_eq!(lines[1].log_type, LogType::Pass);
    assert_eq!(lines[2].log_type, LogType::Pass);
    assert_eq!(lines[3].log_type, LogType::Fail);
}

#[test]
fn test_string_assertions_and_type_checks() {
    let sink = AssertionSink::new();
    let response = response(&sink);
    let title = response.select("items.1.title").unwrap();

    title.starts_with("Second");
    title.ends_with("Post");
    title.matches(&Regex::new(r"^\w+ Post$").unwrap());
    title.is("string");
    response.select("items").unwrap().is("array");
    response.select("meta.count").unwrap().is("number");
    response.select("missing.path").unwrap().is("null");

    assert!(scenario_lines(&sink)
        .iter()
        .all(|l| l.log_type == LogType::Pass));
}

#[test]
fn test_not_flips_exactly_one_assertion() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response
        .select("missing")
        .unwrap()
        .not()
        .exists()
        .exists();

    let lines = scenario_lines(&sink);
    assert_eq!(lines[0].log_type, LogType::Pass);
    assert_eq!(lines[1].log_type, LogType::Fail);
}

#[test]
fn test_label_overrides_next_message_only() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response
        .select("meta.count")
        .unwrap()
        .label("Item count looks right")
        .equals(3, false)
        .equals(3, false);

    let lines = scenario_lines(&sink);
    assert_eq!(lines[0].message, "Item count looks right");
    assert!(lines[1].message.contains("equals 3"));
}

#[test]
fn test_scalar_transforms() {
    let sink = AssertionSink::new();
    let response = response(&sink);
    let label = response.select("meta.label").unwrap();

    assert_eq!(label.trim().to_string(), "Hello");
    assert_eq!(label.trim().to_upper_case().to_string(), "HELLO");
    assert_eq!(label.trim().to_lower_case().to_string(), "hello");
    assert_eq!(label.replace("Hello", "Goodbye").trim().to_string(), "Goodbye");
    assert_eq!(label.trim().length().to_string(), "5");
    assert_eq!(response.select("meta.count").unwrap().length().to_string(), "0");
    assert_eq!(response.select("items").unwrap().length().to_string(), "3");
}

#[test]
fn test_numeric_parsing() {
    let sink = AssertionSink::new();
    let response = Response::new(
        ResponseKind::Json,
        Document::Data(json!({"width": "120px", "ratio": "1.5x"})),
        meta(),
        sink.clone(),
    )
    .unwrap();

    assert_eq!(response.select("width").unwrap().parse_int().to_string(), "120");
    assert_eq!(response.select("ratio").unwrap().parse_float().to_string(), "1.5");
    assert!(response.select("width").unwrap().parse_int().get().is_string() == false);
}

#[test]
fn test_each_iterates_object_keys_and_words() {
    let sink = AssertionSink::new();
    let response = Response::new(
        ResponseKind::Json,
        Document::Data(json!({"greeting": "hello brave new world", "meta": {"a": 1, "b": 2}})),
        meta(),
        sink.clone(),
    )
    .unwrap();

    let mut words = Vec::new();
    response.select("greeting").unwrap().each(|word| {
        words.push(word.to_string());
    });
    assert_eq!(words, vec!["hello", "brave", "new", "world"]);

    let mut names = Vec::new();
    response.select("meta").unwrap().each(|entry| {
        names.push(entry.name().to_string());
    });
    assert_eq!(names, vec!["meta[a]", "meta[b]"]);
}

#[test]
fn test_comment_echo_and_type_of() {
    let sink = AssertionSink::new();
    let response = response(&sink);

    response
        .select("meta.count")
        .unwrap()
        .comment("checking the count")
        .echo()
        .type_of();

    let lines = scenario_lines(&sink);
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.log_type == LogType::Comment));
    assert_eq!(lines[0].message, "checking the count");
    assert!(lines[1].message.contains("= 3"));
    assert!(lines[2].message.contains("number"));
}
