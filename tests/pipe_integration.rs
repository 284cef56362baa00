//! Integration tests running pipes against an in-memory page.
//!
//! The page mimics a DOM whose `#second` element only appears after a delay,
//! so chained pipes have to wait for each step to settle.

#![cfg(feature = "async")]

use pipewater::prelude::*;
use pipewater::{assert_timed_out, assert_yields};
use serde::{Serialize, Serializer};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fixture page
// ============================================================================

#[derive(Debug, Clone)]
struct Node {
    id: String,
    parent: Option<String>,
    text: String,
}

#[derive(Debug, Clone, Default)]
struct Page {
    nodes: Arc<Mutex<Vec<Node>>>,
}

impl Page {
    fn fixture() -> Self {
        let page = Page::default();
        page.append("body", None, "");
        page.append("first", Some("body"), "");
        page
    }

    fn append(&self, id: &str, parent: Option<&str>, text: &str) {
        self.nodes.lock().unwrap().push(Node {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            text: text.to_string(),
        });
    }

    fn append_later(&self, id: &'static str, parent: &'static str, text: &'static str, after: Duration) {
        let page = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            page.append(id, Some(parent), text);
        });
    }

    fn body(&self) -> Query {
        Query {
            page: self.clone(),
            ids: vec!["body".to_string()],
        }
    }

    fn is_descendant(nodes: &[Node], id: &str, ancestor: &str) -> bool {
        let mut current = nodes.iter().find(|n| n.id == id);
        while let Some(node) = current {
            match &node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = nodes.iter().find(|n| &n.id == parent),
                None => return false,
            }
        }
        false
    }
}

/// A set of matched elements. Serializes as the list of matched ids.
#[derive(Debug, Clone)]
struct Query {
    page: Page,
    ids: Vec<String>,
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ids.serialize(serializer)
    }
}

impl Query {
    fn find(&self, selector: &str) -> Result<Query, String> {
        let id = selector.trim_start_matches('#');
        let nodes = self.page.nodes.lock().unwrap();
        let ids: Vec<String> = nodes
            .iter()
            .filter(|n| n.id == id)
            .filter(|n| self.ids.iter().any(|a| Page::is_descendant(&nodes, &n.id, a)))
            .map(|n| n.id.clone())
            .collect();
        if ids.is_empty() {
            Err(format!(
                "Expected to find element: {}, but never found it.",
                selector
            ))
        } else {
            Ok(Query {
                page: self.page.clone(),
                ids,
            })
        }
    }

    fn text(&self) -> String {
        let nodes = self.page.nodes.lock().unwrap();
        nodes
            .iter()
            .filter(|n| self.ids.contains(&n.id))
            .map(|n| n.text.as_str())
            .collect()
    }
}

fn page_host() -> TokioHost {
    TokioHost::default().with_element_probe(|v| v.downcast_ref::<Query>().map(|q| q.ids.len()))
}

fn get_first(q: &Query) -> Result<Query, String> {
    q.find("#first")
}

fn get_second(q: &Query) -> Result<Query, String> {
    q.find("#second")
}

fn get_text(q: &Query) -> Result<String, String> {
    Ok(q.text())
}

// ============================================================================
// Chained steps
// ============================================================================

#[tokio::test]
async fn each_step_waits_and_chain_resolves() {
    let page = Page::fixture();
    page.append_later("second", "first", "foobar", Duration::from_millis(100));
    let host = page_host();

    let text = Chain::wrap(&host, page.body())
        .pipe(get_first)
        .await
        .unwrap()
        .pipe(get_second)
        .await
        .unwrap()
        .pipe(get_text)
        .should(equal("foobar"))
        .await
        .map(Chain::into_subject);

    assert_yields!(text, "foobar");

    let messages: Vec<_> = host
        .logs()
        .named("pipe")
        .iter()
        .map(|r| r.message().to_string())
        .collect();
    assert_eq!(messages, vec!["get_first", "get_second", "get_text"]);
    assert!(host.logs().records().iter().all(|r| r.end_count == 1));
}

#[tokio::test]
async fn log_element_follows_subject_then_value() {
    let page = Page::fixture();
    let host = page_host();

    let first = Chain::wrap(&host, page.body())
        .pipe(get_first)
        .await
        .unwrap();
    assert_eq!(first.subject().ids, vec!["first"]);

    let record = host.logs().last().unwrap();
    // opened on the body, then moved to the yielded element
    assert_eq!(record.changes, 3);
    assert_eq!(record.element, Some(json!(["first"])));
    assert_eq!(record.snapshots.len(), 1);
    assert_eq!(record.snapshots[0].element, Some(json!(["first"])));

    let props = record.resolve_console_props().unwrap();
    assert_eq!(props["Elements"], 1);
    assert_eq!(props["Yielded"], json!(["first"]));
    assert_eq!(props["Subject"], json!(["body"]));
}

#[tokio::test]
async fn missing_element_names_selector() {
    let page = Page::fixture();
    let host = page_host();

    let result = Chain::wrap(&host, page.body())
        .pipe(|q: &Query| q.find("#wontfind"))
        .with_timeout(Duration::from_millis(50))
        .await
        .map(Chain::into_subject);

    assert_timed_out!(result, "#wontfind");
}

#[tokio::test]
async fn missing_element_names_selector_after_traversals() {
    let page = Page::fixture();
    let host = page_host();

    let result = Chain::wrap(&host, page.body())
        .pipe(|q: &Query| q.find("#first")?.find("#wontfind"))
        .with_timeout(Duration::from_millis(50))
        .await
        .map(Chain::into_subject);

    assert_timed_out!(result, "#wontfind");
    assert_eq!(host.logs().last().unwrap().end_count, 1);
}

// ============================================================================
// Host work
// ============================================================================

#[tokio::test]
async fn pending_lookup_takes_before_and_after_snapshots() {
    let page = Page::fixture();
    page.append_later("second", "first", "foobar", Duration::from_millis(60));
    let host = page_host();

    let find_second = |q: &Query| {
        let q = q.clone();
        Outcome::pending(async move { q.find("#first")?.find("#second") })
    };

    let second = Chain::wrap(&host, page.body())
        .pipe(find_second)
        .await
        .unwrap();
    assert_eq!(second.subject().ids, vec!["second"]);

    let record = host.logs().last().unwrap();
    let names: Vec<_> = record
        .snapshots
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(names, vec![Some("before".to_string()), Some("after".to_string())]);
    assert_eq!(record.snapshots[0].next.as_deref(), Some("after"));
    assert_eq!(record.snapshots[0].element, Some(json!(["body"])));
    assert_eq!(record.snapshots[1].element, Some(json!(["second"])));
    assert_eq!(record.end_count, 1);
}

#[tokio::test]
async fn wrapped_value_pipes_through_pending_work() {
    let host = TokioHost::default();

    let bar = Chain::wrap(&host, json!({ "foo": "bar" }))
        .pipe(|s: &serde_json::Value| {
            let foo = s["foo"].clone();
            Outcome::pending(async move { Ok::<_, String>(foo) })
        })
        .should(equal(json!("bar")))
        .await
        .map(Chain::into_subject);

    assert_yields!(bar, json!("bar"));
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn host_default_timeout_applies_without_option() {
    let config = HostConfig::from_json(r#"{ "default_command_timeout_ms": 60 }"#).unwrap();
    let host = TokioHost::new(config);

    let err = Chain::wrap(&host, 1)
        .pipe(|_: &i32| Err::<i32, _>("never ready"))
        .await
        .unwrap_err();

    assert_eq!(err.timeout, Duration::from_millis(60));
    assert_eq!(err.to_string(), "Timed out retrying after 60ms: never ready");
}

#[tokio::test]
async fn flaky_transform_takes_one_round_per_failure() {
    let host = TokioHost::default();
    let flaky = pipewater::testing::Flaky::new(3, "ok".to_string());

    let value = pipe(&host, (), flaky.clone(), PipeOptions::default(), None).await;

    assert_yields!(value, "ok");
    assert_eq!(flaky.calls(), 4);
    assert_eq!(host.logs().last().unwrap().message(), "flaky");
}
