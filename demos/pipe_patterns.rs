//! Pipe Patterns Example
//!
//! Demonstrates retry-until-settled transforms against a changing subject.
//! Shows practical patterns including:
//! - Retrying until an assertion passes
//! - Retrying while a transform keeps failing
//! - Named, curried transforms in the command log
//! - Host work that settles later
//! - Timeout errors

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipewater::prelude::*;
use serde_json::{json, Value};

// ==================== Assertions ====================

/// Example 1: Wait for a value to change
///
/// The subject is read through shared state that another task updates.
async fn example_wait_for_value() {
    println!("\n=== Example 1: Retry Until Assertion Passes ===");

    let host = TokioHost::default();
    let status = Arc::new(Mutex::new("loading".to_string()));

    {
        let status = status.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            *status.lock().unwrap() = "ready".to_string();
        });
    }

    let read_status = {
        let status = status.clone();
        move |_: &()| Ok::<_, String>(status.lock().unwrap().clone())
    };

    match Chain::wrap(&host, ())
        .pipe(read_status)
        .should(equal("ready"))
        .await
    {
        Ok(chain) => println!("  Status settled: {}", chain.subject()),
        Err(e) => println!("  Failed: {}", e),
    }
}

// ==================== Failing Transforms ====================

/// Example 2: A transform that throws until the data arrives
async fn example_retry_errors() {
    println!("\n=== Example 2: Retry While Transform Fails ===");

    let host = TokioHost::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let get_bar = {
        let attempts = attempts.clone();
        move |obj: &Value| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            println!("  Attempt {}", n + 1);
            if n < 2 {
                Err("cannot read property 'bar' of undefined".to_string())
            } else {
                Ok(obj["foo"].clone())
            }
        }
    };

    let result = pipe(&host, json!({ "foo": "bar" }), get_bar, PipeOptions::default(), None).await;
    println!("  Result: {:?}", result.map_err(|e| e.to_string()));
}

// ==================== Command Log ====================

/// Example 3: Curried transforms keep their name and arguments
async fn example_command_log() {
    println!("\n=== Example 3: Named Transforms ===");

    let host = TokioHost::default();
    let get_prop = loggable_named("getProp", |prop: &'static str| {
        move |obj: &Value| obj.get(prop).cloned().ok_or(format!("no property {}", prop))
    });

    let user = Chain::wrap(&host, json!({ "user": { "name": "Ada" } }))
        .pipe(get_prop.curry("user"))
        .await;
    if let Ok(user) = user {
        let _ = user.pipe(get_prop.curry("name")).await;
    }

    for record in host.logs().records() {
        println!("  [{}] {}", record.name(), record.message());
        if let Some(props) = record.resolve_console_props() {
            println!("    Yielded: {}", props["Yielded"]);
        }
    }
}

// ==================== Host Work ====================

/// Example 4: Transforms that hand work to the host
async fn example_pending() {
    println!("\n=== Example 4: Pending Host Work ===");

    let host = TokioHost::default();
    let fetch_user = |id: &u32| {
        let id = *id;
        Outcome::pending(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(json!({ "id": id, "name": "Ada" }))
        })
    };

    let user = pipe(&host, 7u32, fetch_user, PipeOptions::default(), None).await;
    println!("  User: {:?}", user.map_err(|e| e.to_string()));

    if let Some(record) = host.logs().last() {
        let names: Vec<_> = record
            .snapshots
            .iter()
            .filter_map(|s| s.name.clone())
            .collect();
        println!("  Snapshots: {:?}", names);
    }
}

// ==================== Timeouts ====================

/// Example 5: A value that never settles
async fn example_timeout() {
    println!("\n=== Example 5: Timeout ===");

    let host = TokioHost::default();
    let result = Chain::wrap(&host, json!({ "foo": "bar" }))
        .pipe(|obj: &Value| Ok::<_, String>(obj["foo"].clone()))
        .with_timeout(Duration::from_millis(100))
        .should(equal(json!("baz")))
        .await;

    match result {
        Ok(_) => println!("  Unexpected success"),
        Err(e) => println!("  {} ({} attempts)", e, e.attempts),
    }
}

#[tokio::main]
async fn main() {
    println!("Pipe Patterns Examples");
    println!("======================");

    example_wait_for_value().await;
    example_retry_errors().await;
    example_command_log().await;
    example_pending().await;
    example_timeout().await;

    println!("\n=== All examples completed! ===");
}
