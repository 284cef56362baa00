//! The retry loop behind every pipe invocation.

use std::any::{type_name, Any};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};

use super::{Failure, PipeOptions, TimedOut};
use crate::args::to_json;
use crate::assertion::Assertion;
use crate::diagnostics::session::DiagnosticSession;
use crate::diagnostics::{ConsoleProps, LogAttrs};
use crate::host::{Host, RetryState};
use crate::outcome::{Outcome, TransformError};
use crate::transform::{Subject, Transform};

const COMMAND: &str = "pipe";

/// Everything about the invocation that does not change between rounds.
struct CommandMeta {
    message: String,
    function: String,
    source: &'static str,
    args: Option<Value>,
    started: Instant,
}

/// Apply `transform` to `subject` until its result passes `assertion`.
///
/// Each round evaluates the transform once. A failed evaluation or a value
/// the assertion rejects is not an error yet: the host waits and the round
/// repeats. The invocation ends when a value passes, or fails with
/// [`TimedOut`] once the host reports the budget spent. The subject itself
/// is never modified.
///
/// Transforms that return [`Outcome::Pending`] hand work to the host; the
/// settled value is treated exactly like a synchronous one. The host bounds
/// that work by the remaining budget, so work that never settles still ends
/// the invocation with [`TimedOut`].
///
/// When `options.log()` is set, one diagnostic record is opened through the
/// host and ended exactly once, whichever way the invocation finishes.
///
/// # Example
///
/// ```rust
/// use pipewater::{pipe, PipeOptions, TokioHost};
/// use pipewater::assertion::equal;
/// use serde_json::{json, Value};
///
/// fn get_foo(obj: &Value) -> Result<Value, String> {
///     obj.get("foo").cloned().ok_or_else(|| "no foo".to_string())
/// }
///
/// # tokio_test::block_on(async {
/// let host = TokioHost::default();
/// let should = equal(json!("bar"));
///
/// let value = pipe(
///     &host,
///     json!({ "foo": "bar" }),
///     get_foo,
///     PipeOptions::default(),
///     Some(&should),
/// )
/// .await
/// .unwrap();
///
/// assert_eq!(value, json!("bar"));
/// assert_eq!(host.logs().last().unwrap().message(), "get_foo");
/// # });
/// ```
pub async fn pipe<H, S, F>(
    host: &H,
    subject: S,
    transform: F,
    options: PipeOptions,
    assertion: Option<&dyn Assertion<F::Output>>,
) -> Result<F::Output, TimedOut>
where
    H: Host,
    S: Subject,
    F: Transform<S>,
    F::Output: Subject,
{
    let timeout = options.timeout().unwrap_or_else(|| host.default_timeout());
    let meta = Arc::new(CommandMeta {
        message: transform.message(),
        function: transform
            .display_name()
            .unwrap_or("function")
            .to_owned(),
        source: type_name::<F>(),
        args: transform.args().map(|args| args.to_json()),
        started: Instant::now(),
    });
    let subject = Arc::new(subject);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        message = %meta.message,
        timeout_ms = timeout.as_millis() as u64,
        "pipe started"
    );

    let mut session = DiagnosticSession::new(options.log().then(|| {
        host.open_log(LogAttrs {
            name: COMMAND.to_owned(),
            message: meta.message.clone(),
        })
    }));
    if session.is_logging() && host.element_count(subject.as_ref() as &dyn Any).is_some() {
        session.set_element(to_json(subject.as_ref()));
    }

    let mut state = RetryState::new(meta.started, timeout);
    let result = loop {
        state.begin_attempt();

        let round = resolve(host, &state, &transform, &subject, &meta, &mut session).await;
        let failure = match round {
            Round::Yielded(value) => match host.verify_assertions(&value, assertion).await {
                Ok(()) => break Ok(value),
                Err(rejected) => Failure::from(rejected),
            },
            Round::Failed(error) => Failure::from(error),
            Round::Expired(timed_out) => break Err(timed_out),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = state.attempts(),
            error = %failure,
            "pipe round did not settle, retrying"
        );

        state.record_failure(failure);
        if let Err(timed_out) = host.retry_after_delay(&state).await {
            break Err(timed_out);
        }
    };

    #[cfg(feature = "tracing")]
    match &result {
        Ok(_) => tracing::debug!(attempts = state.attempts(), "pipe settled"),
        Err(e) => tracing::warn!(attempts = e.attempts, error = %e, "pipe timed out"),
    }

    session.finish();
    result
}

/// What one evaluation round produced.
enum Round<T> {
    Yielded(T),
    Failed(TransformError),
    /// Pending work was still running when the budget ran out.
    Expired(TimedOut),
}

/// Evaluate the transform once and record what it yielded.
async fn resolve<H, S, F>(
    host: &H,
    state: &RetryState,
    transform: &F,
    subject: &Arc<S>,
    meta: &Arc<CommandMeta>,
    session: &mut DiagnosticSession<H::Log>,
) -> Round<F::Output>
where
    H: Host,
    S: Subject,
    F: Transform<S>,
    F::Output: Subject,
{
    let (value, settled_from_pending) = match transform.apply(subject.as_ref()) {
        Outcome::Value(value) => (value, false),
        Outcome::Failed(error) => return Round::Failed(error),
        Outcome::Pending(work) => {
            session.before_pending();
            match host.settle(state, work).await {
                Ok(Ok(value)) => (value, true),
                Ok(Err(error)) => return Round::Failed(error),
                Err(timed_out) => return Round::Expired(timed_out),
            }
        }
    };

    if session.is_logging() {
        let elements = host.element_count(&value as &dyn Any);
        let element = elements.map(|_| to_json(&value));
        let props = console_props(meta, subject, &value, elements);
        session.record_yield(props, element, settled_from_pending);
    }
    Round::Yielded(value)
}

fn console_props<S, T>(
    meta: &Arc<CommandMeta>,
    subject: &Arc<S>,
    yielded: &T,
    elements: Option<usize>,
) -> ConsoleProps
where
    S: Subject,
    T: Subject,
{
    let duration_ms = meta.started.elapsed().as_secs_f64() * 1000.0;
    let meta = Arc::clone(meta);
    let subject = Arc::clone(subject);
    let yielded = yielded.clone();

    ConsoleProps::lazy(move || {
        let mut props = Map::new();
        props.insert("Command".into(), Value::from(COMMAND));
        props.insert("Subject".into(), to_json(subject.as_ref()));
        props.insert("Message".into(), Value::from(meta.message.as_str()));
        props.insert("Function".into(), Value::from(meta.function.as_str()));
        if let Some(args) = &meta.args {
            props.insert("Arguments".into(), args.clone());
        }
        props.insert("Source".into(), Value::from(meta.source));
        props.insert("Yielded".into(), to_json(&yielded));
        if let Some(count) = elements {
            props.insert("Elements".into(), Value::from(count));
        }
        props.insert("Duration".into(), Value::from(duration_ms));
        props
    })
}
