//! Fluent chaining of pipes.
//!
//! [`Chain`] holds the current subject and the host it runs on. Each
//! [`pipe`](Chain::pipe) builds a [`PipeCommand`]; awaiting the command runs
//! the retry engine and yields a new chain centered on the resolved value, so
//! later pipes only start once earlier ones have settled.
//!
//! ```rust
//! use pipewater::{Chain, TokioHost};
//! use pipewater::assertion::equal;
//! use serde_json::{json, Value};
//! use std::time::Duration;
//!
//! fn get_foo(obj: &Value) -> Result<Value, String> {
//!     obj.get("foo").cloned().ok_or_else(|| "no foo".to_string())
//! }
//!
//! # tokio_test::block_on(async {
//! let host = TokioHost::default();
//!
//! let text = Chain::wrap(&host, json!({ "foo": { "bar": "baz" } }))
//!     .pipe(get_foo)
//!     .await
//!     .unwrap()
//!     .pipe(|foo: &Value| Ok::<_, String>(foo["bar"].clone()))
//!     .with_timeout(Duration::from_millis(200))
//!     .should(equal(json!("baz")))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(text.subject(), &json!("baz"));
//! assert_eq!(host.logs().len(), 2);
//! # });
//! ```

use std::fmt;
use std::future::IntoFuture;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::assertion::Assertion;
use crate::host::Host;
use crate::retry::{pipe, PipeOptions, TimedOut};
use crate::transform::{Subject, Transform};

/// A subject bound to the host its pipes run on.
pub struct Chain<'h, H, S> {
    host: &'h H,
    subject: S,
}

impl<'h, H: Host, S: Subject> Chain<'h, H, S> {
    /// Start a chain at `subject`.
    pub fn wrap(host: &'h H, subject: S) -> Self {
        Chain { host, subject }
    }

    /// The current subject.
    pub fn subject(&self) -> &S {
        &self.subject
    }

    /// End the chain, returning the current subject.
    pub fn into_subject(self) -> S {
        self.subject
    }

    /// The host the chain runs on.
    pub fn host(&self) -> &'h H {
        self.host
    }

    /// Queue `transform` against the current subject.
    ///
    /// Nothing runs until the returned command is awaited.
    pub fn pipe<F>(self, transform: F) -> PipeCommand<'h, H, S, F>
    where
        F: Transform<S>,
        F::Output: Subject,
    {
        PipeCommand {
            host: self.host,
            subject: self.subject,
            transform,
            options: PipeOptions::default(),
            assertion: None,
        }
    }
}

impl<H, S: fmt::Debug> fmt::Debug for Chain<'_, H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("subject", &self.subject)
            .finish()
    }
}

/// A queued pipe, run by awaiting it.
pub struct PipeCommand<'h, H, S, F: Transform<S>> {
    host: &'h H,
    subject: S,
    transform: F,
    options: PipeOptions,
    assertion: Option<Box<dyn Assertion<F::Output>>>,
}

impl<'h, H, S, F> PipeCommand<'h, H, S, F>
where
    H: Host,
    S: Subject,
    F: Transform<S>,
    F::Output: Subject,
{
    /// Give up after `timeout` instead of the host default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// Enable or disable the diagnostic record.
    pub fn with_log(mut self, log: bool) -> Self {
        self.options = self.options.with_log(log);
        self
    }

    /// Replace all options at once.
    pub fn with_options(mut self, options: PipeOptions) -> Self {
        self.options = options;
        self
    }

    /// Keep retrying until the resolved value passes `assertion`.
    pub fn should<A>(mut self, assertion: A) -> Self
    where
        A: Assertion<F::Output> + 'static,
    {
        self.assertion = Some(Box::new(assertion));
        self
    }
}

impl<H, S, F: Transform<S>> fmt::Debug for PipeCommand<'_, H, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeCommand")
            .field("message", &self.transform.message())
            .field("options", &self.options)
            .field("assertion", &self.assertion.is_some())
            .finish()
    }
}

impl<'h, H, S, F> IntoFuture for PipeCommand<'h, H, S, F>
where
    H: Host,
    S: Subject,
    F: Transform<S> + 'h,
    F::Output: Subject,
{
    type Output = Result<Chain<'h, H, F::Output>, TimedOut>;
    type IntoFuture = BoxFuture<'h, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let PipeCommand {
            host,
            subject,
            transform,
            options,
            assertion,
        } = self;
        Box::pin(async move {
            let value = pipe(host, subject, transform, options, assertion.as_deref()).await?;
            Ok(Chain::wrap(host, value))
        })
    }
}
