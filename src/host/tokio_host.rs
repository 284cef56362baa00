//! A host backed by tokio timers and an in-memory log book.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use super::{Host, HostConfig, RetryState};
use crate::diagnostics::{LogAttrs, LogBook, MemoryLog};
use crate::outcome::TransformError;
use crate::retry::{BackoffPolicy, TimedOut};

/// Decides whether a value is an element collection, returning its size.
pub type ElementProbe = Arc<dyn Fn(&dyn Any) -> Option<usize> + Send + Sync>;

/// Reference [`Host`] for running pipes under tokio.
///
/// Waits between rounds with `tokio::time::sleep`, following the
/// [`BackoffPolicy`] derived from its [`HostConfig`], and records every
/// diagnostic record in a shared [`LogBook`].
///
/// # Example
///
/// ```rust
/// use pipewater::{Chain, TokioHost};
/// use pipewater::assertion::equal;
/// use serde_json::{json, Value};
///
/// # tokio_test::block_on(async {
/// let host = TokioHost::default();
///
/// let foo = Chain::wrap(&host, json!({ "foo": "bar" }))
///     .pipe(|s: &Value| Ok::<_, String>(s["foo"].clone()))
///     .should(equal(json!("bar")))
///     .await
///     .unwrap();
///
/// assert_eq!(foo.into_subject(), json!("bar"));
/// assert_eq!(host.logs().named("pipe").len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct TokioHost {
    config: HostConfig,
    backoff: BackoffPolicy,
    logs: LogBook,
    element_probe: Option<ElementProbe>,
}

impl Default for TokioHost {
    fn default() -> Self {
        TokioHost::new(HostConfig::default())
    }
}

impl TokioHost {
    /// Create a host from configuration.
    pub fn new(config: HostConfig) -> Self {
        TokioHost {
            backoff: config.backoff(),
            config,
            logs: LogBook::new(),
            element_probe: None,
        }
    }

    /// Override the backoff policy derived from the configuration.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Recognize element collections with `probe`.
    ///
    /// ```rust
    /// use pipewater::host::{Host, TokioHost};
    ///
    /// struct Elements(Vec<String>);
    ///
    /// let host = TokioHost::default()
    ///     .with_element_probe(|v| v.downcast_ref::<Elements>().map(|e| e.0.len()));
    ///
    /// assert_eq!(host.element_count(&Elements(vec!["#first".into()])), Some(1));
    /// assert_eq!(host.element_count(&"text"), None);
    /// ```
    pub fn with_element_probe<P>(mut self, probe: P) -> Self
    where
        P: Fn(&dyn Any) -> Option<usize> + Send + Sync + 'static,
    {
        self.element_probe = Some(Arc::new(probe));
        self
    }

    /// The records of every logged pipe this host ran.
    pub fn logs(&self) -> &LogBook {
        &self.logs
    }

    /// The host configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The backoff policy used between rounds.
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }
}

impl fmt::Debug for TokioHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioHost")
            .field("config", &self.config)
            .field("backoff", &self.backoff)
            .field("logs", &self.logs.len())
            .field("element_probe", &self.element_probe.is_some())
            .finish()
    }
}

impl Host for TokioHost {
    type Log = MemoryLog;

    fn default_timeout(&self) -> Duration {
        self.config.default_timeout()
    }

    fn open_log(&self, attrs: LogAttrs) -> MemoryLog {
        self.logs.open(attrs)
    }

    fn element_count(&self, value: &dyn Any) -> Option<usize> {
        self.element_probe.as_ref().and_then(|probe| probe(value))
    }

    fn retry_after_delay(
        &self,
        state: &RetryState,
    ) -> impl Future<Output = Result<(), TimedOut>> + Send {
        let next = self
            .backoff
            .next_delay(state.retry_index(), state.elapsed(), state.timeout())
            .ok_or_else(|| state.timed_out());
        async move {
            let delay = next?;
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }

    fn settle<T>(
        &self,
        state: &RetryState,
        work: BoxFuture<'static, Result<T, TransformError>>,
    ) -> impl Future<Output = Result<Result<T, TransformError>, TimedOut>> + Send
    where
        T: Send + 'static,
    {
        let remaining = state.timeout().saturating_sub(state.elapsed());
        let state = state.clone();
        async move {
            tokio::time::timeout(remaining, work)
                .await
                .map_err(|_| state.timed_out())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Failure;
    use futures::FutureExt;
    use std::time::Instant;

    #[tokio::test]
    async fn test_retry_waits_while_budget_remains() {
        let host = TokioHost::new(HostConfig::default().with_retry_interval(Duration::from_millis(5)));
        let mut state = RetryState::new(Instant::now(), Duration::from_secs(1));
        state.begin_attempt();

        let before = Instant::now();
        assert!(host.retry_after_delay(&state).await.is_ok());
        assert!(before.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_retry_fails_when_budget_is_spent() {
        let host = TokioHost::default();
        let mut state = RetryState::new(Instant::now(), Duration::ZERO);
        state.begin_attempt();
        state.record_failure(Failure::Transform(TransformError::new("not yet")));

        let err = host.retry_after_delay(&state).await.unwrap_err();
        assert_eq!(err.to_string(), "Timed out retrying after 0ms: not yet");
    }

    #[tokio::test]
    async fn test_settle_passes_through_work_that_finishes() {
        let host = TokioHost::default();
        let mut state = RetryState::new(Instant::now(), Duration::from_secs(1));
        state.begin_attempt();

        let settled = host.settle(&state, async { Ok::<_, TransformError>(7) }.boxed()).await;
        assert_eq!(settled.unwrap().unwrap(), 7);

        let failed = host
            .settle(&state, async { Err::<i32, _>(TransformError::new("lookup failed")) }.boxed())
            .await;
        assert_eq!(failed.unwrap().unwrap_err().to_string(), "lookup failed");
    }

    #[tokio::test]
    async fn test_settle_gives_up_on_work_that_never_finishes() {
        let host = TokioHost::default();
        let mut state = RetryState::new(Instant::now(), Duration::from_millis(30));
        state.begin_attempt();

        let stuck = futures::future::pending::<Result<i32, TransformError>>().boxed();
        let err = host.settle(&state, stuck).await.unwrap_err();

        assert!(state.started().elapsed() >= Duration::from_millis(30));
        assert!(state.started().elapsed() < Duration::from_secs(1));
        assert_eq!(err.attempts, 1);
        assert_eq!(err.to_string(), "Timed out retrying after 30ms");
    }

    #[test]
    fn test_default_timeout_comes_from_config() {
        let host = TokioHost::new(HostConfig::default().with_default_timeout(Duration::from_millis(250)));
        assert_eq!(host.default_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_without_probe_nothing_is_an_element() {
        let host = TokioHost::default();
        assert_eq!(host.element_count(&vec![1, 2, 3]), None);
    }
}
