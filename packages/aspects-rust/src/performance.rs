//! Call timing interceptor.
//!
//! Records how long the rest of the chain (including the implementation)
//! took, both as a `tracing` span field and as `metrics` samples. The
//! measurement is taken by a drop guard so calls that unwind are still
//! reported.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use interpose_core::{CallShape, DispatchContext, Interceptor, MethodDescriptor};
use tracing::{info, info_span, warn, Instrument, Span};

use crate::config::AspectConfig;

/// Histogram of call durations in seconds, labeled by `method`.
pub const CALL_DURATION_METRIC: &str = "interpose_call_duration_seconds";
/// Counter of intercepted calls, labeled by `method` and `shape`.
pub const CALLS_TOTAL_METRIC: &str = "interpose_calls_total";

/// Measures every intercepted call.
#[derive(Debug, Clone, Default)]
pub struct PerformanceInterceptor {
    config: AspectConfig,
}

impl PerformanceInterceptor {
    #[must_use]
    pub fn new(config: AspectConfig) -> Self {
        Self { config }
    }

    fn span<T: Send + Sync + 'static>(ctx: &DispatchContext<'_, T>) -> Span {
        info_span!(
            "intercepted_call",
            call_id = ctx.call_id(),
            method = %ctx.interface_method(),
            shape = %ctx.shape(),
            duration_ms = tracing::field::Empty,
        )
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Interceptor<T> for PerformanceInterceptor {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn intercept(&self, ctx: &mut DispatchContext<'_, T>) {
        let span = Self::span(ctx);
        let _timer = CallTimer::start(ctx, span.clone(), self.config.slow_call_threshold_ms);
        let _entered = span.enter();
        ctx.proceed();
    }

    async fn intercept_async(&self, ctx: &mut DispatchContext<'_, T>) {
        let span = Self::span(ctx);
        let _timer = CallTimer::start(ctx, span.clone(), self.config.slow_call_threshold_ms);
        ctx.proceed_async().instrument(span).await;
    }
}

// ---------------------------------------------------------------------------
// CallTimer
// ---------------------------------------------------------------------------

/// Reports elapsed time when dropped, whether the call returned or unwound.
struct CallTimer {
    start: Instant,
    span: Span,
    call_id: u64,
    method: MethodDescriptor,
    shape: CallShape,
    slow_threshold_ms: u64,
}

impl CallTimer {
    fn start<T: Send + Sync + 'static>(
        ctx: &DispatchContext<'_, T>,
        span: Span,
        slow_threshold_ms: u64,
    ) -> Self {
        Self {
            start: Instant::now(),
            span,
            call_id: ctx.call_id(),
            method: *ctx.interface_method(),
            shape: ctx.shape(),
            slow_threshold_ms,
        }
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = elapsed.as_millis() as u64;
        let method = self.method.to_string();

        self.span.record("duration_ms", duration_ms);
        metrics::histogram!(CALL_DURATION_METRIC, "method" => method.clone())
            .record(elapsed.as_secs_f64());
        metrics::counter!(
            CALLS_TOTAL_METRIC,
            "method" => method.clone(),
            "shape" => self.shape.as_str()
        )
        .increment(1);

        if elapsed >= Duration::from_millis(self.slow_threshold_ms) {
            warn!(
                call_id = self.call_id,
                method = %method,
                duration_ms,
                threshold_ms = self.slow_threshold_ms,
                "slow call"
            );
        } else {
            info!(
                call_id = self.call_id,
                method = %method,
                duration_ms,
                "call timed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use futures_util::FutureExt;
    use interpose_core::{parameters, InterceptorChain, MethodPair, ProxyBase};
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;
    use crate::telemetry::capture::CapturedLogs;

    const WORK: MethodPair = MethodPair::new(
        MethodDescriptor::new("Worker", "work"),
        MethodDescriptor::new("WorkerImpl", "work"),
    );

    struct Worker;

    fn proxy(slow_call_threshold_ms: u64) -> ProxyBase<Worker> {
        let config = AspectConfig {
            slow_call_threshold_ms,
            ..AspectConfig::default()
        };
        ProxyBase::new(
            Worker,
            InterceptorChain::builder()
                .with(PerformanceInterceptor::new(config))
                .build(),
        )
    }

    #[test]
    fn fast_call_is_timed_at_info() {
        let logs = CapturedLogs::default();
        let proxy = proxy(60_000);
        let result = tracing::subscriber::with_default(logs.subscriber(), || {
            proxy.run_function(WORK, parameters![], u32::default, |_| 5_u32)
        });
        assert_eq!(result, 5);
        let lines = logs.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("call timed"));
        assert!(lines[0].contains("method=Worker::work"));
        assert!(lines[0].contains("duration_ms="));
    }

    #[tokio::test]
    async fn slow_async_call_warns() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        let proxy = proxy(0);
        proxy
            .run_async_function(WORK, parameters![], String::new, |_| {
                async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    "done".to_string()
                }
                .boxed()
            })
            .await;
        let lines = logs.lines();
        assert!(lines.iter().any(|l| l.contains("WARN") && l.contains("slow call")), "{lines:?}");
    }

    #[test]
    fn panicking_call_is_still_reported() {
        let logs = CapturedLogs::default();
        let proxy = proxy(60_000);
        let outcome = tracing::subscriber::with_default(logs.subscriber(), || {
            catch_unwind(AssertUnwindSafe(|| {
                proxy.run_action(WORK, parameters![], |_| panic!("implementation failed"));
            }))
        });
        assert!(outcome.is_err());
        assert!(logs.position("call timed").is_some(), "{:?}", logs.lines());
    }

    #[test]
    fn records_duration_histogram_and_call_counter() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let proxy = proxy(60_000);
        metrics::with_local_recorder(&recorder, || {
            proxy.run_function(WORK, parameters![], u32::default, |_| 5_u32)
        });

        let entries = snapshotter.snapshot().into_vec();
        let label = |key: &metrics::Key, name: &str| {
            key.labels()
                .find(|l| l.key() == name)
                .map(|l| l.value().to_string())
        };

        let (key, _, _, value) = entries
            .iter()
            .find(|(key, ..)| key.key().name() == CALL_DURATION_METRIC)
            .expect("duration histogram");
        assert_eq!(label(key.key(), "method").as_deref(), Some("Worker::work"));
        assert!(matches!(value, DebugValue::Histogram(samples) if samples.len() == 1));

        let (key, _, _, value) = entries
            .iter()
            .find(|(key, ..)| key.key().name() == CALLS_TOTAL_METRIC)
            .expect("call counter");
        assert_eq!(label(key.key(), "method").as_deref(), Some("Worker::work"));
        assert_eq!(label(key.key(), "shape").as_deref(), Some("function"));
        assert!(matches!(value, DebugValue::Counter(1)));
    }
}
