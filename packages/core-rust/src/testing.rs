//! Shared fixtures for the engine's unit tests.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::DispatchContext;
use crate::interceptor::Interceptor;
use crate::method::{MethodDescriptor, MethodPair};

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

pub(crate) const METHODS: MethodPair = MethodPair::new(
    MethodDescriptor::new("TestService", "call"),
    MethodDescriptor::new("TestServiceImpl", "call"),
);

/// What a [`Recorder`] does around its continuation.
#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    PassThrough,
    /// Never continue.
    ShortCircuit,
    /// Never continue, but put a value in the return slot.
    ShortCircuitWith(String),
    /// Continue, then replace the return slot.
    Override(String),
    /// Continue twice in a row.
    ProceedTwice,
    /// Replace parameter 0 with `"rewritten"` before continuing.
    RewriteFirstParameter,
    /// Log the parameter snapshot before continuing.
    LogParameters,
}

/// Interceptor that appends `name:before` / `name:after` entries to a log and
/// records the return value it observes after continuing.
pub(crate) struct Recorder {
    name: &'static str,
    log: Log,
    behavior: Behavior,
}

impl Recorder {
    pub(crate) fn new(name: &'static str, log: &Log, behavior: Behavior) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            behavior,
        }
    }

    fn before<T: Send + Sync + 'static>(&self, ctx: &mut DispatchContext<'_, T>) -> bool {
        self.log.lock().push(format!("{}:before", self.name));
        match &self.behavior {
            Behavior::ShortCircuit => false,
            Behavior::ShortCircuitWith(value) => {
                ctx.set_return_value(value.clone());
                false
            }
            Behavior::RewriteFirstParameter => {
                ctx.parameters_mut().set(0, "rewritten");
                true
            }
            Behavior::LogParameters => {
                let entry = format!("{}:params:{}", self.name, ctx.parameters());
                self.log.lock().push(entry);
                true
            }
            _ => true,
        }
    }

    fn after<T: Send + Sync + 'static>(&self, ctx: &mut DispatchContext<'_, T>) {
        if let Behavior::Override(value) = &self.behavior {
            ctx.set_return_value(value.clone());
        }
        let seen = ctx
            .return_value_as::<String>()
            .map(|v| format!(":{v}"))
            .unwrap_or_default();
        self.log.lock().push(format!("{}:after{seen}", self.name));
    }

    fn proceed_count(&self) -> usize {
        match self.behavior {
            Behavior::ProceedTwice => 2,
            _ => 1,
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Interceptor<T> for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn intercept(&self, ctx: &mut DispatchContext<'_, T>) {
        if !self.before(ctx) {
            return;
        }
        for _ in 0..self.proceed_count() {
            ctx.proceed();
        }
        self.after(ctx);
    }

    async fn intercept_async(&self, ctx: &mut DispatchContext<'_, T>) {
        if !self.before(ctx) {
            return;
        }
        for _ in 0..self.proceed_count() {
            ctx.proceed_async().await;
        }
        self.after(ctx);
    }
}

/// Collects every event at `trace` and above as plain text.
#[derive(Clone, Default)]
pub(crate) struct TraceCapture(Arc<Mutex<Vec<u8>>>);

impl TraceCapture {
    pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .finish()
    }

    pub(crate) fn contains(&self, needle: &str) -> bool {
        String::from_utf8_lossy(&self.0.lock()).contains(needle)
    }
}

impl io::Write for TraceCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
