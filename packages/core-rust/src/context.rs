//! Per-call dispatch state machine.
//!
//! A [`DispatchContext`] is created for every intercepted call and dropped when
//! the call returns. It walks the chain one position per continuation:
//!
//! ```text
//! NotStarted -> Running(0) -> .. -> Running(N-1) -> Terminal -> Completed
//! ```
//!
//! Reaching `Terminal` takes the captured implementation closure out of the
//! context and runs it, so the implementation executes at most once no matter
//! how often interceptors continue.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::BoxFuture;
use tracing::trace;

use crate::chain::InterceptorChain;
use crate::error::DispatchError;
use crate::method::{MethodDescriptor, MethodPair};
use crate::shape::{CallShape, Continuation, ValueFuture};
use crate::value::{unbox, BoxedValue, DynValue, Parameters};

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Terminal closures
// ---------------------------------------------------------------------------

/// The captured call into the real implementation, one variant per shape.
pub(crate) enum Terminal<'c> {
    Sync(SyncTerminal<'c>),
    Async(AsyncTerminal<'c>),
}

pub(crate) enum SyncTerminal<'c> {
    Action(Box<dyn FnOnce() + Send + 'c>),
    Function(Box<dyn FnOnce() -> BoxedValue + Send + 'c>),
}

pub(crate) enum AsyncTerminal<'c> {
    Action(Box<dyn FnOnce() -> BoxFuture<'c, ()> + Send + 'c>),
    Function(Box<dyn FnOnce() -> BoxFuture<'c, BoxedValue> + Send + 'c>),
    ValueAction(Box<dyn FnOnce() -> ValueFuture<'c, ()> + Send + 'c>),
    ValueFunction(Box<dyn FnOnce() -> ValueFuture<'c, BoxedValue> + Send + 'c>),
}

impl Terminal<'_> {
    fn shape(&self) -> CallShape {
        match self {
            Terminal::Sync(SyncTerminal::Action(_)) => CallShape::Action,
            Terminal::Sync(SyncTerminal::Function(_)) => CallShape::Function,
            Terminal::Async(AsyncTerminal::Action(_)) => CallShape::AsyncAction,
            Terminal::Async(AsyncTerminal::Function(_)) => CallShape::AsyncFunction,
            Terminal::Async(AsyncTerminal::ValueAction(_)) => CallShape::ValueAsyncAction,
            Terminal::Async(AsyncTerminal::ValueFunction(_)) => CallShape::ValueAsyncFunction,
        }
    }
}

// ---------------------------------------------------------------------------
// ContextState
// ---------------------------------------------------------------------------

/// Where a context is in its single pass over the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// No continuation has been called yet.
    NotStarted,
    /// The interceptor at this index has been invoked.
    Running(usize),
    /// The implementation is running.
    Terminal,
    /// The implementation has returned.
    Completed,
}

enum Step {
    Interceptor(usize),
    Terminal,
    Exhausted,
}

// ---------------------------------------------------------------------------
// DispatchContext
// ---------------------------------------------------------------------------

/// State of one intercepted call, handed to every interceptor in turn.
///
/// Interceptors may read or replace the parameter snapshot, decide whether to
/// continue, and read or overwrite the return slot after their continuation
/// returns. The context is never shared between calls and needs no locking.
pub struct DispatchContext<'c, T: Send + Sync + 'static> {
    call_id: u64,
    shape: CallShape,
    state: ContextState,
    chain: &'c InterceptorChain<T>,
    implementation: &'c T,
    methods: MethodPair,
    parameters: Parameters,
    return_value: Option<BoxedValue>,
    terminal: Option<Terminal<'c>>,
}

impl<'c, T: Send + Sync + 'static> DispatchContext<'c, T> {
    pub(crate) fn new(
        chain: &'c InterceptorChain<T>,
        implementation: &'c T,
        methods: MethodPair,
        parameters: Parameters,
        terminal: Terminal<'c>,
    ) -> Self {
        Self {
            call_id: NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed),
            shape: terminal.shape(),
            state: ContextState::NotStarted,
            chain,
            implementation,
            methods,
            parameters,
            return_value: None,
            terminal: Some(terminal),
        }
    }

    /// Process-unique id of this call, for log correlation.
    #[must_use]
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    #[must_use]
    pub fn shape(&self) -> CallShape {
        self.shape
    }

    #[must_use]
    pub fn state(&self) -> ContextState {
        self.state
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.shape.is_async()
    }

    #[must_use]
    pub fn returns_value(&self) -> bool {
        self.shape.returns_value()
    }

    #[must_use]
    pub fn methods(&self) -> &MethodPair {
        &self.methods
    }

    #[must_use]
    pub fn interface_method(&self) -> &MethodDescriptor {
        &self.methods.interface
    }

    #[must_use]
    pub fn implementation_method(&self) -> &MethodDescriptor {
        &self.methods.implementation
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    /// The implementation the proxy owns.
    #[must_use]
    pub fn implementation(&self) -> &'c T {
        self.implementation
    }

    /// Current content of the return slot. `None` until the implementation
    /// returns or an interceptor sets a value, and always `None` for shapes
    /// that return nothing unless an interceptor put something there.
    #[must_use]
    pub fn return_value(&self) -> Option<&(dyn DynValue + 'static)> {
        self.return_value.as_deref()
    }

    /// Return slot downcast to `R`.
    #[must_use]
    pub fn return_value_as<R: DynValue>(&self) -> Option<&R> {
        self.return_value().and_then(|value| value.downcast_ref::<R>())
    }

    /// Overwrite the return slot.
    ///
    /// The caller only sees the value if it has the method's return type;
    /// anything else is discarded in favor of the type's default.
    pub fn set_return_value<V: DynValue>(&mut self, value: V) {
        self.return_value = Some(Box::new(value));
    }

    /// Empty the return slot, handing back what was there.
    pub fn take_return_value(&mut self) -> Option<BoxedValue> {
        self.return_value.take()
    }

    /// Consume the context, yielding the slot as `R` or `fallback()` when it
    /// is empty or holds another type.
    pub(crate) fn into_return_value_or_else<R, D>(self, fallback: D) -> R
    where
        R: DynValue,
        D: FnOnce() -> R,
    {
        self.return_value.and_then(unbox::<R>).unwrap_or_else(fallback)
    }

    /// Continue a synchronous call.
    ///
    /// # Panics
    ///
    /// Panics if the context wraps an asynchronous method. See
    /// [`try_proceed`](Self::try_proceed) for the non-panicking form.
    pub fn proceed(&mut self) {
        if let Err(err) = self.try_proceed() {
            panic!("{err}");
        }
    }

    /// Continue a synchronous call, or report a shape mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedContinuation`] without advancing
    /// when the context wraps an asynchronous method.
    pub fn try_proceed(&mut self) -> Result<(), DispatchError> {
        self.check(Continuation::Sync)?;
        match self.advance() {
            Step::Interceptor(index) => {
                let chain = self.chain;
                chain[index].intercept(self);
            }
            Step::Terminal => {
                if let Some(Terminal::Sync(terminal)) = self.terminal.take() {
                    self.trace_terminal();
                    match terminal {
                        SyncTerminal::Action(call) => call(),
                        SyncTerminal::Function(call) => self.return_value = Some(call()),
                    }
                }
                self.state = ContextState::Completed;
            }
            Step::Exhausted => {}
        }
        Ok(())
    }

    /// Continue an asynchronous call.
    ///
    /// # Panics
    ///
    /// Panics if the context wraps a synchronous method. See
    /// [`try_proceed_async`](Self::try_proceed_async) for the non-panicking form.
    pub async fn proceed_async(&mut self) {
        if let Err(err) = self.try_proceed_async().await {
            panic!("{err}");
        }
    }

    /// Continue an asynchronous call, or report a shape mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedContinuation`] without advancing
    /// when the context wraps a synchronous method.
    pub fn try_proceed_async(&mut self) -> BoxFuture<'_, Result<(), DispatchError>> {
        Box::pin(async move {
            self.check(Continuation::Async)?;
            match self.advance() {
                Step::Interceptor(index) => {
                    let chain = self.chain;
                    chain[index].intercept_async(self).await;
                }
                Step::Terminal => {
                    if let Some(Terminal::Async(terminal)) = self.terminal.take() {
                        self.trace_terminal();
                        match terminal {
                            AsyncTerminal::Action(call) => call().await,
                            AsyncTerminal::Function(call) => {
                                self.return_value = Some(call().await);
                            }
                            AsyncTerminal::ValueAction(call) => call().await,
                            AsyncTerminal::ValueFunction(call) => {
                                self.return_value = Some(call().await);
                            }
                        }
                    }
                    self.state = ContextState::Completed;
                }
                Step::Exhausted => {}
            }
            Ok(())
        })
    }

    fn check(&self, attempted: Continuation) -> Result<(), DispatchError> {
        if self.shape.continuation() == attempted {
            Ok(())
        } else {
            Err(DispatchError::UnsupportedContinuation {
                shape: self.shape,
                attempted,
            })
        }
    }

    /// Move one position forward. Past the implementation this is a no-op.
    fn advance(&mut self) -> Step {
        let next = match self.state {
            ContextState::NotStarted => 0,
            ContextState::Running(index) => index + 1,
            ContextState::Terminal | ContextState::Completed => return Step::Exhausted,
        };
        if next < self.chain.len() {
            self.state = ContextState::Running(next);
            Step::Interceptor(next)
        } else {
            self.state = ContextState::Terminal;
            Step::Terminal
        }
    }

    /// Note a chain that returned without ever reaching the implementation.
    pub(crate) fn trace_short_circuit(&self) {
        if self.state != ContextState::Completed {
            trace!(
                call_id = self.call_id,
                method = %self.methods.interface,
                state = ?self.state,
                "chain short-circuited"
            );
        }
    }

    fn trace_terminal(&self) {
        trace!(
            call_id = self.call_id,
            method = %self.methods.implementation,
            shape = %self.shape,
            "invoking implementation"
        );
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for DispatchContext<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("call_id", &self.call_id)
            .field("shape", &self.shape)
            .field("state", &self.state)
            .field("method", &self.methods.interface)
            .field("parameters", &self.parameters)
            .field("return_value", &self.return_value)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
