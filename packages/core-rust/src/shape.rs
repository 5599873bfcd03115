//! Calling conventions an intercepted method can have.
//!
//! Every proxied method is bound to exactly one [`CallShape`] when its dispatch
//! body is written. The shape decides which continuation (`proceed` or
//! `proceed_async`) is legal on its [`DispatchContext`](crate::DispatchContext)
//! and whether the call produces a value.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::{self, BoxFuture};

// ---------------------------------------------------------------------------
// CallShape
// ---------------------------------------------------------------------------

/// The calling convention of an intercepted method.
///
/// | Shape                | Sync/async          | Returns |
/// |----------------------|---------------------|---------|
/// | `Action`             | sync                | nothing |
/// | `Function`           | sync                | value   |
/// | `AsyncAction`        | boxed future        | nothing |
/// | `AsyncFunction`      | boxed future        | value   |
/// | `ValueAsyncAction`   | [`ValueFuture`]     | nothing |
/// | `ValueAsyncFunction` | [`ValueFuture`]     | value   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    Action,
    Function,
    AsyncAction,
    AsyncFunction,
    ValueAsyncAction,
    ValueAsyncFunction,
}

impl CallShape {
    /// All shapes, in declaration order.
    pub const ALL: [CallShape; 6] = [
        CallShape::Action,
        CallShape::Function,
        CallShape::AsyncAction,
        CallShape::AsyncFunction,
        CallShape::ValueAsyncAction,
        CallShape::ValueAsyncFunction,
    ];

    /// Whether the shape is driven by `proceed_async`.
    #[must_use]
    pub const fn is_async(self) -> bool {
        !matches!(self, CallShape::Action | CallShape::Function)
    }

    /// Whether the shape carries a return value back to the caller.
    #[must_use]
    pub const fn returns_value(self) -> bool {
        matches!(
            self,
            CallShape::Function | CallShape::AsyncFunction | CallShape::ValueAsyncFunction
        )
    }

    /// The only continuation that may be used on a context of this shape.
    #[must_use]
    pub const fn continuation(self) -> Continuation {
        if self.is_async() {
            Continuation::Async
        } else {
            Continuation::Sync
        }
    }

    /// Short lowercase name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CallShape::Action => "action",
            CallShape::Function => "function",
            CallShape::AsyncAction => "async_action",
            CallShape::AsyncFunction => "async_function",
            CallShape::ValueAsyncAction => "value_async_action",
            CallShape::ValueAsyncFunction => "value_async_function",
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Continuation
// ---------------------------------------------------------------------------

/// The two ways an interceptor can continue the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuation {
    /// `DispatchContext::proceed`
    Sync,
    /// `DispatchContext::proceed_async`
    Async,
}

impl fmt::Display for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuation::Sync => f.write_str("proceed"),
            Continuation::Async => f.write_str("proceed_async"),
        }
    }
}

// ---------------------------------------------------------------------------
// ValueFuture
// ---------------------------------------------------------------------------

/// Lightweight awaitable used by the `ValueAsync*` shapes.
///
/// Implementations that complete without suspending return
/// [`ValueFuture::ready`], which does not allocate. Anything that really
/// suspends is boxed.
pub enum ValueFuture<'a, T> {
    Ready(future::Ready<T>),
    Pending(BoxFuture<'a, T>),
}

impl<'a, T> ValueFuture<'a, T> {
    /// An already completed value.
    pub fn ready(value: T) -> Self {
        ValueFuture::Ready(future::ready(value))
    }

    /// Box an arbitrary future.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'a,
    {
        ValueFuture::Pending(Box::pin(fut))
    }

    /// Returns `true` if no suspension will happen when awaited.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, ValueFuture::Ready(_))
    }
}

impl<T> Future for ValueFuture<'_, T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        match self.get_mut() {
            ValueFuture::Ready(ready) => Pin::new(ready).poll(cx),
            ValueFuture::Pending(fut) => fut.as_mut().poll(cx),
        }
    }
}

impl<T> fmt::Debug for ValueFuture<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueFuture::Ready(_) => f.write_str("ValueFuture::Ready"),
            ValueFuture::Pending(_) => f.write_str("ValueFuture::Pending"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_shapes_use_sync_continuation() {
        assert_eq!(CallShape::Action.continuation(), Continuation::Sync);
        assert_eq!(CallShape::Function.continuation(), Continuation::Sync);
        for shape in &CallShape::ALL[2..] {
            assert_eq!(shape.continuation(), Continuation::Async, "{shape}");
        }
    }

    #[test]
    fn only_function_shapes_return_values() {
        let returning: Vec<_> = CallShape::ALL
            .iter()
            .copied()
            .filter(|s| s.returns_value())
            .collect();
        assert_eq!(
            returning,
            vec![
                CallShape::Function,
                CallShape::AsyncFunction,
                CallShape::ValueAsyncFunction
            ]
        );
    }

    #[tokio::test]
    async fn ready_value_future_resolves_without_boxing() {
        let fut = ValueFuture::ready(7);
        assert!(fut.is_ready());
        assert_eq!(fut.await, 7);
    }

    #[tokio::test]
    async fn boxed_value_future_resolves() {
        let fut = ValueFuture::from_future(async {
            tokio::task::yield_now().await;
            "later"
        });
        assert!(!fut.is_ready());
        assert_eq!(fut.await, "later");
    }
}
