//! Entry points that proxy dispatch bodies call, one per [`CallShape`].
//!
//! A proxy type implements the service trait by holding a [`ProxyBase`] and
//! forwarding every method to the entry point matching its shape:
//!
//! ```
//! use interpose_core::{parameters, InterceptorChain, MethodDescriptor, MethodPair, ProxyBase};
//!
//! trait Greeter {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self, name: &str) -> String {
//!         format!("hello {name}")
//!     }
//! }
//!
//! struct GreeterProxy(ProxyBase<English>);
//!
//! impl Greeter for GreeterProxy {
//!     fn greet(&self, name: &str) -> String {
//!         const GREET: MethodPair = MethodPair::new(
//!             MethodDescriptor::new("Greeter", "greet"),
//!             MethodDescriptor::new("English", "greet"),
//!         );
//!         let name = name.to_owned();
//!         self.0.run_function(GREET, parameters![name.clone()], String::new, move |svc| {
//!             svc.greet(&name)
//!         })
//!     }
//! }
//!
//! let proxy = GreeterProxy(ProxyBase::new(English, InterceptorChain::empty()));
//! assert_eq!(proxy.greet("bob"), "hello bob");
//! ```
//!
//! [`CallShape`]: crate::CallShape

use futures_util::future::BoxFuture;
use tracing::trace;

use crate::chain::InterceptorChain;
use crate::context::{AsyncTerminal, DispatchContext, SyncTerminal, Terminal};
use crate::method::MethodPair;
use crate::shape::ValueFuture;
use crate::value::{BoxedValue, DynValue, Parameters};

/// Owns one implementation and the interceptor chain wrapped around it.
///
/// Both live exactly as long as the proxy. With an empty chain every entry
/// point calls the implementation closure directly without building a
/// [`DispatchContext`].
pub struct ProxyBase<T: Send + Sync + 'static> {
    implementation: T,
    chain: InterceptorChain<T>,
}

impl<T: Send + Sync + 'static> ProxyBase<T> {
    pub fn new(implementation: T, chain: InterceptorChain<T>) -> Self {
        Self {
            implementation,
            chain,
        }
    }

    #[must_use]
    pub fn implementation(&self) -> &T {
        &self.implementation
    }

    #[must_use]
    pub fn chain(&self) -> &InterceptorChain<T> {
        &self.chain
    }

    /// Dispatch a synchronous method that returns nothing.
    ///
    /// `call` must be `Send` even though it runs on the caller's thread, so
    /// arguments that are not `Send` cannot be captured.
    pub fn run_action<F>(&self, methods: MethodPair, parameters: Parameters, call: F)
    where
        F: FnOnce(&T) + Send,
    {
        let implementation = &self.implementation;
        if self.chain.is_empty() {
            return call(implementation);
        }
        let terminal = Terminal::Sync(SyncTerminal::Action(Box::new(move || call(implementation))));
        let mut ctx = self.context(methods, parameters, terminal);
        ctx.proceed();
        ctx.trace_short_circuit();
    }

    /// Dispatch a synchronous method that returns a value.
    ///
    /// The result travels through the return slot as a [`DynValue`], so `R`
    /// must be owned (`'static`), `Send` and `Debug`. Methods returning
    /// borrows such as `&str` cannot be dispatched and have to return an
    /// owned value instead. `Result` return types pass through unchanged.
    ///
    /// If the chain short-circuits without leaving an `R` in the return slot,
    /// or leaves a value of another type, the caller receives `fallback()`.
    /// Dispatch bodies for `Default` types pass `R::default`.
    pub fn run_function<R, D, F>(
        &self,
        methods: MethodPair,
        parameters: Parameters,
        fallback: D,
        call: F,
    ) -> R
    where
        R: DynValue,
        D: FnOnce() -> R,
        F: FnOnce(&T) -> R + Send,
    {
        let implementation = &self.implementation;
        if self.chain.is_empty() {
            return call(implementation);
        }
        let terminal = Terminal::Sync(SyncTerminal::Function(Box::new(move || {
            Box::new(call(implementation)) as BoxedValue
        })));
        let mut ctx = self.context(methods, parameters, terminal);
        ctx.proceed();
        ctx.trace_short_circuit();
        ctx.into_return_value_or_else(fallback)
    }

    /// Dispatch an asynchronous method that returns nothing.
    pub fn run_async_action<'a, F>(
        &'a self,
        methods: MethodPair,
        parameters: Parameters,
        call: F,
    ) -> BoxFuture<'a, ()>
    where
        F: FnOnce(&'a T) -> BoxFuture<'a, ()> + Send + 'a,
    {
        let implementation = &self.implementation;
        if self.chain.is_empty() {
            return call(implementation);
        }
        Box::pin(async move {
            let terminal =
                Terminal::Async(AsyncTerminal::Action(Box::new(move || call(implementation))));
            let mut ctx = self.context(methods, parameters, terminal);
            ctx.proceed_async().await;
            ctx.trace_short_circuit();
        })
    }

    /// Dispatch an asynchronous method that returns a value.
    ///
    /// Same result contract as [`run_function`](Self::run_function).
    pub fn run_async_function<'a, R, D, F>(
        &'a self,
        methods: MethodPair,
        parameters: Parameters,
        fallback: D,
        call: F,
    ) -> BoxFuture<'a, R>
    where
        R: DynValue,
        D: FnOnce() -> R + Send + 'a,
        F: FnOnce(&'a T) -> BoxFuture<'a, R> + Send + 'a,
    {
        let implementation = &self.implementation;
        if self.chain.is_empty() {
            return call(implementation);
        }
        Box::pin(async move {
            let terminal = Terminal::Async(AsyncTerminal::Function(Box::new(move || {
                let fut = call(implementation);
                let boxed: BoxFuture<'a, BoxedValue> =
                    Box::pin(async move { Box::new(fut.await) as BoxedValue });
                boxed
            })));
            let mut ctx = self.context(methods, parameters, terminal);
            ctx.proceed_async().await;
            ctx.trace_short_circuit();
            ctx.into_return_value_or_else(fallback)
        })
    }

    /// Dispatch a lightweight-awaitable method that returns nothing.
    ///
    /// With an empty chain the implementation's own [`ValueFuture`] is handed
    /// back untouched, so a ready value stays allocation-free.
    pub fn run_value_async_action<'a, F>(
        &'a self,
        methods: MethodPair,
        parameters: Parameters,
        call: F,
    ) -> ValueFuture<'a, ()>
    where
        F: FnOnce(&'a T) -> ValueFuture<'a, ()> + Send + 'a,
    {
        let implementation = &self.implementation;
        if self.chain.is_empty() {
            return call(implementation);
        }
        ValueFuture::from_future(async move {
            let terminal =
                Terminal::Async(AsyncTerminal::ValueAction(Box::new(move || call(implementation))));
            let mut ctx = self.context(methods, parameters, terminal);
            ctx.proceed_async().await;
            ctx.trace_short_circuit();
        })
    }

    /// Dispatch a lightweight-awaitable method that returns a value.
    ///
    /// Same result contract as [`run_function`](Self::run_function).
    pub fn run_value_async_function<'a, R, D, F>(
        &'a self,
        methods: MethodPair,
        parameters: Parameters,
        fallback: D,
        call: F,
    ) -> ValueFuture<'a, R>
    where
        R: DynValue,
        D: FnOnce() -> R + Send + 'a,
        F: FnOnce(&'a T) -> ValueFuture<'a, R> + Send + 'a,
    {
        let implementation = &self.implementation;
        if self.chain.is_empty() {
            return call(implementation);
        }
        ValueFuture::from_future(async move {
            let terminal = Terminal::Async(AsyncTerminal::ValueFunction(Box::new(move || {
                let fut = call(implementation);
                ValueFuture::from_future(async move { Box::new(fut.await) as BoxedValue })
            })));
            let mut ctx = self.context(methods, parameters, terminal);
            ctx.proceed_async().await;
            ctx.trace_short_circuit();
            ctx.into_return_value_or_else(fallback)
        })
    }

    fn context<'c>(
        &'c self,
        methods: MethodPair,
        parameters: Parameters,
        terminal: Terminal<'c>,
    ) -> DispatchContext<'c, T> {
        let ctx = DispatchContext::new(
            &self.chain,
            &self.implementation,
            methods,
            parameters,
            terminal,
        );
        trace!(
            call_id = ctx.call_id(),
            method = %methods.interface,
            shape = %ctx.shape(),
            interceptors = self.chain.len(),
            "dispatching through interceptor chain"
        );
        ctx
    }
}

impl<T: Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for ProxyBase<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyBase")
            .field("implementation", &self.implementation)
            .field("chain", &self.chain)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
