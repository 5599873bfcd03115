//! Demo service exercising every call shape, plus its hand-written proxy.
//!
//! [`DemoServiceProxy`] is what a generated proxy looks like: one dispatch
//! body per trait method, each snapshotting its arguments into
//! [`Parameters`](interpose_core::Parameters) and forwarding to the
//! [`ProxyBase`] entry point for the method's shape.

use std::any::type_name;
use std::sync::atomic::{AtomicU32, Ordering};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use interpose_core::{
    parameters, InterceptorChain, MethodDescriptor, MethodPair, ProxyBase, ValueFuture,
};
use parking_lot::Mutex;
use tracing::info;

use crate::config::AspectConfig;
use crate::logging::LoggingInterceptor;
use crate::performance::PerformanceInterceptor;

/// A service with one method per arity and shape.
///
/// Async methods borrow only `self` in their returned future, so borrowed
/// arguments must be copied before suspending.
pub trait DemoService: Send + Sync {
    fn action0(&self);
    fn action1(&self, name: &str);
    fn action2(&self, name: &str, count: u32);

    fn function0(&self) -> String;
    fn function1(&self, name: &str) -> String;
    fn function2(&self, name: &str, count: u32) -> String;

    fn async_action0(&self) -> BoxFuture<'_, ()>;
    fn async_action1(&self, name: &str) -> BoxFuture<'_, ()>;
    fn async_action2(&self, name: &str, count: u32) -> BoxFuture<'_, ()>;

    fn async_function0(&self) -> BoxFuture<'_, String>;
    fn async_function1(&self, name: &str) -> BoxFuture<'_, String>;
    fn async_function2(&self, name: &str, count: u32) -> BoxFuture<'_, String>;

    fn value_async_action0(&self) -> ValueFuture<'_, ()>;
    fn value_async_action1(&self, name: &str) -> ValueFuture<'_, ()>;

    fn value_async_function0(&self) -> ValueFuture<'_, String>;
    fn value_async_function1(&self, name: &str) -> ValueFuture<'_, String>;
    fn value_async_function2(&self, name: &str, count: u32) -> ValueFuture<'_, String>;
}

// ---------------------------------------------------------------------------
// DefaultDemoService
// ---------------------------------------------------------------------------

/// Plain implementation that logs each call and keeps a history of them.
#[derive(Debug, Default)]
pub struct DefaultDemoService {
    history: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl DefaultDemoService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages produced so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    /// Number of times any method body actually ran.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, message: String) -> String {
        info!(entry = %message, "demo service invoked");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history.lock().push(message.clone());
        message
    }
}

impl DemoService for DefaultDemoService {
    fn action0(&self) {
        self.record("action0".to_string());
    }

    fn action1(&self, name: &str) {
        self.record(format!("action1: {name}"));
    }

    fn action2(&self, name: &str, count: u32) {
        self.record(format!("action2: {name}, {count}"));
    }

    fn function0(&self) -> String {
        self.record("hello".to_string())
    }

    fn function1(&self, name: &str) -> String {
        self.record(format!("function1: {name}"))
    }

    fn function2(&self, name: &str, count: u32) -> String {
        self.record(format!("function2: {name}, {count}"))
    }

    fn async_action0(&self) -> BoxFuture<'_, ()> {
        async move {
            tokio::task::yield_now().await;
            self.record("async_action0".to_string());
        }
        .boxed()
    }

    fn async_action1(&self, name: &str) -> BoxFuture<'_, ()> {
        let message = format!("async_action1: {name}");
        async move {
            tokio::task::yield_now().await;
            self.record(message);
        }
        .boxed()
    }

    fn async_action2(&self, name: &str, count: u32) -> BoxFuture<'_, ()> {
        let message = format!("async_action2: {name}, {count}");
        async move {
            self.record(message);
        }
        .boxed()
    }

    fn async_function0(&self) -> BoxFuture<'_, String> {
        async move {
            tokio::task::yield_now().await;
            self.record("async_function0".to_string())
        }
        .boxed()
    }

    fn async_function1(&self, name: &str) -> BoxFuture<'_, String> {
        let message = format!("async_function1: {name}");
        async move { self.record(message) }.boxed()
    }

    fn async_function2(&self, name: &str, count: u32) -> BoxFuture<'_, String> {
        let message = format!("async_function2: {name}, {count}");
        async move { self.record(message) }.boxed()
    }

    fn value_async_action0(&self) -> ValueFuture<'_, ()> {
        self.record("value_async_action0".to_string());
        ValueFuture::ready(())
    }

    fn value_async_action1(&self, name: &str) -> ValueFuture<'_, ()> {
        let message = format!("value_async_action1: {name}");
        ValueFuture::from_future(async move {
            tokio::task::yield_now().await;
            self.record(message);
        })
    }

    fn value_async_function0(&self) -> ValueFuture<'_, String> {
        ValueFuture::ready(self.record("value_async_function0".to_string()))
    }

    fn value_async_function1(&self, name: &str) -> ValueFuture<'_, String> {
        ValueFuture::ready(self.record(format!("value_async_function1: {name}")))
    }

    fn value_async_function2(&self, name: &str, count: u32) -> ValueFuture<'_, String> {
        let message = format!("value_async_function2: {name}, {count}");
        ValueFuture::from_future(async move {
            tokio::task::yield_now().await;
            self.record(message)
        })
    }
}

// ---------------------------------------------------------------------------
// DemoServiceProxy
// ---------------------------------------------------------------------------

/// Routes every [`DemoService`] call on `S` through an interceptor chain.
pub struct DemoServiceProxy<S: DemoService + 'static> {
    base: ProxyBase<S>,
}

impl<S: DemoService + 'static> DemoServiceProxy<S> {
    pub fn new(service: S, chain: InterceptorChain<S>) -> Self {
        Self {
            base: ProxyBase::new(service, chain),
        }
    }

    /// Wrap `service` in `[logging, performance]`, outermost first.
    pub fn with_default_aspects(service: S, config: &AspectConfig) -> Self {
        let chain = InterceptorChain::builder()
            .with(LoggingInterceptor::new(config.clone()))
            .with(PerformanceInterceptor::new(config.clone()))
            .build();
        Self::new(service, chain)
    }

    /// The wrapped implementation.
    pub fn inner(&self) -> &S {
        self.base.implementation()
    }

    pub fn chain(&self) -> &InterceptorChain<S> {
        self.base.chain()
    }

    fn methods(method: &'static str) -> MethodPair {
        MethodPair::new(
            MethodDescriptor::new("DemoService", method),
            MethodDescriptor::new(type_name::<S>(), method),
        )
    }
}

impl<S: DemoService + 'static> DemoService for DemoServiceProxy<S> {
    fn action0(&self) {
        self.base
            .run_action(Self::methods("action0"), parameters![], |svc| svc.action0());
    }

    fn action1(&self, name: &str) {
        let name = name.to_owned();
        self.base
            .run_action(Self::methods("action1"), parameters![name.clone()], move |svc| {
                svc.action1(&name);
            });
    }

    fn action2(&self, name: &str, count: u32) {
        let name = name.to_owned();
        self.base.run_action(
            Self::methods("action2"),
            parameters![name.clone(), count],
            move |svc| svc.action2(&name, count),
        );
    }

    fn function0(&self) -> String {
        self.base.run_function(
            Self::methods("function0"),
            parameters![],
            String::new,
            |svc| svc.function0(),
        )
    }

    fn function1(&self, name: &str) -> String {
        let name = name.to_owned();
        self.base.run_function(
            Self::methods("function1"),
            parameters![name.clone()],
            String::new,
            move |svc| svc.function1(&name),
        )
    }

    fn function2(&self, name: &str, count: u32) -> String {
        let name = name.to_owned();
        self.base.run_function(
            Self::methods("function2"),
            parameters![name.clone(), count],
            String::new,
            move |svc| svc.function2(&name, count),
        )
    }

    fn async_action0(&self) -> BoxFuture<'_, ()> {
        self.base
            .run_async_action(Self::methods("async_action0"), parameters![], |svc| {
                svc.async_action0()
            })
    }

    fn async_action1(&self, name: &str) -> BoxFuture<'_, ()> {
        let name = name.to_owned();
        self.base.run_async_action(
            Self::methods("async_action1"),
            parameters![name.clone()],
            move |svc| svc.async_action1(&name),
        )
    }

    fn async_action2(&self, name: &str, count: u32) -> BoxFuture<'_, ()> {
        let name = name.to_owned();
        self.base.run_async_action(
            Self::methods("async_action2"),
            parameters![name.clone(), count],
            move |svc| svc.async_action2(&name, count),
        )
    }

    fn async_function0(&self) -> BoxFuture<'_, String> {
        self.base.run_async_function(
            Self::methods("async_function0"),
            parameters![],
            String::new,
            |svc| svc.async_function0(),
        )
    }

    fn async_function1(&self, name: &str) -> BoxFuture<'_, String> {
        let name = name.to_owned();
        self.base.run_async_function(
            Self::methods("async_function1"),
            parameters![name.clone()],
            String::new,
            move |svc| svc.async_function1(&name),
        )
    }

    fn async_function2(&self, name: &str, count: u32) -> BoxFuture<'_, String> {
        let name = name.to_owned();
        self.base.run_async_function(
            Self::methods("async_function2"),
            parameters![name.clone(), count],
            String::new,
            move |svc| svc.async_function2(&name, count),
        )
    }

    fn value_async_action0(&self) -> ValueFuture<'_, ()> {
        self.base
            .run_value_async_action(Self::methods("value_async_action0"), parameters![], |svc| {
                svc.value_async_action0()
            })
    }

    fn value_async_action1(&self, name: &str) -> ValueFuture<'_, ()> {
        let name = name.to_owned();
        self.base.run_value_async_action(
            Self::methods("value_async_action1"),
            parameters![name.clone()],
            move |svc| svc.value_async_action1(&name),
        )
    }

    fn value_async_function0(&self) -> ValueFuture<'_, String> {
        self.base.run_value_async_function(
            Self::methods("value_async_function0"),
            parameters![],
            String::new,
            |svc| svc.value_async_function0(),
        )
    }

    fn value_async_function1(&self, name: &str) -> ValueFuture<'_, String> {
        let name = name.to_owned();
        self.base.run_value_async_function(
            Self::methods("value_async_function1"),
            parameters![name.clone()],
            String::new,
            move |svc| svc.value_async_function1(&name),
        )
    }

    fn value_async_function2(&self, name: &str, count: u32) -> ValueFuture<'_, String> {
        let name = name.to_owned();
        self.base.run_value_async_function(
            Self::methods("value_async_function2"),
            parameters![name.clone(), count],
            String::new,
            move |svc| svc.value_async_function2(&name, count),
        )
    }
}

impl<S: DemoService + std::fmt::Debug + 'static> std::fmt::Debug for DemoServiceProxy<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoServiceProxy")
            .field("base", &self.base)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
