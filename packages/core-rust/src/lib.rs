//! `interpose` core: ordered interceptor chains wrapped around a service
//! implementation.
//!
//! A proxy type owns a [`ProxyBase`] and implements the service trait by
//! routing every method through one of six entry points, one per
//! [`CallShape`]. Each call gets a fresh [`DispatchContext`] that walks the
//! [`InterceptorChain`] and finally runs the implementation at most once.

pub mod chain;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod method;
pub mod proxy;
pub mod shape;
pub mod value;

#[cfg(test)]
mod testing;

pub use chain::{ChainBuilder, InterceptorChain, SharedInterceptor};
pub use context::{ContextState, DispatchContext};
pub use error::DispatchError;
pub use interceptor::Interceptor;
pub use method::{MethodDescriptor, MethodPair};
pub use proxy::ProxyBase;
pub use shape::{CallShape, Continuation, ValueFuture};
pub use value::{BoxedValue, DynValue, Parameters};

pub use futures_util::future::BoxFuture;
