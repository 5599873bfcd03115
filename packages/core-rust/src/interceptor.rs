use async_trait::async_trait;

use crate::context::DispatchContext;

/// A cross-cutting behavior wrapped around every call of a proxied service.
///
/// `T` is the implementation type the proxy owns. An interceptor is only split
/// along sync/async, never along the six call shapes: the same instance wraps
/// every method of the service, and the engine picks [`intercept`] for
/// synchronous methods and [`intercept_async`] for asynchronous ones.
///
/// A pass-through interceptor is a single unconditional continuation:
///
/// ```
/// use async_trait::async_trait;
/// use interpose_core::{DispatchContext, Interceptor};
///
/// struct PassThrough;
///
/// #[async_trait]
/// impl<T: Send + Sync + 'static> Interceptor<T> for PassThrough {
///     fn intercept(&self, ctx: &mut DispatchContext<'_, T>) {
///         ctx.proceed();
///     }
///
///     async fn intercept_async(&self, ctx: &mut DispatchContext<'_, T>) {
///         ctx.proceed_async().await;
///     }
/// }
/// ```
///
/// Not calling the continuation short-circuits the chain: neither later
/// interceptors nor the implementation run. Instances are shared by every call
/// in flight, so per-call state belongs on the context.
///
/// [`intercept`]: Interceptor::intercept
/// [`intercept_async`]: Interceptor::intercept_async
#[async_trait]
pub trait Interceptor<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Name used in engine log fields.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Wrap a synchronous call. Continue with `ctx.proceed()`.
    fn intercept(&self, ctx: &mut DispatchContext<'_, T>);

    /// Wrap an asynchronous call. Continue with `ctx.proceed_async().await`.
    async fn intercept_async(&self, ctx: &mut DispatchContext<'_, T>);
}
