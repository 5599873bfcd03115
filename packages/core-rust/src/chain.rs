//! Ordered, read-only interceptor chains.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::interceptor::Interceptor;

/// Shared handle to one interceptor.
pub type SharedInterceptor<T> = Arc<dyn Interceptor<T>>;

// ---------------------------------------------------------------------------
// InterceptorChain
// ---------------------------------------------------------------------------

/// Immutable ordered list of interceptors for one wrapped instance.
///
/// Insertion order is execution order: the first interceptor sees the call
/// first and the return value last. Clones share the same storage, and the
/// chain can be read concurrently by any number of in-flight calls.
pub struct InterceptorChain<T: Send + Sync + 'static> {
    interceptors: Arc<[SharedInterceptor<T>]>,
}

impl<T: Send + Sync + 'static> InterceptorChain<T> {
    /// Build a chain from interceptors in execution order.
    pub fn new<I>(interceptors: I) -> Self
    where
        I: IntoIterator<Item = SharedInterceptor<T>>,
    {
        Self {
            interceptors: interceptors.into_iter().collect(),
        }
    }

    /// A chain with no interceptors; dispatch goes straight to the implementation.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Start an ordered builder.
    #[must_use]
    pub fn builder() -> ChainBuilder<T> {
        ChainBuilder::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SharedInterceptor<T>> {
        self.interceptors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedInterceptor<T>> {
        self.interceptors.iter()
    }

    /// Interceptor names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|i| i.name()).collect()
    }
}

impl<T: Send + Sync + 'static> Clone for InterceptorChain<T> {
    fn clone(&self) -> Self {
        Self {
            interceptors: Arc::clone(&self.interceptors),
        }
    }
}

impl<T: Send + Sync + 'static> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Send + Sync + 'static> Index<usize> for InterceptorChain<T> {
    type Output = SharedInterceptor<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.interceptors[index]
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// ChainBuilder
// ---------------------------------------------------------------------------

/// Collects interceptors in registration order.
pub struct ChainBuilder<T: Send + Sync + 'static> {
    interceptors: Vec<SharedInterceptor<T>>,
}

impl<T: Send + Sync + 'static> ChainBuilder<T> {
    /// Append an interceptor after every one added so far.
    #[must_use]
    pub fn with<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor<T> + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append an interceptor that is already shared with other chains.
    #[must_use]
    pub fn with_shared(mut self, interceptor: SharedInterceptor<T>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    #[must_use]
    pub fn build(self) -> InterceptorChain<T> {
        InterceptorChain::new(self.interceptors)
    }
}

impl<T: Send + Sync + 'static> Default for ChainBuilder<T> {
    fn default() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::context::DispatchContext;

    struct Named(&'static str);

    #[async_trait]
    impl Interceptor<()> for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn intercept(&self, ctx: &mut DispatchContext<'_, ()>) {
            ctx.proceed();
        }

        async fn intercept_async(&self, ctx: &mut DispatchContext<'_, ()>) {
            ctx.proceed_async().await;
        }
    }

    #[test]
    fn builder_preserves_registration_order() {
        let chain = InterceptorChain::<()>::builder()
            .with(Named("first"))
            .with(Named("second"))
            .with_shared(Arc::new(Named("third")))
            .build();
        assert_eq!(chain.names(), vec!["first", "second", "third"]);
        assert_eq!(chain[1].name(), "second");
    }

    #[test]
    fn clones_share_storage() {
        let chain = InterceptorChain::<()>::builder().with(Named("only")).build();
        let copy = chain.clone();
        assert!(Arc::ptr_eq(&chain.interceptors, &copy.interceptors));
    }

    #[test]
    fn empty_chain_reports_empty() {
        let chain = InterceptorChain::<()>::empty();
        assert!(chain.is_empty());
        assert!(chain.get(0).is_none());
        assert_eq!(format!("{chain:?}"), "[]");
    }
}
