//! Call logging interceptor.
//!
//! Logs every call before it continues and again once the inner chain has
//! returned, including the return value for shapes that produce one.

use async_trait::async_trait;
use interpose_core::{DispatchContext, Interceptor};
use tracing::info;

use crate::config::AspectConfig;

/// Logs method, parameters and return value of every intercepted call.
#[derive(Debug, Clone, Default)]
pub struct LoggingInterceptor {
    config: AspectConfig,
}

impl LoggingInterceptor {
    #[must_use]
    pub fn new(config: AspectConfig) -> Self {
        Self { config }
    }

    fn before<T: Send + Sync + 'static>(&self, ctx: &DispatchContext<'_, T>) {
        if self.config.log_parameters {
            info!(
                call_id = ctx.call_id(),
                method = %ctx.interface_method(),
                parameters = %self.config.truncate(ctx.parameters().to_string()),
                "intercepting call"
            );
        } else {
            info!(
                call_id = ctx.call_id(),
                method = %ctx.interface_method(),
                "intercepting call"
            );
        }
    }

    fn after<T: Send + Sync + 'static>(&self, ctx: &DispatchContext<'_, T>) {
        if ctx.returns_value() && self.config.log_return_values {
            let rendered = ctx
                .return_value()
                .map_or_else(|| "<none>".to_string(), |value| format!("{value:?}"));
            info!(
                call_id = ctx.call_id(),
                method = %ctx.interface_method(),
                return_value = %self.config.truncate(rendered),
                "call returned"
            );
        } else {
            info!(
                call_id = ctx.call_id(),
                method = %ctx.interface_method(),
                "call returned"
            );
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Interceptor<T> for LoggingInterceptor {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn intercept(&self, ctx: &mut DispatchContext<'_, T>) {
        self.before(ctx);
        ctx.proceed();
        self.after(ctx);
    }

    async fn intercept_async(&self, ctx: &mut DispatchContext<'_, T>) {
        self.before(ctx);
        ctx.proceed_async().await;
        self.after(ctx);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;
    use interpose_core::{parameters, InterceptorChain, MethodDescriptor, MethodPair, ProxyBase};

    use super::*;
    use crate::telemetry::capture::CapturedLogs;

    const ECHO: MethodPair = MethodPair::new(
        MethodDescriptor::new("Echo", "echo"),
        MethodDescriptor::new("EchoImpl", "echo"),
    );

    struct Echo;

    fn proxy(config: AspectConfig) -> ProxyBase<Echo> {
        ProxyBase::new(
            Echo,
            InterceptorChain::builder()
                .with(LoggingInterceptor::new(config))
                .build(),
        )
    }

    #[test]
    fn logs_parameters_and_return_value() {
        let logs = CapturedLogs::default();
        let proxy = proxy(AspectConfig::default());
        let result = tracing::subscriber::with_default(logs.subscriber(), || {
            proxy.run_function(ECHO, parameters!["ping".to_string()], String::new, |_| {
                "pong".to_string()
            })
        });
        assert_eq!(result, "pong");

        let lines = logs.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].contains("intercepting call"));
        assert!(lines[0].contains("method=Echo::echo"));
        assert!(lines[0].contains(r#"parameters="ping""#));
        assert!(lines[1].contains("call returned"));
        assert!(lines[1].contains(r#"return_value="pong""#));
    }

    #[test]
    fn respects_disabled_fields() {
        let logs = CapturedLogs::default();
        let proxy = proxy(AspectConfig {
            log_parameters: false,
            log_return_values: false,
            ..AspectConfig::default()
        });
        tracing::subscriber::with_default(logs.subscriber(), || {
            proxy.run_function(ECHO, parameters!["secret".to_string()], u8::default, |_| 1_u8)
        });
        let joined = logs.lines().join("\n");
        assert!(!joined.contains("secret"));
        assert!(!joined.contains("return_value"));
    }

    #[tokio::test]
    async fn void_async_calls_log_without_return_value() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        let proxy = proxy(AspectConfig::default());
        proxy
            .run_async_action(ECHO, parameters![], |_| async {}.boxed())
            .await;
        let lines = logs.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(!lines[1].contains("return_value"));
    }

    #[test]
    fn long_return_values_are_truncated() {
        let logs = CapturedLogs::default();
        let proxy = proxy(AspectConfig {
            max_logged_value_len: 4,
            ..AspectConfig::default()
        });
        tracing::subscriber::with_default(logs.subscriber(), || {
            proxy.run_function(ECHO, parameters![], String::new, |_| "abcdefgh".to_string())
        });
        assert!(logs.lines()[1].contains("return_value=\"abc…"));
    }
}
