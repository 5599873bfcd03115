use clap::{ArgAction, Parser};
use interpose_aspects::{
    init_tracing, AspectConfig, DefaultDemoService, DemoService, DemoServiceProxy, LogFormat,
};
use interpose_core::InterceptorChain;

/// Call every demo service method through `[logging, performance]`.
#[derive(Debug, Parser)]
#[command(name = "interpose-demo", version)]
struct Args {
    /// Log output format.
    #[arg(long, value_enum, env = "INTERPOSE_LOG_FORMAT", default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// Calls taking at least this many milliseconds are logged as slow.
    #[arg(long, env = "INTERPOSE_SLOW_CALL_MS", default_value_t = 500)]
    slow_call_ms: u64,

    /// Include parameters in call logs.
    #[arg(long, env = "INTERPOSE_LOG_PARAMETERS", action = ArgAction::Set, default_value_t = true)]
    log_parameters: bool,

    /// Include return values in call logs.
    #[arg(long, env = "INTERPOSE_LOG_RETURN_VALUES", action = ArgAction::Set, default_value_t = true)]
    log_return_values: bool,

    /// Truncate logged values to this many characters.
    #[arg(long, env = "INTERPOSE_MAX_LOGGED_VALUE_LEN", default_value_t = 256)]
    max_logged_value_len: usize,

    /// Dispatch straight to the implementation.
    #[arg(long)]
    no_interceptors: bool,

    /// Name passed to every method that takes one.
    #[arg(long, default_value = "Alper")]
    name: String,
}

impl Args {
    fn aspect_config(&self) -> AspectConfig {
        AspectConfig {
            log_parameters: self.log_parameters,
            log_return_values: self.log_return_values,
            slow_call_threshold_ms: self.slow_call_ms,
            max_logged_value_len: self.max_logged_value_len,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let service = DefaultDemoService::new();
    let proxy = if args.no_interceptors {
        DemoServiceProxy::new(service, InterceptorChain::empty())
    } else {
        DemoServiceProxy::with_default_aspects(service, &args.aspect_config())
    };
    tracing::info!(interceptors = ?proxy.chain().names(), "demo proxy ready");

    let name = args.name.as_str();
    proxy.action0();
    proxy.action1(name);
    proxy.action2(name, 2);
    println!("{}", proxy.function0());
    println!("{}", proxy.function1(name));
    println!("{}", proxy.function2(name, 2));
    proxy.async_action0().await;
    proxy.async_action1(name).await;
    proxy.async_action2(name, 2).await;
    println!("{}", proxy.async_function0().await);
    println!("{}", proxy.async_function1(name).await);
    println!("{}", proxy.async_function2(name, 2).await);
    proxy.value_async_action0().await;
    proxy.value_async_action1(name).await;
    println!("{}", proxy.value_async_function0().await);
    println!("{}", proxy.value_async_function1(name).await);
    println!("{}", proxy.value_async_function2(name, 2).await);

    tracing::info!(calls = proxy.inner().calls(), "demo finished");
    Ok(())
}
