//! Stock interceptors for `interpose` chains.
//!
//! [`LoggingInterceptor`] and [`PerformanceInterceptor`] report through
//! `tracing` (and `metrics` for timings); [`telemetry::init_tracing`] sets up
//! a subscriber for binaries. The [`demo`] module shows a complete
//! hand-written proxy.

pub mod config;
pub mod demo;
pub mod logging;
pub mod performance;
pub mod telemetry;

pub use config::AspectConfig;
pub use demo::{DefaultDemoService, DemoService, DemoServiceProxy};
pub use logging::LoggingInterceptor;
pub use performance::PerformanceInterceptor;
pub use telemetry::{init_tracing, LogFormat};
