//! 日志系统
//!
//! tracing 事件写到 stderr，stdout 只留给命令输出

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 默认只输出警告，避免打断进度条
const DEFAULT_FILTER: &str = "warn";

/// 解析过滤规则：`--log-level` > `RUST_LOG` > 默认 `warn`
///
/// A bare level such as `debug` applies to this crate only, so HTTP client
/// internals stay quiet; full directives (`hatena_cli=trace,reqwest=debug`)
/// pass through unchanged.
pub fn build_filter(log_level: Option<&str>) -> Result<EnvFilter> {
    match log_level {
        Some(level) if level.contains('=') || level.contains(',') => {
            EnvFilter::try_new(level).with_context(|| format!("invalid filter '{level}'"))
        }
        Some(level) => EnvFilter::try_new(format!("{DEFAULT_FILTER},hatena_cli={level}"))
            .with_context(|| format!("invalid log level '{level}'")),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// 初始化日志系统
///
/// ```no_run
/// use hatena_cli::utils::logger::init_logger;
///
/// init_logger(Some("debug")).unwrap();
/// ```
pub fn init_logger(log_level: Option<&str>) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(build_filter(log_level)?)
        .with(fmt_layer)
        .try_init()
        .context("logger already initialized")?;

    tracing::debug!("Logger initialized");
    Ok(())
}
