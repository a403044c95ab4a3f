//! 日志初始化
//!
//! 两个输出：`log_file` 追加写入（无 ANSI）与 stderr。
//! 设置 `RUST_LOG` 时覆盖配置的级别。

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing::{Level, Subscriber};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ProvisionConfig;
use crate::error::ProvisionError;

/// 构建过滤器：优先 `RUST_LOG`，否则使用配置级别
pub fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// 构建 subscriber
///
/// 日志文件以追加模式打开一次，父目录不存在时自动创建
pub fn subscriber(
    filter: EnvFilter,
    log_file: &Path,
    console: bool,
) -> Result<impl Subscriber + Send + Sync + 'static, ProvisionError> {
    let appender = open_appender(log_file)?;

    let file_layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false);

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer))
}

/// 安装全局 subscriber
pub fn init_logging(config: &ProvisionConfig) -> Result<(), ProvisionError> {
    let subscriber = subscriber(filter_for(config.log_level), &config.log_file, true)?;
    tracing::subscriber::set_global_default(subscriber).map_err(|e| ProvisionError::LogInit {
        path: config.log_file.clone(),
        message: e.to_string(),
    })
}

fn open_appender(log_file: &Path) -> Result<RollingFileAppender, ProvisionError> {
    let log_init_error = |message: String| ProvisionError::LogInit {
        path: log_file.to_path_buf(),
        message,
    };

    let file_name = log_file
        .file_name()
        .ok_or_else(|| log_init_error("path has no file name".to_string()))?;
    let dir = match log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| log_init_error(e.to_string()))
}
