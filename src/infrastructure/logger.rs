//! 日志基础设施

use std::io;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// 初始化日志：控制台输出，可选按日期滚动的文件输出
    ///
    /// `RUST_LOG` 优先于配置中的级别。返回的 guard 必须在进程结束前保持存活。
    pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))?;

        if !config.file_output {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stdout).with_ansi(true))
                .try_init()?;
            return Ok(None);
        }

        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
        let (writer, guard) = non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false),
            )
            .with(fmt::layer().with_writer(io::stdout).with_ansi(true))
            .try_init()?;

        Ok(Some(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // 全局 subscriber 只能设置一次，本模块只保留这一个初始化用例
    #[test]
    fn test_init_with_file_output() {
        let dir = tempdir().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            log_dir: dir.path().join("logs"),
            file_prefix: "catalog-test".to_string(),
            file_output: true,
        };

        let guard = Logger::init(&config).unwrap();
        assert!(guard.is_some());
        assert!(config.log_dir.is_dir());

        tracing::info!("logger initialized");
        drop(guard);

        // 再次初始化应返回错误而不是 panic
        assert!(Logger::init(&config).is_err());
    }
}
