//! Driftwatch Observability Infrastructure
//!
//! 提供统一的日志初始化与会话 span。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, LoggingConfig};
pub use error::{ObservabilityError, Result};
pub use logging::{create_command_span, create_session_span, LogManager};

/// 初始化全局日志系统
///
/// 返回的 [`LogManager`] 需要在进程生命周期内保持存活，否则文件日志可能丢失。
pub fn init(config: &Config) -> Result<LogManager> {
    let manager = LogManager::new(config)?;

    tracing::info!(
        target: "driftwatch_observability",
        app = %config.app_name,
        "Observability infrastructure initialized"
    );

    Ok(manager)
}

/// 从 driftwatch-config 初始化日志系统
#[cfg(feature = "config-integration")]
pub fn init_from_app_config(config: &driftwatch_config::Config) -> Result<LogManager> {
    init(&Config::from(config))
}
