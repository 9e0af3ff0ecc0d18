//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能，支持运行时调整日志级别。

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter,
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::{Config, LoggingConfig};
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

/// 日志管理器
///
/// 持有文件写入线程的 guard，drop 时刷新剩余日志。
#[derive(Debug)]
pub struct LogManager {
    /// 配置
    config: LoggingConfig,

    /// 过滤器重新加载句柄
    reload_handle: Option<ReloadHandle>,

    _guard: Option<WorkerGuard>,
}

impl LogManager {
    /// 创建日志管理器并安装全局 subscriber
    pub fn new(config: &Config) -> Result<Self> {
        let mut manager = Self {
            config: config.logging.clone(),
            reload_handle: None,
            _guard: None,
        };

        manager.init()?;

        Ok(manager)
    }

    /// 初始化日志系统
    fn init(&mut self) -> Result<()> {
        let filter = build_filter(&self.config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let (writer, guard) = match self.config.file_path {
            Some(ref path) => {
                let (writer, guard) = file_writer(path)?;
                (writer, Some(guard))
            }
            None => (BoxMakeWriter::new(std::io::stderr), None),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(self.config.include_target)
            .with_line_number(self.config.include_line_number)
            .with_ansi(self.config.ansi_colors && self.config.file_path.is_none());

        let registry = tracing_subscriber::registry().with(filter);
        let installed = if self.config.json_format {
            registry.with(layer.json()).try_init()
        } else {
            registry.with(layer).try_init()
        };
        installed.map_err(|e| ObservabilityError::init(format!("Failed to install subscriber: {}", e)))?;

        self.reload_handle = Some(reload_handle);
        self._guard = guard;

        tracing::debug!(
            target: "driftwatch_observability",
            "Log manager initialized with level: {}",
            self.config.level
        );

        Ok(())
    }

    /// 动态更新日志级别
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = EnvFilter::try_new(level)
            .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

        match self.reload_handle {
            Some(ref handle) => {
                handle
                    .modify(|filter| *filter = new_filter)
                    .map_err(|e| {
                        ObservabilityError::logging(format!("Failed to update log level: {}", e))
                    })?;

                self.config.level = level.to_string();

                tracing::info!(
                    target: "driftwatch_observability",
                    "Log level updated to: {}",
                    level
                );
                Ok(())
            }
            None => Err(ObservabilityError::logging("Log manager not initialized")),
        }
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    // 添加模块级别的过滤器
    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// 非阻塞文件写入器
fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ObservabilityError::config(format!("Invalid log file path: {:?}", path)))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), guard))
}

/// 创建带有会话上下文的 span
pub fn create_session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!(
        "session",
        session_id = %session_id,
    )
}

/// 创建带有命令上下文的 span
pub fn create_command_span(command: &str) -> tracing::Span {
    tracing::info_span!(
        "command",
        command = %command,
    )
}
