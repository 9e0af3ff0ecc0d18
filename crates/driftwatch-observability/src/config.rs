//! 配置管理模块
//!
//! 支持从环境变量、配置文件或 driftwatch-config 读取日志配置。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ObservabilityError, Result};

/// 观测性配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 应用名称
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// - `DRIFTWATCH_LOG`：日志级别或过滤指令
    /// - `DRIFTWATCH_LOG_JSON`：`true` 时输出 JSON
    /// - `DRIFTWATCH_LOG_FILE`：日志文件路径
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("DRIFTWATCH_LOG") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("DRIFTWATCH_LOG_JSON") {
            config.logging.json_format = json.eq_ignore_ascii_case("true") || json == "1";
        }
        if let Ok(path) = std::env::var("DRIFTWATCH_LOG_FILE") {
            config.logging.file_path = Some(PathBuf::from(path));
        }
        config
    }

    /// 从 JSON 文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            _ => Err(ObservabilityError::config("Unsupported config file format")),
        }
    }

    /// 设置日志级别
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.logging.json_format = json;
        self
    }

    /// 设置日志文件路径
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.logging.file_path = Some(path.into());
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.logging.module_levels.insert(module.into(), level.into());
        self
    }
}

#[cfg(feature = "config-integration")]
impl From<&driftwatch_config::Config> for Config {
    fn from(config: &driftwatch_config::Config) -> Self {
        let mut observability = Config::default()
            .with_log_level(config.logging.level.to_string())
            .with_json_format(config.logging.json);

        if let Some(ref file) = config.logging.file {
            if let Some(path) = driftwatch_config::expand_tilde(file) {
                observability = observability.with_log_file(path);
            }
        }

        observability
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）或 EnvFilter 指令
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default = "default_false")]
    pub json_format: bool,

    /// 日志文件路径，None 时输出到 stderr
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色（写文件时总是关闭）
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// 是否包含目标（target）
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// 是否包含行号
    #[serde(default = "default_false")]
    pub include_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
            module_levels: HashMap::new(),
            ansi_colors: true,
            include_target: true,
            include_line_number: false,
        }
    }
}

fn default_app_name() -> String {
    "driftwatch".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
