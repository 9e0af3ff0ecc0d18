use serde::{Deserialize, Serialize};

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig::default(),
            assistant: AssistantConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["storage", "type"] => Some(self.storage.storage_type.to_string()),
            ["storage", "path"] => Some(self.storage.path.clone()),
            ["storage", "slot_key"] => Some(self.storage.slot_key.clone()),
            ["assistant", "reply_delay_ms"] => Some(self.assistant.reply_delay_ms.to_string()),
            ["assistant", "connect_delay_ms"] => {
                Some(self.assistant.connect_delay_ms.to_string())
            }
            ["assistant", "region"] => Some(self.assistant.region.clone()),
            ["assistant", "account_id"] => Some(self.assistant.account_id.clone()),
            ["upload", "allowed_extensions"] => Some(self.upload.allowed_extensions.join(",")),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["storage", "type"] => {
                self.storage.storage_type = value.parse()?;
            }
            ["storage", "path"] => {
                self.storage.path = value.to_string();
            }
            ["storage", "slot_key"] => {
                self.storage.slot_key = value.to_string();
            }
            ["assistant", "reply_delay_ms"] => {
                self.assistant.reply_delay_ms = parse_number(value)?;
            }
            ["assistant", "connect_delay_ms"] => {
                self.assistant.connect_delay_ms = parse_number(value)?;
            }
            ["assistant", "region"] => {
                self.assistant.region = value.to_string();
            }
            ["assistant", "account_id"] => {
                self.assistant.account_id = value.to_string();
            }
            ["upload", "allowed_extensions"] => {
                self.upload.allowed_extensions = value
                    .split(',')
                    .map(|ext| ext.trim().to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect();
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["logging", "json"] => {
                self.logging.json = parse_bool(value)?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// Storage 类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// 本地文件槽位
    #[default]
    File,
    /// 仅内存，进程退出即丢失
    Memory,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::File => write!(f, "file"),
            StorageType::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageType::File),
            "memory" => Ok(StorageType::Memory),
            _ => Err(ConfigError::Validation(format!("Invalid storage type: {}", s))),
        }
    }
}

/// Storage 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(rename = "type", default)]
    pub storage_type: StorageType,
    pub path: String,
    pub slot_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::File,
            path: "~/.driftwatch/storage".to_string(),
            slot_key: "terraform-chat-history".to_string(),
        }
    }
}

/// 模拟助手配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    /// 模拟回复延迟
    pub reply_delay_ms: u64,
    /// 模拟 AWS 连接延迟
    pub connect_delay_ms: u64,
    pub region: String,
    pub account_id: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 2000,
            connect_delay_ms: 3000,
            region: "us-east-1".to_string(),
            account_id: "123456789012".to_string(),
        }
    }
}

/// 文件上传配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: [".tfplan", ".tfstate", ".json", ".tf"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    pub file: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            file: None,
            json: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
