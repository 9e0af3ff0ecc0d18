//! 统一的错误类型

/// 观测性错误类型
#[derive(Debug, thiserror::Error, Clone)]
pub enum ObservabilityError {
    /// 配置错误
    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    /// 日志错误
    #[error("Logging error: {message}")]
    Logging {
        message: String,
    },

    /// 初始化错误
    #[error("Initialization error: {message}")]
    Init {
        message: String,
    },

    /// IO 错误
    #[error("IO error: {message}")]
    Io {
        message: String,
    },

    /// 序列化/反序列化错误
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl ObservabilityError {
    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 创建日志错误
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// 创建初始化错误
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init {
            message: message.into(),
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Logging { .. } => "logging",
            Self::Init { .. } => "init",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<std::io::Error> for ObservabilityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ObservabilityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ObservabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ObservabilityError::config("Invalid level");
        assert!(matches!(err, ObservabilityError::Config { .. }));
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: ObservabilityError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.category(), "io");
        assert!(err.to_string().contains("denied"));
    }
}
