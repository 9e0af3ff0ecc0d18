//! # Storage Error Types
//!
//! 定义会话存储相关的错误类型。

use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 会话不存在
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// 至少需要保留一个会话
    #[error("Cannot delete session {id}: at least one session required")]
    LastSessionRequired { id: String },

    /// 消息ID在会话内重复
    #[error("Message {message_id} already exists in session {session_id}")]
    MessageAlreadyExists {
        session_id: String,
        message_id: String,
    },

    /// 无效的槽位名
    #[error("Invalid storage key: {key:?}")]
    InvalidKey { key: String },

    /// 其他错误
    #[error("Storage error: {message}")]
    Other { message: String },
}

impl StorageError {
    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }

    /// 是否为面向用户的拒绝（不涉及存储故障）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound { .. }
                | Self::LastSessionRequired { .. }
                | Self::MessageAlreadyExists { .. }
        )
    }
}

/// 存储结果类型
pub type StorageResult<T> = Result<T, StorageError>;
