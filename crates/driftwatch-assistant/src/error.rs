use driftwatch_session::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("No valid files to upload (allowed: {allowed})")]
    NoValidFiles { allowed: String },

    #[error("No active chat session")]
    NoActiveSession,
}

impl AssistantError {
    /// 用户可见的拒绝，不影响会话状态
    pub fn is_rejection(&self) -> bool {
        match self {
            AssistantError::Storage(err) => err.is_rejection(),
            AssistantError::EmptyMessage | AssistantError::NoValidFiles { .. } => true,
            AssistantError::NoActiveSession => false,
        }
    }
}

pub type AssistantResult<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections() {
        assert!(AssistantError::EmptyMessage.is_rejection());
        assert!(AssistantError::from(StorageError::LastSessionRequired {
            id: "chat-1".to_string()
        })
        .is_rejection());
        assert!(!AssistantError::NoActiveSession.is_rejection());
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err = AssistantError::from(StorageError::session_not_found("chat-9"));
        assert_eq!(
            err.to_string(),
            StorageError::session_not_found("chat-9").to_string()
        );
    }
}
