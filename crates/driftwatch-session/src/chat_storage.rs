//! # Chat Storage
//!
//! 会话集合与持久化槽位之间的编解码。
//!
//! - 读取失败、槽位不存在、内容无法解析时都回退到默认种子数据（记录日志，不向上抛出）
//! - 写入失败只记录日志，不重试

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::StorageResult;
use crate::seed;
use crate::storage::SlotStorage;
use crate::types::ChatSession;

/// 默认槽位名
pub const DEFAULT_SLOT_KEY: &str = "terraform-chat-history";

/// 将会话集合编码为槽位内容
pub fn encode_sessions(sessions: &[ChatSession]) -> StorageResult<String> {
    Ok(serde_json::to_string(sessions)?)
}

/// 从槽位内容解码会话集合
pub fn decode_sessions(raw: &str) -> StorageResult<Vec<ChatSession>> {
    Ok(serde_json::from_str(raw)?)
}

/// 会话集合的持久化入口
#[derive(Clone)]
pub struct ChatStorage {
    storage: Arc<dyn SlotStorage>,
    key: String,
}

impl ChatStorage {
    /// 使用默认槽位名
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self::with_key(storage, DEFAULT_SLOT_KEY)
    }

    pub fn with_key(storage: Arc<dyn SlotStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 读取并解码槽位；槽位不存在时返回 `None`
    pub async fn try_load_sessions(&self) -> StorageResult<Option<Vec<ChatSession>>> {
        match self.storage.read(&self.key).await? {
            Some(raw) => decode_sessions(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// 加载会话集合
    ///
    /// 无法得到已保存的数据时生成默认会话，并立即写回槽位，
    /// 使后续加载得到相同的集合。
    pub async fn load_sessions(&self) -> Vec<ChatSession> {
        match self.try_load_sessions().await {
            Ok(Some(sessions)) => {
                debug!("Loaded {} chat sessions from slot {}", sessions.len(), self.key);
                return sessions;
            }
            Ok(None) => {
                info!("No chat history in slot {}, seeding defaults", self.key);
            }
            Err(e) => {
                warn!(
                    "Failed to load chat sessions from slot {}: {}; falling back to defaults",
                    self.key, e
                );
            }
        }

        let sessions = seed::default_sessions();
        self.save_sessions(&sessions).await;
        sessions
    }

    /// 编码并写入槽位
    pub async fn try_save_sessions(&self, sessions: &[ChatSession]) -> StorageResult<()> {
        let raw = encode_sessions(sessions)?;
        self.storage.write(&self.key, &raw).await?;
        debug!("Saved {} chat sessions to slot {}", sessions.len(), self.key);
        Ok(())
    }

    /// 保存会话集合；失败只记录日志
    pub async fn save_sessions(&self, sessions: &[ChatSession]) {
        if let Err(e) = self.try_save_sessions(sessions).await {
            error!("Failed to save chat sessions to slot {}: {}", self.key, e);
        }
    }

    /// 清空槽位，下一次加载将重新生成默认会话
    pub async fn clear(&self) -> StorageResult<()> {
        self.storage.remove(&self.key).await?;
        info!("Cleared chat history slot {}", self.key);
        Ok(())
    }
}

impl std::fmt::Debug for ChatStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStorage").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::MemorySlotStorage;
    use crate::seed::DEFAULT_SESSION_TITLES;
    use crate::types::ChatMessage;

    fn memory_storage() -> (Arc<MemorySlotStorage>, ChatStorage) {
        let slots = Arc::new(MemorySlotStorage::new());
        let storage = ChatStorage::new(slots.clone());
        (slots, storage)
    }

    #[tokio::test]
    async fn test_empty_slot_seeds_and_persists_defaults() {
        let (slots, storage) = memory_storage();

        let sessions = storage.load_sessions().await;
        assert_eq!(sessions.len(), 3);
        assert!(slots.read(DEFAULT_SLOT_KEY).await.unwrap().is_some());

        let again = storage.load_sessions().await;
        assert_eq!(sessions, again);
    }

    #[tokio::test]
    async fn test_corrupt_slot_falls_back_to_defaults() {
        let slots = Arc::new(MemorySlotStorage::new().with_slot(DEFAULT_SLOT_KEY, "{not json"));
        let storage = ChatStorage::new(slots);

        assert!(storage.try_load_sessions().await.is_err());

        let titles: Vec<_> = storage
            .load_sessions()
            .await
            .iter()
            .map(|s| s.title().to_string())
            .collect();
        assert_eq!(titles, DEFAULT_SESSION_TITLES.to_vec());
    }

    #[tokio::test]
    async fn test_incompatible_shape_falls_back_to_defaults() {
        let slots = Arc::new(
            MemorySlotStorage::new().with_slot(DEFAULT_SLOT_KEY, r#"[{"id":"x","name":"old"}]"#),
        );
        let storage = ChatStorage::new(slots);

        assert_eq!(storage.load_sessions().await.len(), 3);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (_slots, storage) = memory_storage();

        let mut session = ChatSession::new("Round trip");
        session.push(ChatMessage::user("hello"));
        session.push(ChatMessage::assistant("hi there"));
        let sessions = vec![session];

        storage.try_save_sessions(&sessions).await.unwrap();
        assert_eq!(storage.load_sessions().await, sessions);
    }

    #[tokio::test]
    async fn test_empty_collection_is_kept() {
        let slots = Arc::new(MemorySlotStorage::new().with_slot(DEFAULT_SLOT_KEY, "[]"));
        let storage = ChatStorage::new(slots);

        assert!(storage.load_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_slot() {
        let (slots, storage) = memory_storage();
        storage.load_sessions().await;
        storage.clear().await.unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_encoded_timestamps_are_iso8601() {
        let session = ChatSession::new("Encoding");
        let raw = encode_sessions(std::slice::from_ref(&session)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let created = value[0]["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
        assert!(value[0].get("lastActivity").is_some());
    }
}
