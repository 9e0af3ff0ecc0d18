//! # Chat Store
//!
//! 会话集合的唯一持有者。内存中的集合是运行期间的数据来源，
//! 每次变更后整体写回持久化槽位（尽力而为，失败只记录日志）。
//!
//! 存储本身不跟踪"当前会话"，那是调用方（界面层）的状态。

use tracing::{debug, info, warn};

use crate::chat_storage::ChatStorage;
use crate::error::{StorageError, StorageResult};
use crate::seed::{DEFAULT_REGION, READY_GREETING};
use crate::types::{ChatMessage, ChatSession, MessageMetadata};

/// 聊天会话存储
#[derive(Debug)]
pub struct ChatStore {
    storage: ChatStorage,
    sessions: Vec<ChatSession>,
}

impl ChatStore {
    /// 从持久化槽位加载会话集合
    pub async fn open(storage: ChatStorage) -> Self {
        let sessions = storage.load_sessions().await;
        info!(
            "ChatStore opened with {} sessions (slot {})",
            sessions.len(),
            storage.key()
        );
        Self { storage, sessions }
    }

    /// 所有会话（存储顺序）
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// 按ID获取会话
    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id() == session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).is_some()
    }

    /// 第一个会话
    pub fn first(&self) -> Option<&ChatSession> {
        self.sessions.first()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn storage(&self) -> &ChatStorage {
        &self.storage
    }

    fn position(&self, session_id: &str) -> StorageResult<usize> {
        self.sessions
            .iter()
            .position(|s| s.id() == session_id)
            .ok_or_else(|| StorageError::session_not_found(session_id))
    }

    async fn persist(&self) {
        self.storage.save_sessions(&self.sessions).await;
    }

    /// 追加消息到会话
    pub async fn append_message(
        &mut self,
        session_id: &str,
        message: ChatMessage,
    ) -> StorageResult<&ChatSession> {
        let index = self.position(session_id)?;

        if self.sessions[index].contains_message(&message.id) {
            return Err(StorageError::MessageAlreadyExists {
                session_id: session_id.to_string(),
                message_id: message.id,
            });
        }

        debug!(
            "Appending {} message {} to session {}",
            message.kind, message.id, session_id
        );
        self.sessions[index].push(message);
        self.persist().await;

        Ok(&self.sessions[index])
    }

    /// 创建新会话并放在集合最前面
    pub async fn create_session(&mut self, title: impl Into<String>) -> ChatSession {
        let mut session = ChatSession::new(title);
        while self.contains(session.id()) {
            session = ChatSession::new(session.title().to_string());
        }

        session.push(
            ChatMessage::system(READY_GREETING)
                .with_metadata(MessageMetadata::new().with_region(DEFAULT_REGION)),
        );

        self.sessions.insert(0, session.clone());
        self.persist().await;

        info!("Created chat session: {} ({})", session.id(), session.title());
        session
    }

    /// 删除会话
    ///
    /// 只剩一个会话时拒绝删除，集合保持不变。
    pub async fn delete_session(&mut self, session_id: &str) -> StorageResult<ChatSession> {
        let index = self.position(session_id)?;

        if self.sessions.len() <= 1 {
            warn!("Refusing to delete the last chat session: {}", session_id);
            return Err(StorageError::LastSessionRequired {
                id: session_id.to_string(),
            });
        }

        let removed = self.sessions.remove(index);
        self.persist().await;

        info!("Deleted chat session: {} ({})", removed.id(), removed.title());
        Ok(removed)
    }

    /// 重新从槽位加载，丢弃内存中的集合
    pub async fn reload(&mut self) {
        self.sessions = self.storage.load_sessions().await;
        debug!("Reloaded {} chat sessions", self.sessions.len());
    }
}
