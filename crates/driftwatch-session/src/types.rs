//! # Driftwatch Session Types
//!
//! 定义聊天会话相关的核心类型：消息、消息元数据与会话。
//!
//! 序列化格式与仪表盘写入持久化槽位的 JSON 保持一致（camelCase 字段，
//! 时间戳为 ISO-8601 字符串，助手消息的 `type` 为 `"ai"`）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 预览文本最大字符数
pub const PREVIEW_LIMIT: usize = 50;

/// 预览被截断时追加的后缀
pub const PREVIEW_ELLIPSIS: &str = "...";

/// 消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
    System,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::User => write!(f, "user"),
            MessageKind::Assistant => write!(f, "assistant"),
            MessageKind::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageKind::User),
            "assistant" | "ai" => Ok(MessageKind::Assistant),
            "system" => Ok(MessageKind::System),
            other => Err(format!("unknown message kind: {}", other)),
        }
    }
}

/// 消息元数据（仅用于展示，不做任何校验）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(rename = "awsRegion", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl MessageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_resource_count(mut self, count: u32) -> Self {
        self.resource_count = Some(count);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// 聊天消息
///
/// 创建后不可修改；只能通过追加进入会话。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// 创建指定类型的消息
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// 创建用户消息
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    /// 创建助手消息
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Assistant, content)
    }

    /// 创建系统消息
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    /// 设置消息ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// 设置创建时间
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// 设置元数据
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// 元数据中的 action 字段
    pub fn action(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.action.as_deref())
    }
}

/// 计算会话预览：超过 [`PREVIEW_LIMIT`] 个字符时截断并追加省略号
pub fn preview_of(content: &str) -> String {
    if content.chars().count() > PREVIEW_LIMIT {
        let mut preview: String = content.chars().take(PREVIEW_LIMIT).collect();
        preview.push_str(PREVIEW_ELLIPSIS);
        preview
    } else {
        content.to_string()
    }
}

/// 聊天会话
///
/// `messages` 只能追加；每次追加都会刷新 `last_activity_at` 与 `preview`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    id: String,
    title: String,
    messages: Vec<ChatMessage>,
    created_at: DateTime<Utc>,
    #[serde(rename = "lastActivity")]
    last_activity_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preview: Option<String>,
}

impl ChatSession {
    /// 创建空会话，ID 形如 `chat-<uuid>`
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("chat-{}", uuid::Uuid::new_v4().simple()),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            last_activity_at: now,
            preview: None,
        }
    }

    /// 用已有数据构造会话（种子数据使用），预览取最后一条消息
    pub fn from_parts(
        id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        last_activity_at: DateTime<Utc>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        let preview = messages.last().map(|m| preview_of(&m.content));
        Self {
            id: id.into(),
            title: title.into(),
            messages,
            created_at,
            last_activity_at,
            preview,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// 获取最后一条消息
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// 会话内是否已存在该消息ID
    pub fn contains_message(&self, message_id: &str) -> bool {
        self.messages.iter().any(|m| m.id == message_id)
    }

    /// 追加消息
    pub fn push(&mut self, message: ChatMessage) {
        self.preview = Some(preview_of(&message.content));
        self.messages.push(message);
        self.last_activity_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_content_kept() {
        assert_eq!(preview_of("hello"), "hello");
        let exact = "y".repeat(PREVIEW_LIMIT);
        assert_eq!(preview_of(&exact), exact);
    }

    #[test]
    fn test_preview_counts_characters() {
        let content = "é".repeat(60);
        let preview = preview_of(&content);
        assert_eq!(preview.chars().count(), PREVIEW_LIMIT + PREVIEW_ELLIPSIS.len());
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_push_updates_preview_and_activity() {
        let mut session = ChatSession::new("Drift review");
        let before = session.last_activity_at();
        assert!(session.preview().is_none());

        session.push(ChatMessage::user("check the vpc"));
        assert_eq!(session.preview(), Some("check the vpc"));
        assert_eq!(session.message_count(), 1);
        assert!(session.last_activity_at() >= before);
    }

    #[test]
    fn test_message_kind_wire_names() {
        let msg = ChatMessage::assistant("done");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ai");
        assert!(json.get("timestamp").is_some());
        assert!(json.get("metadata").is_none());

        let parsed: MessageKind = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(parsed, MessageKind::Assistant);
    }

    #[test]
    fn test_metadata_camel_case() {
        let meta = MessageMetadata::new()
            .with_region("us-east-1")
            .with_resource_count(3);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["awsRegion"], "us-east-1");
        assert_eq!(json["resourceCount"], 3);
        assert!(json.get("action").is_none());
    }

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!("AI".parse::<MessageKind>().unwrap(), MessageKind::Assistant);
        assert_eq!("system".parse::<MessageKind>().unwrap(), MessageKind::System);
        assert!("bot".parse::<MessageKind>().is_err());
    }
}
