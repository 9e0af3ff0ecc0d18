//! 助手控制器
//!
//! 持有会话存储、当前会话和回复生成器，把用户操作翻译为对 [`ChatStore`] 的调用。

use std::fmt;
use std::sync::Arc;

use driftwatch_observability::create_session_span;
use driftwatch_session::{
    ChatMessage, ChatSession, ChatStore, MessageMetadata, FILE_UPLOAD_ACTION,
};
use tracing::{debug, info, Instrument};

use crate::error::{AssistantError, AssistantResult};
use crate::generator::ResponseGenerator;
use crate::settings::AssistantSettings;

/// 助手回复的 action 元数据
pub const SCAN_ACTION: &str = "terraform_scan";

/// 连接 AWS 后报告的资源数
pub const CONNECTED_RESOURCE_COUNT: u32 = 45;

/// 默认会话标题，`n` 为创建后的会话数
pub fn default_chat_title(n: usize) -> String {
    format!("Infrastructure Chat {}", n)
}

/// 一次对话往返
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: ChatMessage,
    pub reply: ChatMessage,
}

/// 上传结果
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// 写入会话的系统消息
    pub message: ChatMessage,
}

pub struct ChatController {
    store: ChatStore,
    current_session_id: String,
    generator: Arc<dyn ResponseGenerator>,
    settings: AssistantSettings,
}

impl fmt::Debug for ChatController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatController")
            .field("sessions", &self.store.len())
            .field("current_session_id", &self.current_session_id)
            .field("generator", &self.generator.id())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatController {
    /// 打开控制器，当前会话为集合中的第一个
    ///
    /// 集合为空时先创建一个会话。
    pub async fn open(
        mut store: ChatStore,
        generator: Arc<dyn ResponseGenerator>,
        settings: AssistantSettings,
    ) -> Self {
        let current_session_id = match store.first() {
            Some(session) => session.id().to_string(),
            None => {
                info!("Chat store is empty, creating an initial session");
                store
                    .create_session(default_chat_title(1))
                    .await
                    .id()
                    .to_string()
            }
        };

        info!(
            "Assistant ready with {} sessions, current: {} (generator: {})",
            store.len(),
            current_session_id,
            generator.id()
        );

        Self {
            store,
            current_session_id,
            generator,
            settings,
        }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn sessions(&self) -> &[ChatSession] {
        self.store.sessions()
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn current_session_id(&self) -> &str {
        &self.current_session_id
    }

    pub fn current_session(&self) -> AssistantResult<&ChatSession> {
        self.store
            .get(&self.current_session_id)
            .ok_or(AssistantError::NoActiveSession)
    }

    /// 新建会话并切换过去
    pub async fn new_chat(&mut self, title: Option<String>) -> ChatSession {
        let title = match title {
            Some(title) if !title.trim().is_empty() => title,
            _ => default_chat_title(self.store.len() + 1),
        };

        let session = self.store.create_session(title).await;
        self.current_session_id = session.id().to_string();
        session
    }

    /// 切换当前会话
    pub fn switch_to(&mut self, session_id: &str) -> AssistantResult<&ChatSession> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| driftwatch_session::StorageError::session_not_found(session_id))?;

        debug!("Switched to chat session {}", session_id);
        self.current_session_id = session.id().to_string();
        Ok(session)
    }

    /// 删除会话；删除当前会话时切换到剩余的第一个
    pub async fn delete_chat(&mut self, session_id: &str) -> AssistantResult<ChatSession> {
        let removed = self.store.delete_session(session_id).await?;

        if removed.id() == self.current_session_id {
            if let Some(first) = self.store.first() {
                self.current_session_id = first.id().to_string();
                debug!("Current chat deleted, switched to {}", self.current_session_id);
            }
        }

        Ok(removed)
    }

    /// 发送消息并等待助手回复
    ///
    /// 只有空白的输入被拒绝；其余内容原样保存。
    pub async fn send_message(&mut self, text: &str) -> AssistantResult<Exchange> {
        if text.trim().is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let session_id = self.current_session_id.clone();
        let span = create_session_span(&session_id);
        self.exchange(&session_id, text).instrument(span).await
    }

    async fn exchange(&mut self, session_id: &str, text: &str) -> AssistantResult<Exchange> {
        let question = ChatMessage::user(text);
        self.store.append_message(session_id, question.clone()).await?;

        tokio::time::sleep(self.settings.reply_delay).await;

        let content = self.generator.generate(text).await;
        let reply = ChatMessage::assistant(content).with_metadata(
            MessageMetadata::new()
                .with_region(self.settings.region.as_str())
                .with_resource_count(self.generator.resource_count())
                .with_action(SCAN_ACTION),
        );
        self.store.append_message(session_id, reply.clone()).await?;

        debug!("Assistant replied with message {}", reply.id);
        Ok(Exchange { question, reply })
    }

    /// 上传文件，只接受允许的扩展名
    ///
    /// 没有任何合法文件时拒绝，会话保持不变。
    pub async fn upload_files<I, S>(&mut self, file_names: I) -> AssistantResult<UploadOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (accepted, rejected): (Vec<String>, Vec<String>) = file_names
            .into_iter()
            .map(Into::<String>::into)
            .partition(|name| self.settings.accepts_file(name));

        if accepted.is_empty() {
            return Err(AssistantError::NoValidFiles {
                allowed: self.settings.allowed_extensions.join(", "),
            });
        }

        let message = ChatMessage::system(format!(
            "📁 Uploaded {} file(s): {}",
            accepted.len(),
            accepted.join(", ")
        ))
        .with_metadata(MessageMetadata::new().with_action(FILE_UPLOAD_ACTION));

        let session_id = self.current_session_id.clone();
        self.store
            .append_message(&session_id, message.clone())
            .instrument(create_session_span(&session_id))
            .await?;

        info!(
            "Uploaded {} file(s) to {}, rejected {}",
            accepted.len(),
            session_id,
            rejected.len()
        );

        Ok(UploadOutcome {
            accepted,
            rejected,
            message,
        })
    }

    /// 模拟连接 AWS 账户
    pub async fn connect_aws(&mut self) -> AssistantResult<ChatMessage> {
        let session_id = self.current_session_id.clone();
        let span = create_session_span(&session_id);
        self.announce_connection(&session_id).instrument(span).await
    }

    async fn announce_connection(&mut self, session_id: &str) -> AssistantResult<ChatMessage> {
        tokio::time::sleep(self.settings.connect_delay).await;

        let message = ChatMessage::system(format!(
            "✅ Connected to AWS Account ({}). Syncing Terraform state...",
            self.settings.account_id
        ))
        .with_metadata(
            MessageMetadata::new()
                .with_region(self.settings.region.as_str())
                .with_resource_count(CONNECTED_RESOURCE_COUNT),
        );
        self.store.append_message(session_id, message.clone()).await?;

        info!("Connected to AWS account {}", self.settings.account_id);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use driftwatch_session::{
        ChatStorage, MemorySlotStorage, MessageKind, StorageError, DEFAULT_SLOT_KEY,
    };

    struct EchoResponder;

    #[async_trait]
    impl ResponseGenerator for EchoResponder {
        fn id(&self) -> &str {
            "echo"
        }

        async fn generate(&self, input: &str) -> String {
            format!("echo: {}", input)
        }

        fn resource_count(&self) -> u32 {
            12
        }
    }

    async fn controller_with(slots: MemorySlotStorage) -> ChatController {
        let store = ChatStore::open(ChatStorage::new(Arc::new(slots))).await;
        ChatController::open(
            store,
            Arc::new(EchoResponder),
            AssistantSettings::immediate(),
        )
        .await
    }

    async fn seeded_controller() -> ChatController {
        controller_with(MemorySlotStorage::new()).await
    }

    #[tokio::test]
    async fn test_open_selects_first_session() {
        let controller = seeded_controller().await;
        assert_eq!(controller.current_session_id(), "chat-1");
        assert_eq!(controller.sessions().len(), 3);
    }

    #[tokio::test]
    async fn test_open_empty_store_creates_session() {
        let controller =
            controller_with(MemorySlotStorage::new().with_slot(DEFAULT_SLOT_KEY, "[]")).await;

        assert_eq!(controller.sessions().len(), 1);
        let current = controller.current_session().unwrap();
        assert_eq!(current.title(), "Infrastructure Chat 1");
        assert_eq!(current.messages()[0].kind, MessageKind::System);
    }

    #[tokio::test]
    async fn test_send_message_appends_question_and_reply() {
        let mut controller = seeded_controller().await;

        let exchange = controller.send_message("any drift?").await.unwrap();
        assert_eq!(exchange.question.content, "any drift?");
        assert_eq!(exchange.reply.content, "echo: any drift?");
        assert_eq!(exchange.reply.kind, MessageKind::Assistant);

        let metadata = exchange.reply.metadata.as_ref().unwrap();
        assert_eq!(metadata.region.as_deref(), Some("us-east-1"));
        assert_eq!(metadata.resource_count, Some(12));
        assert_eq!(metadata.action.as_deref(), Some(SCAN_ACTION));

        let session = controller.current_session().unwrap();
        assert_eq!(session.message_count(), 3);
        assert_eq!(session.preview(), Some("echo: any drift?"));
    }

    #[tokio::test]
    async fn test_send_message_keeps_text_verbatim() {
        let mut controller = seeded_controller().await;

        let text = "  terraform plan\n  -target=aws_s3_bucket.logs ";
        let exchange = controller.send_message(text).await.unwrap();
        assert_eq!(exchange.question.content, text);

        let session = controller.current_session().unwrap();
        assert_eq!(session.messages()[1].content, text);
    }

    #[tokio::test]
    async fn test_send_blank_message_is_rejected() {
        let mut controller = seeded_controller().await;
        let before = controller.current_session().unwrap().message_count();

        let err = controller.send_message("   ").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyMessage));
        assert_eq!(controller.current_session().unwrap().message_count(), before);
    }

    #[tokio::test]
    async fn test_new_chat_becomes_current() {
        let mut controller = seeded_controller().await;

        let session = controller.new_chat(None).await;
        assert_eq!(session.title(), "Infrastructure Chat 4");
        assert_eq!(controller.current_session_id(), session.id());
        assert_eq!(controller.sessions()[0].id(), session.id());

        let named = controller.new_chat(Some("Staging VPC".to_string())).await;
        assert_eq!(named.title(), "Staging VPC");
        assert_eq!(controller.current_session_id(), named.id());
    }

    #[tokio::test]
    async fn test_switch_to_unknown_session() {
        let mut controller = seeded_controller().await;

        assert_eq!(controller.switch_to("chat-2").unwrap().id(), "chat-2");
        assert_eq!(controller.current_session_id(), "chat-2");

        let err = controller.switch_to("chat-404").unwrap_err();
        assert!(matches!(
            err,
            AssistantError::Storage(StorageError::SessionNotFound { .. })
        ));
        assert_eq!(controller.current_session_id(), "chat-2");
    }

    #[tokio::test]
    async fn test_delete_current_switches_to_first_remaining() {
        let mut controller = seeded_controller().await;
        controller.switch_to("chat-2").unwrap();

        controller.delete_chat("chat-2").await.unwrap();
        assert_eq!(controller.current_session_id(), "chat-1");

        controller.delete_chat("chat-1").await.unwrap();
        assert_eq!(controller.current_session_id(), "chat-3");

        let err = controller.delete_chat("chat-3").await.unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(controller.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_other_keeps_current() {
        let mut controller = seeded_controller().await;
        controller.delete_chat("chat-3").await.unwrap();
        assert_eq!(controller.current_session_id(), "chat-1");
    }

    #[tokio::test]
    async fn test_upload_files_partitions_names() {
        let mut controller = seeded_controller().await;

        let outcome = controller
            .upload_files(["main.tf", "notes.txt", "prod.TFPLAN"])
            .await
            .unwrap();

        assert_eq!(outcome.accepted, vec!["main.tf", "prod.TFPLAN"]);
        assert_eq!(outcome.rejected, vec!["notes.txt"]);
        assert_eq!(
            outcome.message.content,
            "📁 Uploaded 2 file(s): main.tf, prod.TFPLAN"
        );
        assert_eq!(outcome.message.action(), Some(FILE_UPLOAD_ACTION));

        let last = controller.current_session().unwrap().last_message().unwrap();
        assert_eq!(last.id, outcome.message.id);
    }

    #[tokio::test]
    async fn test_upload_without_valid_files_changes_nothing() {
        let mut controller = seeded_controller().await;
        let before = controller.current_session().unwrap().clone();

        let err = controller
            .upload_files(vec!["notes.txt".to_string(), "Makefile".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::NoValidFiles { .. }));
        let after = controller.current_session().unwrap();
        assert_eq!(after.message_count(), before.message_count());
        assert_eq!(after.last_activity_at(), before.last_activity_at());
    }

    #[tokio::test]
    async fn test_connect_aws_appends_system_message() {
        let mut controller = seeded_controller().await;

        let message = controller.connect_aws().await.unwrap();
        assert_eq!(message.kind, MessageKind::System);
        assert!(message.content.contains("123456789012"));

        let metadata = message.metadata.as_ref().unwrap();
        assert_eq!(metadata.resource_count, Some(CONNECTED_RESOURCE_COUNT));
        assert_eq!(metadata.region.as_deref(), Some("us-east-1"));
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let slots = Arc::new(MemorySlotStorage::new());
        let store = ChatStore::open(ChatStorage::new(slots.clone())).await;
        let mut controller =
            ChatController::open(store, Arc::new(EchoResponder), AssistantSettings::immediate())
                .await;
        controller.send_message("hello").await.unwrap();

        let reopened = ChatStore::open(ChatStorage::new(slots)).await;
        let session = reopened.get("chat-1").unwrap();
        assert_eq!(session.message_count(), 3);
        assert_eq!(session.last_message().unwrap().content, "echo: hello");
    }
}
