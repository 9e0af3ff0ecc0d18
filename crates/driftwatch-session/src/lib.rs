//! # Driftwatch Session Storage
//!
//! Terraform drift 助手的聊天会话存储。
//!
//! ## 功能特性
//!
//! - **会话与消息模型**：消息只追加，会话预览随追加刷新
//! - **持久化槽位**：整个会话集合以 JSON 数组写入一个命名槽位
//! - **默认种子数据**：槽位不存在或无法解析时生成三个示例会话
//! - **历史浏览**：关键词/时间/类型过滤、消息统计
//! - **会话导出**：导出为独立 JSON 文件
//!
//! ## 存储结构
//!
//! ```text
//! <base_path>/
//! └── terraform-chat-history.json   # 会话集合（JSON 数组）
//! ```
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use driftwatch_session::{ChatMessage, ChatStorage, ChatStore, FileSlotStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let slots = Arc::new(FileSlotStorage::new("~/.driftwatch/storage").await?);
//!     let mut store = ChatStore::open(ChatStorage::new(slots)).await;
//!
//!     let session = store.create_session("VPC drift").await;
//!     store
//!         .append_message(session.id(), ChatMessage::user("Any drift in us-east-1?"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod chat_storage;
pub mod error;
pub mod export;
pub mod file_storage;
pub mod history;
pub mod memory_storage;
pub mod seed;
pub mod storage;
pub mod store;
pub mod types;

// 重新导出主要类型
pub use chat_storage::{decode_sessions, encode_sessions, ChatStorage, DEFAULT_SLOT_KEY};
pub use error::{StorageError, StorageResult};
pub use export::{export_file_name, export_session, ChatExport};
pub use file_storage::FileSlotStorage;
pub use history::{format_time_ago, DateFilter, HistoryFilter, SessionStats, FILE_UPLOAD_ACTION};
pub use memory_storage::MemorySlotStorage;
pub use seed::{default_sessions, DEFAULT_REGION, DEFAULT_SESSION_TITLES, READY_GREETING};
pub use storage::SlotStorage;
pub use store::ChatStore;
pub use types::{
    preview_of, ChatMessage, ChatSession, MessageKind, MessageMetadata, PREVIEW_LIMIT,
};

/// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
