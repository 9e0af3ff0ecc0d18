//! # Driftwatch Assistant
//!
//! 聊天助手控制器：维护当前会话，并模拟助手回复、文件上传和 AWS 连接。
//!
//! 回复内容来自 [`ResponseGenerator`]，默认的 [`MockResponder`] 只做模板填充。

pub mod controller;
pub mod error;
pub mod generator;
pub mod settings;

pub use controller::{
    default_chat_title, ChatController, Exchange, UploadOutcome, CONNECTED_RESOURCE_COUNT,
    SCAN_ACTION,
};
pub use error::{AssistantError, AssistantResult};
pub use generator::{MockResponder, ResponseGenerator, RESOURCE_COUNT_RANGE};
pub use settings::AssistantSettings;
