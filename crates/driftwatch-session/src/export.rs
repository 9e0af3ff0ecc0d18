//! 会话导出为独立的 JSON 文档。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::StorageResult;
use crate::types::{ChatSession, MessageKind, MessageMetadata};

/// 导出文件名后缀
pub const EXPORT_FILE_SUFFIX: &str = "_chat_export.json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMessage<'a> {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: &'a str,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a MessageMetadata>,
}

/// 导出文档
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport<'a> {
    pub title: &'a str,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: usize,
    pub messages: Vec<ExportedMessage<'a>>,
}

impl<'a> ChatExport<'a> {
    pub fn from_session(session: &'a ChatSession) -> Self {
        Self {
            title: session.title(),
            created_at: session.created_at(),
            last_activity: session.last_activity_at(),
            message_count: session.message_count(),
            messages: session
                .messages()
                .iter()
                .map(|m| ExportedMessage {
                    kind: m.kind,
                    content: &m.content,
                    timestamp: m.created_at,
                    metadata: m.metadata.as_ref(),
                })
                .collect(),
        }
    }

    /// 格式化为缩进的 JSON
    pub fn to_json_pretty(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 导出文件名：标题中非 ASCII 字母数字的字符替换为 `_`
pub fn export_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}", stem, EXPORT_FILE_SUFFIX)
}

/// 导出会话到目录，返回写入的文件路径
pub async fn export_session(session: &ChatSession, dir: &Path) -> StorageResult<PathBuf> {
    let content = ChatExport::from_session(session).to_json_pretty()?;
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(export_file_name(session.title()));
    tokio::fs::write(&path, content).await?;

    info!("Exported session {} to {:?}", session.id(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_sessions;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("S3 Bucket Security Review"),
            "S3_Bucket_Security_Review_chat_export.json"
        );
        assert_eq!(export_file_name("Đà/Lạt"), "___L_t_chat_export.json");
    }

    #[test]
    fn test_export_document_shape() {
        let sessions = default_sessions();
        let export = ChatExport::from_session(&sessions[1]);
        let value: serde_json::Value =
            serde_json::from_str(&export.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["title"], "S3 Bucket Security Review");
        assert_eq!(value["messageCount"], 3);
        assert_eq!(value["messages"][2]["type"], "ai");
        assert_eq!(value["messages"][2]["metadata"]["resourceCount"], 3);
        assert!(value["messages"][0].get("metadata").is_none());
        assert!(value["messages"][0].get("id").is_none());
    }

    #[tokio::test]
    async fn test_export_session_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let sessions = default_sessions();

        let path = export_session(&sessions[2], temp_dir.path()).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "Cost_Optimization_Analysis_chat_export.json"
        );
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"lastActivity\""));
    }
}
