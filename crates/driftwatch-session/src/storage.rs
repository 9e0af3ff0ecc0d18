//! # Slot Storage Traits
//!
//! 持久化槽位抽象：一个槽位名对应一段完整替换的文本内容。

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// 键值槽位存储 trait
///
/// 写入总是整体替换，不存在部分写入。
#[async_trait]
pub trait SlotStorage: Send + Sync {
    /// 读取槽位内容，不存在时返回 `None`
    async fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// 写入槽位（完整替换）
    async fn write(&self, key: &str, value: &str) -> StorageResult<()>;

    /// 删除槽位，不存在时视为成功
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// 校验槽位名：非空，仅允许字母、数字、`-`、`_`、`.`，且不能以 `.` 开头
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("terraform-chat-history").is_ok());
        assert!(validate_key("slot_v2.bak").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(".hidden").is_err());
    }
}
