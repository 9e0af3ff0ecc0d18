//! # FileSlotStorage Implementation
//!
//! 基于本地文件的槽位存储，每个槽位对应一个 JSON 文件。
//!
//! 存储结构:
//! ```text
//! <base_path>/
//! ├── terraform-chat-history.json   # 槽位内容
//! └── ...
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::storage::{validate_key, SlotStorage};

/// 文件槽位存储
#[derive(Debug, Clone)]
pub struct FileSlotStorage {
    base_path: PathBuf,
}

impl FileSlotStorage {
    /// 创建存储并确保目录存在，路径支持 `~` 展开
    pub async fn new(base_path: impl AsRef<Path>) -> StorageResult<Self> {
        let base_path_str = base_path.as_ref().to_string_lossy().to_string();
        let base_path = shellexpand::tilde(&base_path_str);
        let base_path = PathBuf::from(base_path.as_ref());

        fs::create_dir_all(&base_path).await?;

        info!("FileSlotStorage initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    /// 存储根目录
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 获取槽位文件路径
    fn slot_file_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SlotStorage for FileSlotStorage {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        let path = self.slot_file_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        debug!("Read slot {} ({} bytes)", key, content.len());
        Ok(Some(content))
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.slot_file_path(key);
        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));

        // 先写临时文件再重命名，保证槽位内容整体替换
        fs::write(&tmp_path, value).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Wrote slot {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.slot_file_path(key);
        if path.exists() {
            fs::remove_file(&path).await?;
            debug!("Removed slot {}", key);
        }
        Ok(())
    }
}
