//! 内存槽位存储，用于测试和不需要落盘的运行方式。

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StorageResult;
use crate::storage::{validate_key, SlotStorage};

#[derive(Debug, Default)]
pub struct MemorySlotStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个槽位内容
    pub fn with_slot(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.write().insert(key.into(), value.into());
        self
    }

    /// 当前槽位数量
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[async_trait]
impl SlotStorage for MemorySlotStorage {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.slots.read().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.slots.write().remove(key);
        Ok(())
    }
}
