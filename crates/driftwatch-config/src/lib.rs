pub mod config;
pub mod manager;

pub use config::{
    AssistantConfig, Config, ConfigError, ConfigResult, LogLevel, LoggingConfig, StorageConfig,
    StorageType, UploadConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Driftwatch 配置目录路径
pub fn driftwatch_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".driftwatch"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    driftwatch_dir().map(|dir| dir.join("config.json"))
}

/// 初始化 Driftwatch 目录结构
pub async fn init_driftwatch_dirs() -> ConfigResult<()> {
    if let Some(root) = driftwatch_dir() {
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::create_dir_all(root.join("storage")).await?;
        tokio::fs::create_dir_all(root.join("logs")).await?;
        tokio::fs::create_dir_all(root.join("exports")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driftwatch_dir() {
        let dir = driftwatch_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".driftwatch"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.driftwatch/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with("~"));

        assert_eq!(expand_tilde("/tmp/x"), Some(PathBuf::from("/tmp/x")));
    }
}
