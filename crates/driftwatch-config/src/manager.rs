use crate::config::{Config, ConfigError, ConfigResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// 配置管理器
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// 加载配置文件，不存在时写入默认配置
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            let content = tokio::fs::read_to_string(path).await?;
            let content = Self::expand_env_vars(&content)?;
            let config: Config = serde_json::from_str(&content)?;
            Self::validate(&config)?;
            config
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = Config::default();
            // 确保父目录存在
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&default_config)?;
            tokio::fs::write(path, &content).await?;
            default_config
        };

        Ok(Self {
            path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 从默认位置加载配置
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    /// 获取默认配置路径 (~/.driftwatch/config.json)
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// 用已有配置创建管理器
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置的共享引用
    pub fn get(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// 当前配置的快照
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    /// 保存配置到文件
    pub async fn save(&self) -> ConfigResult<()> {
        let config = self.config.read().await;
        let content = serde_json::to_string_pretty(&*config)?;
        drop(config);

        // 确保父目录存在
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 重新加载配置
    pub async fn reload(&self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::InvalidPath(format!(
                "Config file not found: {:?}",
                self.path
            )));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let content = Self::expand_env_vars(&content)?;
        let new_config: Config = serde_json::from_str(&content)?;

        // 验证新配置
        Self::validate(&new_config)?;

        let mut config = self.config.write().await;
        *config = new_config;
        drop(config);

        info!("Config reloaded from {:?}", self.path);
        Ok(())
    }

    /// 更新配置并保存；闭包返回错误时不做任何修改
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.config.write().await;
        let mut updated = config.clone();
        f(&mut updated)?;
        Self::validate(&updated)?;
        *config = updated;
        drop(config);
        self.save().await
    }

    /// 验证配置
    pub fn validate(config: &Config) -> ConfigResult<()> {
        let slot_key = &config.storage.slot_key;
        if slot_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Storage slot_key cannot be empty".to_string(),
            ));
        }

        // 与槽位存储的键名规则一致
        if slot_key.starts_with('.')
            || !slot_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ConfigError::Validation(format!(
                "Storage slot_key may only contain letters, digits, '-', '_' or '.' and must not start with '.': {:?}",
                slot_key
            )));
        }

        if config.storage.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Storage path cannot be empty".to_string(),
            ));
        }

        if config.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one upload extension must be allowed".to_string(),
            ));
        }

        if let Some(ext) = config
            .upload
            .allowed_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(ConfigError::Validation(format!(
                "Upload extension must look like '.ext': {}",
                ext
            )));
        }

        Ok(())
    }

    /// 展开环境变量 ${VAR} 或 ${VAR:-default}
    fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::Validation(format!("Invalid env pattern: {}", e)))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_expr = &cap[1];

            // 处理 ${VAR:-default} 语法
            let (var_name, default_value) = match var_expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr, None),
            };

            let replacement = match std::env::var(var_name) {
                Ok(val) => val,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    None => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
                },
            };

            result = result.replace(full_match, &replacement);
        }

        Ok(result)
    }

    /// 获取配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}
