use std::time::Duration;

use driftwatch_config::Config;

/// 助手运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    /// 模拟回复延迟
    pub reply_delay: Duration,
    /// 模拟 AWS 连接延迟
    pub connect_delay: Duration,
    pub region: String,
    pub account_id: String,
    /// 允许上传的扩展名（含前导点，小写）
    pub allowed_extensions: Vec<String>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AssistantSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reply_delay: Duration::from_millis(config.assistant.reply_delay_ms),
            connect_delay: Duration::from_millis(config.assistant.connect_delay_ms),
            region: config.assistant.region.clone(),
            account_id: config.assistant.account_id.clone(),
            allowed_extensions: config
                .upload
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        }
    }

    /// 不等待的设置，用于测试和脚本
    pub fn immediate() -> Self {
        Self {
            reply_delay: Duration::ZERO,
            connect_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// 文件名是否带有允许的扩展名
    ///
    /// 扩展名取最后一个 `.` 起的部分，不区分大小写；没有 `.` 的文件名总是被拒绝。
    pub fn accepts_file(&self, file_name: &str) -> bool {
        match file_name.rfind('.') {
            Some(index) => {
                let ext = file_name[index..].to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let settings = AssistantSettings::default();
        assert_eq!(settings.reply_delay, Duration::from_millis(2000));
        assert_eq!(settings.connect_delay, Duration::from_millis(3000));
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.account_id, "123456789012");

        let immediate = AssistantSettings::immediate();
        assert_eq!(immediate.reply_delay, Duration::ZERO);
        assert_eq!(immediate.region, settings.region);
    }

    #[test]
    fn test_accepts_file() {
        let settings = AssistantSettings::default();

        assert!(settings.accepts_file("main.tf"));
        assert!(settings.accepts_file("prod.TFPLAN"));
        assert!(settings.accepts_file("terraform.tfstate"));
        assert!(settings.accepts_file("plan.out.json"));
        assert!(settings.accepts_file(".tf"));

        assert!(!settings.accepts_file("README.md"));
        assert!(!settings.accepts_file("main.tf.bak"));
        assert!(!settings.accepts_file("Makefile"));
        assert!(!settings.accepts_file("tf"));
    }

    #[test]
    fn test_custom_extensions_are_case_insensitive() {
        let mut config = Config::default();
        config.upload.allowed_extensions = vec![".HCL".to_string()];

        let settings = AssistantSettings::from_config(&config);
        assert!(settings.accepts_file("vars.hcl"));
        assert!(!settings.accepts_file("main.tf"));
    }
}
