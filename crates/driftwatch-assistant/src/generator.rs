//! 助手回复生成器
//!
//! [`MockResponder`] 只是从固定模板里随机挑一条并填入随机数，不做任何分析。
//! 接入真实模型时实现 [`ResponseGenerator`] 即可，控制器代码无需改动。

use async_trait::async_trait;
use rand::Rng;

/// 回复元数据中 `resourceCount` 的取值范围
pub const RESOURCE_COUNT_RANGE: std::ops::Range<u32> = 10..60;

/// 回复生成器
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// 生成器标识
    fn id(&self) -> &str;

    /// 根据用户输入生成回复
    async fn generate(&self, input: &str) -> String;

    /// 本次回复声称扫描到的资源数
    fn resource_count(&self) -> u32 {
        rand::rng().random_range(RESOURCE_COUNT_RANGE)
    }
}

/// 模板回复器
#[derive(Debug, Clone)]
pub struct MockResponder {
    region: String,
}

impl MockResponder {
    /// 模板数量
    pub const TEMPLATE_COUNT: usize = 4;

    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// 用给定随机源渲染一条回复
    pub fn render<R: Rng>(&self, rng: &mut R) -> String {
        match rng.random_range(0..Self::TEMPLATE_COUNT) {
            0 => format!(
                "Scanned AWS infrastructure in region {}. Found {} Terraform resources. Analyzing drift...",
                self.region,
                rng.random_range(5..25)
            ),
            1 => format!(
                "Connected to AWS! Found {} S3 buckets and {} EC2 instances. {} drift(s) need review.",
                rng.random_range(3..18),
                rng.random_range(2..12),
                rng.random_range(0..5)
            ),
            2 => format!(
                "Analysis complete! Your infrastructure has {} security warnings and {} cost optimization recommendations.",
                rng.random_range(2..10),
                rng.random_range(5..17)
            ),
            _ => format!(
                "Synced with Terraform state. Found {} unapplied changes and {} drifted resources.",
                rng.random_range(1..7),
                rng.random_range(1..5)
            ),
        }
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new(driftwatch_session::DEFAULT_REGION)
    }
}

#[async_trait]
impl ResponseGenerator for MockResponder {
    fn id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _input: &str) -> String {
        self.render(&mut rand::rng())
    }
}
