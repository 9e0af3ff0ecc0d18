//! # Seed Data
//!
//! 首次运行（或槽位不可读）时使用的三个示例会话。时间戳相对于传入的 `now`。

use chrono::{DateTime, Duration, Utc};

use crate::types::{ChatMessage, ChatSession, MessageMetadata};

/// 新会话的第一条系统消息
pub const READY_GREETING: &str =
    "AI Assistant is ready. Upload Terraform files or ask about your infrastructure.";

pub const DEFAULT_REGION: &str = "us-east-1";

/// 默认会话标题（按存储顺序）
pub const DEFAULT_SESSION_TITLES: [&str; 3] = [
    "AWS Infrastructure Analysis",
    "S3 Bucket Security Review",
    "Cost Optimization Analysis",
];

/// 以当前时间生成默认会话
pub fn default_sessions() -> Vec<ChatSession> {
    default_sessions_at(Utc::now())
}

/// 以指定时间生成默认会话
pub fn default_sessions_at(now: DateTime<Utc>) -> Vec<ChatSession> {
    let two_hours_ago = now - Duration::hours(2);
    let one_day_ago = now - Duration::hours(24);
    let twenty_three_hours_ago = now - Duration::hours(23);
    let three_days_ago = now - Duration::days(3);

    let aws_analysis = ChatSession::from_parts(
        "chat-1",
        DEFAULT_SESSION_TITLES[0],
        two_hours_ago,
        now,
        vec![ChatMessage::system(
            "AI Assistant connected to AWS successfully. Ready to analyze your Terraform infrastructure.",
        )
        .with_id("1")
        .with_created_at(now)
        .with_metadata(MessageMetadata::new().with_region(DEFAULT_REGION))],
    );

    let s3_review = ChatSession::from_parts(
        "chat-2",
        DEFAULT_SESSION_TITLES[1],
        one_day_ago,
        twenty_three_hours_ago,
        vec![
            ChatMessage::system("Starting S3 bucket security analysis...")
                .with_id("1")
                .with_created_at(one_day_ago),
            ChatMessage::user("Check the security configuration of the production S3 bucket")
                .with_id("2")
                .with_created_at(twenty_three_hours_ago),
            ChatMessage::assistant(
                "Found 3 S3 buckets whose security configuration needs attention. Bucket 'app-storage' has no encryption, bucket 'logs-backup' allows public read access.",
            )
            .with_id("3")
            .with_created_at(twenty_three_hours_ago)
            .with_metadata(
                MessageMetadata::new()
                    .with_region(DEFAULT_REGION)
                    .with_resource_count(3),
            ),
        ],
    );

    let cost_analysis = ChatSession::from_parts(
        "chat-3",
        DEFAULT_SESSION_TITLES[2],
        three_days_ago,
        three_days_ago,
        vec![
            ChatMessage::system("Starting cost optimization analysis...")
                .with_id("1")
                .with_created_at(three_days_ago),
            ChatMessage::user("Analyze EC2 instance costs and suggest optimizations")
                .with_id("2")
                .with_created_at(three_days_ago),
            ChatMessage::assistant(
                "Found 5 EC2 instances that can be downsized to save 30% in cost. Instance i-1234567 runs t3.large but CPU usage is only 15%.",
            )
            .with_id("3")
            .with_created_at(three_days_ago)
            .with_metadata(
                MessageMetadata::new()
                    .with_region("us-west-2")
                    .with_resource_count(12),
            ),
        ],
    );

    vec![aws_analysis, s3_review, cost_analysis]
}
