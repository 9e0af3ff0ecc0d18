//! # Chat History
//!
//! 历史浏览：按关键词、时间范围过滤会话，按类型过滤会话内消息，以及消息统计。

use chrono::{DateTime, Duration, Utc};

use crate::types::{ChatMessage, ChatSession, MessageKind};

/// 文件上传消息的 action 标记
pub const FILE_UPLOAD_ACTION: &str = "file_upload";

/// 时间范围过滤（作用于最后活动时间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    /// 与当前时间同一天（UTC）
    Today,
    /// 最近 7 天
    Week,
    /// 最近 30 天
    Month,
}

impl DateFilter {
    pub fn matches(&self, time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::Today => time.date_naive() == now.date_naive(),
            DateFilter::Week => time >= now - Duration::days(7),
            DateFilter::Month => time >= now - Duration::days(30),
        }
    }
}

impl std::str::FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(DateFilter::All),
            "today" => Ok(DateFilter::Today),
            "week" => Ok(DateFilter::Week),
            "month" => Ok(DateFilter::Month),
            other => Err(format!("unknown date filter: {}", other)),
        }
    }
}

/// 历史查询过滤器
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// 关键词（不区分大小写）
    pub search: Option<String>,
    /// 时间范围
    pub date: DateFilter,
    /// 消息类型，`None` 表示全部
    pub kind: Option<MessageKind>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置关键词，空白关键词等同于不过滤
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term.to_lowercase())
        };
        self
    }

    pub fn with_date(mut self, date: DateFilter) -> Self {
        self.date = date;
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// 会话是否匹配：标题或任意消息内容包含关键词，且最后活动时间在范围内
    pub fn matches_session(&self, session: &ChatSession, now: DateTime<Utc>) -> bool {
        let matches_search = match self.search {
            Some(ref term) => {
                session.title().to_lowercase().contains(term)
                    || session
                        .messages()
                        .iter()
                        .any(|m| m.content.to_lowercase().contains(term))
            }
            None => true,
        };

        matches_search && self.date.matches(session.last_activity_at(), now)
    }

    /// 消息是否匹配：类型一致，且（设置关键词时）内容包含关键词
    pub fn matches_message(&self, message: &ChatMessage) -> bool {
        let matches_kind = self.kind.map(|k| message.kind == k).unwrap_or(true);
        let matches_search = self
            .search
            .as_ref()
            .map(|term| message.content.to_lowercase().contains(term))
            .unwrap_or(true);

        matches_kind && matches_search
    }

    /// 过滤会话，按最后活动时间从新到旧排列
    pub fn filter_sessions<'a>(
        &self,
        sessions: &'a [ChatSession],
        now: DateTime<Utc>,
    ) -> Vec<&'a ChatSession> {
        let mut matched: Vec<_> = sessions
            .iter()
            .filter(|s| self.matches_session(s, now))
            .collect();
        matched.sort_by(|a, b| b.last_activity_at().cmp(&a.last_activity_at()));
        matched
    }

    /// 过滤会话内的消息
    pub fn filter_messages<'a>(&self, session: &'a ChatSession) -> Vec<&'a ChatMessage> {
        session
            .messages()
            .iter()
            .filter(|m| self.matches_message(m))
            .collect()
    }
}

/// 会话消息统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
    pub system: usize,
    pub file_uploads: usize,
}

impl SessionStats {
    pub fn of(session: &ChatSession) -> Self {
        session
            .messages()
            .iter()
            .fold(Self::default(), |mut stats, message| {
                stats.total += 1;
                match message.kind {
                    MessageKind::User => stats.user += 1,
                    MessageKind::Assistant => stats.assistant += 1,
                    MessageKind::System => stats.system += 1,
                }
                if message.action() == Some(FILE_UPLOAD_ACTION) {
                    stats.file_uploads += 1;
                }
                stats
            })
    }
}

/// 相对时间描述："Just now"、"5m ago"、"3h ago"、"2d ago"
pub fn format_time_ago(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(time).num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_sessions_at;
    use crate::types::MessageMetadata;

    #[test]
    fn test_search_matches_title_or_content() {
        let now = Utc::now();
        let sessions = default_sessions_at(now);

        let by_title = HistoryFilter::new().with_search("s3 BUCKET");
        let ids: Vec<_> = by_title
            .filter_sessions(&sessions, now)
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec!["chat-2"]);

        let by_content = HistoryFilter::new().with_search("t3.large");
        let ids: Vec<_> = by_content
            .filter_sessions(&sessions, now)
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec!["chat-3"]);
    }

    #[test]
    fn test_filter_sessions_most_recent_first() {
        let mut sessions = default_sessions_at(Utc::now() - Duration::hours(1));
        let ids: Vec<_> = HistoryFilter::new()
            .filter_sessions(&sessions, Utc::now())
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec!["chat-1", "chat-2", "chat-3"]);

        sessions[2].push(ChatMessage::user("Any new drift on the EC2 fleet?"));

        let ids: Vec<_> = HistoryFilter::new()
            .filter_sessions(&sessions, Utc::now())
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec!["chat-3", "chat-1", "chat-2"]);
    }

    #[test]
    fn test_blank_search_matches_everything() {
        let now = Utc::now();
        let sessions = default_sessions_at(now);
        let filter = HistoryFilter::new().with_search("   ");
        assert_eq!(filter.filter_sessions(&sessions, now).len(), 3);
    }

    #[test]
    fn test_date_filters() {
        let now = Utc::now();
        let sessions = default_sessions_at(now);

        let today = HistoryFilter::new().with_date(DateFilter::Today);
        assert!(today.matches_session(&sessions[0], now));
        assert!(!today.matches_session(&sessions[2], now));

        let week = HistoryFilter::new().with_date(DateFilter::Week);
        assert_eq!(week.filter_sessions(&sessions, now).len(), 3);

        let later = now + Duration::days(10);
        assert!(week.filter_sessions(&sessions, later).is_empty());
        let month = HistoryFilter::new().with_date(DateFilter::Month);
        assert_eq!(month.filter_sessions(&sessions, later).len(), 3);
    }

    #[test]
    fn test_message_kind_filter() {
        let sessions = default_sessions_at(Utc::now());
        let filter = HistoryFilter::new().with_kind(MessageKind::Assistant);
        let messages = filter.filter_messages(&sessions[1]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "3");

        let filter = HistoryFilter::new()
            .with_kind(MessageKind::User)
            .with_search("production");
        assert_eq!(filter.filter_messages(&sessions[1]).len(), 1);
        let filter = filter.with_search("encryption");
        assert!(filter.filter_messages(&sessions[1]).is_empty());
    }

    #[test]
    fn test_session_stats() {
        let mut session = default_sessions_at(Utc::now()).remove(1);
        session.push(
            ChatMessage::system("📁 Uploaded 1 file(s): main.tf")
                .with_metadata(MessageMetadata::new().with_action(FILE_UPLOAD_ACTION)),
        );

        let stats = SessionStats::of(&session);
        assert_eq!(
            stats,
            SessionStats {
                total: 4,
                user: 1,
                assistant: 1,
                system: 2,
                file_uploads: 1,
            }
        );
    }

    #[test]
    fn test_format_time_ago() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now, now), "Just now");
        assert_eq!(format_time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_time_ago(now - Duration::minutes(125), now), "2h ago");
        assert_eq!(format_time_ago(now - Duration::days(3), now), "3d ago");
    }

    #[test]
    fn test_date_filter_from_str() {
        assert_eq!("Week".parse::<DateFilter>().unwrap(), DateFilter::Week);
        assert!("year".parse::<DateFilter>().is_err());
    }
}
