//! Settings blob and conversation-history types.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use nova_core::{Message, Role};
use serde::{Deserialize, Serialize};

/// Title truncation length (characters)
const TITLE_LEN: usize = 30;
/// Summary truncation length (characters)
const SUMMARY_LEN: usize = 50;

/// Recency bucket a conversation is filed under.
///
/// Ordered by declaration so the bucket mapping renders today first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Today,
    ThisWeek,
    Earlier,
}

impl Category {
    /// Bucket for a conversation dated `date`, relative to `now`.
    ///
    /// Same calendar day wins over the week test; the week window is the
    /// Sunday-to-Saturday range containing `now`.
    pub fn for_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let day = date.date_naive();
        let today = now.date_naive();
        if day == today {
            return Category::Today;
        }

        let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        let week_end = week_start + Duration::days(6);
        if day >= week_start && day <= week_end {
            Category::ThisWeek
        } else {
            Category::Earlier
        }
    }

    /// All buckets in display order
    pub fn all() -> [Category; 3] {
        [Category::Today, Category::ThisWeek, Category::Earlier]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Today => write!(f, "today"),
            Category::ThisWeek => write!(f, "this week"),
            Category::Earlier => write!(f, "earlier"),
        }
    }
}

/// One persisted conversation.
///
/// Never mutated after creation; updating a conversation re-adds the whole
/// item under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub summary: String,
    pub messages: Vec<Message>,
}

impl HistoryItem {
    /// Derive a history record from a completed exchange.
    ///
    /// Returns `None` unless the message list holds at least one complete
    /// user/assistant round trip. Title comes from the first user message,
    /// summary from the last assistant message, both truncated.
    pub fn from_exchange(
        id: impl Into<String>,
        messages: &[Message],
        date: DateTime<Utc>,
    ) -> Option<Self> {
        if messages.len() < 2 {
            return None;
        }
        let first_user = messages.iter().find(|m| m.role == Role::User)?;
        let last_assistant = messages.iter().rev().find(|m| m.role == Role::Assistant)?;

        Some(Self {
            id: id.into(),
            title: truncated(&first_user.content, TITLE_LEN),
            date,
            summary: truncated(&last_assistant.content, SUMMARY_LEN),
            messages: messages.to_vec(),
        })
    }
}

/// First `max` characters of `text`, with `"..."` appended when cut short.
fn truncated(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push_str("...");
    }
    out
}

/// Display theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// The whole persisted state: credentials, preferences, and categorized
/// chat history, written back as one document on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    pub selected_model: String,
    #[serde(default)]
    pub theme: Theme,
    pub chat_history: BTreeMap<Category, Vec<HistoryItem>>,
}

impl Default for Settings {
    fn default() -> Self {
        let chat_history = Category::all()
            .into_iter()
            .map(|c| (c, Vec::new()))
            .collect();
        Self {
            api_key: String::new(),
            selected_model: "Qwen/Qwen2.5-7B-Instruct".to_string(),
            theme: Theme::System,
            chat_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_same_day_is_today() {
        let now = utc(2024, 6, 19); // a Wednesday
        assert_eq!(Category::for_date(now, now), Category::Today);
    }

    #[test]
    fn test_same_week_window_is_sunday_to_saturday() {
        let now = utc(2024, 6, 19); // Wednesday
        assert_eq!(
            Category::for_date(utc(2024, 6, 16), now), // Sunday
            Category::ThisWeek
        );
        assert_eq!(
            Category::for_date(utc(2024, 6, 22), now), // Saturday
            Category::ThisWeek
        );
        assert_eq!(
            Category::for_date(utc(2024, 6, 15), now), // previous Saturday
            Category::Earlier
        );
    }

    #[test]
    fn test_older_dates_are_earlier() {
        let now = utc(2024, 6, 19);
        assert_eq!(Category::for_date(utc(2024, 1, 2), now), Category::Earlier);
    }

    #[test]
    fn test_exchange_derivation_truncates() {
        let user = Message::user("Explain quantum tunneling in detail please");
        let assistant = Message::assistant("a".repeat(80));
        let item =
            HistoryItem::from_exchange("chat-1", &[user, assistant], Utc::now()).unwrap();

        assert_eq!(item.title.chars().count(), 33);
        assert!(item.title.ends_with("..."));
        assert_eq!(item.summary.chars().count(), 53);
        assert!(item.summary.ends_with("..."));
    }

    #[test]
    fn test_short_exchange_is_not_truncated() {
        let user = Message::user("hi");
        let assistant = Message::assistant("Hello");
        let item =
            HistoryItem::from_exchange("chat-1", &[user, assistant], Utc::now()).unwrap();

        assert_eq!(item.title, "hi");
        assert_eq!(item.summary, "Hello");
    }

    #[test]
    fn test_incomplete_exchange_yields_nothing() {
        let only_user = [Message::user("hi"), Message::user("anyone?")];
        assert!(HistoryItem::from_exchange("c", &only_user, Utc::now()).is_none());

        let single = [Message::user("hi")];
        assert!(HistoryItem::from_exchange("c", &single, Utc::now()).is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();

        assert_eq!(back.selected_model, settings.selected_model);
        assert_eq!(back.theme, Theme::System);
        assert_eq!(back.chat_history.len(), 3);
    }
}
