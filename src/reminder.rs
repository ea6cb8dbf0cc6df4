use crate::config::DEFAULT_TITLE;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle state of a reminder. Values other than the three known ones are
/// kept verbatim so they survive a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
    Other(String),
}

impl From<String> for ReminderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => ReminderStatus::Pending,
            "sent" => ReminderStatus::Sent,
            "failed" => ReminderStatus::Failed,
            _ => ReminderStatus::Other(value),
        }
    }
}

impl From<ReminderStatus> for String {
    fn from(status: ReminderStatus) -> Self {
        match status {
            ReminderStatus::Pending => "pending".to_string(),
            ReminderStatus::Sent => "sent".to_string(),
            ReminderStatus::Failed => "failed".to_string(),
            ReminderStatus::Other(s) => s,
        }
    }
}

/// One element of the reminder file.
///
/// Every field is optional on disk; defaults are applied by the accessors
/// rather than written back. A known key holding `null` or a value of the
/// wrong JSON type is not taken into its field; it stays in `extra` together
/// with the keys this type does not know, and is serialized unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct Reminder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReminderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const KEY_STATUS: &str = "status";
const KEY_SENT_AT: &str = "sentAt";
const KEY_FAIL_REASON: &str = "failReason";

/// Remove `key` when `accept` takes its value; otherwise leave it in place.
fn take<T>(
    map: &mut Map<String, Value>,
    key: &str,
    accept: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let taken = map.get(key).and_then(accept);
    if taken.is_some() {
        map.remove(key);
    }
    taken
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(String::from)
}

impl From<Map<String, Value>> for Reminder {
    fn from(mut map: Map<String, Value>) -> Self {
        let id = take(&mut map, "id", |v| (!v.is_null()).then(|| v.clone()));
        let title = take(&mut map, "title", as_string);
        let content = take(&mut map, "content", as_string);
        let task_items = take(&mut map, "taskItems", |v| {
            v.as_array()?
                .iter()
                .map(as_string)
                .collect::<Option<Vec<_>>>()
        });
        let start_time = take(&mut map, "startTime", as_string);
        let status = take(&mut map, KEY_STATUS, as_string).map(ReminderStatus::from);
        let sent_at = take(&mut map, KEY_SENT_AT, as_string);
        let fail_reason = take(&mut map, KEY_FAIL_REASON, as_string);

        Self {
            id,
            title,
            content,
            task_items,
            start_time,
            status,
            sent_at,
            fail_reason,
            extra: map,
        }
    }
}

impl Reminder {
    pub fn new<S: Into<String>>(id: S, title: S, start_time: S) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            title: Some(title.into()),
            start_time: Some(start_time.into()),
            status: Some(ReminderStatus::Pending),
            ..Default::default()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == Some(ReminderStatus::Pending)
    }

    /// Title, falling back to [`DEFAULT_TITLE`] when absent or blank.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => DEFAULT_TITLE,
        }
    }

    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn tasks(&self) -> &[String] {
        self.task_items.as_deref().unwrap_or(&[])
    }

    pub fn start_time_text(&self) -> &str {
        self.start_time.as_deref().unwrap_or("")
    }

    /// The id as shown to humans: strings unquoted, anything else as JSON.
    pub fn id_label(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        }
    }

    pub fn mark_sent(&mut self, at: DateTime<FixedOffset>) {
        self.extra.remove(KEY_STATUS);
        self.extra.remove(KEY_SENT_AT);
        self.status = Some(ReminderStatus::Sent);
        self.sent_at = Some(at.to_rfc3339_opts(SecondsFormat::Secs, false));
    }

    pub fn mark_failed<S: Into<String>>(&mut self, reason: S) {
        self.extra.remove(KEY_STATUS);
        self.extra.remove(KEY_FAIL_REASON);
        self.status = Some(ReminderStatus::Failed);
        self.fail_reason = Some(reason.into());
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id_label(), self.display_title())
    }
}
