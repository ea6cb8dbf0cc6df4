use crate::clock::Clock;
use crate::config::Config;
use crate::error::AppResult;
use crate::message::format_reminder;
use crate::notifier::{Notifier, Outcome};
use crate::reminder::Reminder;
use crate::schedule::{is_due, parse_start_time};
use crate::storage::{load_reminders, save_reminders};
use chrono::{DateTime, FixedOffset};
use log::{info, warn};
use std::fmt;
use std::path::PathBuf;

/// Counters for one pass over the reminder file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl DispatchSummary {
    /// Skips never count against the batch; any failed delivery does.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent: {}, failed: {}, skipped: {}",
            self.sent, self.failed, self.skipped
        )
    }
}

/// Walks the reminder file once, sending whatever is due.
pub struct Dispatcher<N: Notifier> {
    store_path: PathBuf,
    clock: Clock,
    notifier: N,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(config: &Config, notifier: N) -> AppResult<Self> {
        Ok(Self {
            store_path: config.store_path.clone(),
            clock: Clock::new(config.utc_offset_hours)?,
            notifier,
        })
    }

    /// Run one batch against the current time.
    pub fn run(&self) -> AppResult<DispatchSummary> {
        self.run_at(self.clock.now())
    }

    /// Load, dispatch and write back, treating `now` as the current time.
    ///
    /// Only store errors escape; delivery problems end up in the records.
    pub fn run_at(&self, now: DateTime<FixedOffset>) -> AppResult<DispatchSummary> {
        let mut reminders = load_reminders(&self.store_path)?;
        if reminders.is_empty() {
            info!("No reminders in {}", self.store_path.display());
            return Ok(DispatchSummary::default());
        }

        info!(
            "Checking {} reminders at {}",
            reminders.len(),
            now.format("%Y-%m-%d %H:%M:%S")
        );

        let summary = self.dispatch(&mut reminders, now);
        save_reminders(&self.store_path, &reminders)?;
        Ok(summary)
    }

    /// Process every pending reminder in order, mutating the ones that were
    /// sent or failed.
    pub fn dispatch(
        &self,
        reminders: &mut [Reminder],
        now: DateTime<FixedOffset>,
    ) -> DispatchSummary {
        let tz = self.clock.timezone();
        let mut summary = DispatchSummary::default();

        for reminder in reminders.iter_mut() {
            if !reminder.is_pending() {
                continue;
            }

            let scheduled = match parse_start_time(reminder.start_time_text(), tz) {
                Some(t) => t,
                None => {
                    warn!(
                        "{}: unparsable startTime {:?}, leaving pending",
                        reminder,
                        reminder.start_time_text()
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            if !is_due(scheduled, now) {
                summary.skipped += 1;
                continue;
            }

            let message = format_reminder(reminder, now);
            match self.notifier.send(&message) {
                Ok(Outcome::Delivered) => {
                    info!("{}: sent", reminder);
                    reminder.mark_sent(now);
                    summary.sent += 1;
                }
                Ok(Outcome::Rejected(reason)) => {
                    warn!("{}: rejected: {}", reminder, reason);
                    reminder.mark_failed(reason);
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!("{}: send error: {}", reminder, e);
                    reminder.mark_failed(e.to_string());
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::message::Message;
    use crate::notifier::Template;
    use crate::reminder::ReminderStatus;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;

    /// Replays scripted results and records every title it was asked to send.
    #[derive(Default)]
    struct ScriptedNotifier {
        script: RefCell<VecDeque<AppResult<Outcome>>>,
        sent_titles: RefCell<Vec<String>>,
    }

    impl ScriptedNotifier {
        fn with(script: Vec<AppResult<Outcome>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                sent_titles: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.sent_titles.borrow().len()
        }
    }

    impl Notifier for ScriptedNotifier {
        fn send(&self, message: &Message) -> AppResult<Outcome> {
            self.sent_titles.borrow_mut().push(message.title.clone());
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(Outcome::Delivered))
        }
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
            .unwrap()
    }

    fn dispatcher(path: &Path, notifier: ScriptedNotifier) -> Dispatcher<ScriptedNotifier> {
        let config = Config::new(
            Some("tok".to_string()),
            path.to_path_buf(),
            8,
            Template::Markdown,
        )
        .unwrap();
        Dispatcher::new(&config, notifier).unwrap()
    }

    fn write_store(path: &Path, value: Value) {
        fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    fn read_store(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn pending(id: &str, start: &str) -> Value {
        json!({"id": id, "title": id, "content": "c", "startTime": start, "status": "pending"})
    }

    #[test]
    fn test_due_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        write_store(
            &path,
            json!([pending("now", "2024-05-01 09:00"), pending("later", "2024-05-01 09:01")]),
        );

        let d = dispatcher(&path, ScriptedNotifier::default());
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary, DispatchSummary { sent: 1, failed: 0, skipped: 1 });
        let store = read_store(&path);
        assert_eq!(store[0]["status"], "sent");
        assert_eq!(store[0]["sentAt"], "2024-05-01T09:00:00+08:00");
        assert_eq!(store[1]["status"], "pending");
        assert!(store[1].get("sentAt").is_none());
    }

    #[test]
    fn test_second_run_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        write_store(
            &path,
            json!([pending("a", "2024-05-01 08:00"), pending("b", "2024-04-30 20:00:30")]),
        );

        let first = dispatcher(&path, ScriptedNotifier::default());
        assert_eq!(first.run_at(now()).unwrap().sent, 2);

        let second = dispatcher(&path, ScriptedNotifier::default());
        let summary = second.run_at(now()).unwrap();
        assert_eq!(summary, DispatchSummary::default());
        assert_eq!(second.notifier.calls(), 0);
    }

    #[test]
    fn test_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        write_store(
            &path,
            json!([
                pending("one", "2024-05-01 08:00"),
                pending("two", "2024-05-01 08:00"),
                pending("three", "2024-05-01 08:00")
            ]),
        );

        let notifier = ScriptedNotifier::with(vec![
            Ok(Outcome::Delivered),
            Ok(Outcome::Rejected("无效的用户令牌".to_string())),
            Ok(Outcome::Delivered),
        ]);
        let d = dispatcher(&path, notifier);
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary, DispatchSummary { sent: 2, failed: 1, skipped: 0 });
        assert!(!summary.is_success());

        let store = read_store(&path);
        assert_eq!(store[0]["status"], "sent");
        assert_eq!(store[1]["status"], "failed");
        assert_eq!(store[1]["failReason"], "无效的用户令牌");
        assert!(store[1].get("sentAt").is_none());
        assert_eq!(store[2]["status"], "sent");
    }

    #[test]
    fn test_send_error_recorded_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        write_store(&path, json!([pending("a", "2024-05-01 08:00")]));

        let notifier = ScriptedNotifier::with(vec![Err(AppError::network("connection reset"))]);
        let d = dispatcher(&path, notifier);
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary.failed, 1);
        let store = read_store(&path);
        assert_eq!(store[0]["status"], "failed");
        assert_eq!(store[0]["failReason"], "Network error: connection reset");
    }

    #[test]
    fn test_unparsable_start_time_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let bad = json!({"id": "x", "startTime": "not-a-date", "status": "pending", "note": 1});
        let missing = json!({"id": "y", "status": "pending"});
        write_store(&path, json!([bad.clone(), missing.clone()]));

        let d = dispatcher(&path, ScriptedNotifier::default());
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary, DispatchSummary { sent: 0, failed: 0, skipped: 2 });
        assert!(summary.is_success());
        assert_eq!(d.notifier.calls(), 0);
        assert_eq!(read_store(&path), json!([bad, missing]));
    }

    #[test]
    fn test_wrong_typed_records_do_not_block_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let numeric_status = json!({"id": "b", "status": 1});
        let numeric_start = json!({"id": "c", "status": "pending", "startTime": 20240501});
        write_store(
            &path,
            json!([
                {"id": "a", "status": "pending", "startTime": "2000-01-01 00:00"},
                numeric_status.clone(),
                numeric_start.clone()
            ]),
        );

        let d = dispatcher(&path, ScriptedNotifier::default());
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary, DispatchSummary { sent: 1, failed: 0, skipped: 1 });
        assert_eq!(d.notifier.calls(), 1);
        let store = read_store(&path);
        assert_eq!(store[0]["status"], "sent");
        assert_eq!(store[1], numeric_status);
        assert_eq!(store[2], numeric_start);
    }

    #[test]
    fn test_non_pending_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let records = json!([
            {"id": "s", "startTime": "2020-01-01 00:00", "status": "sent", "sentAt": "2020-01-01T00:00:01+08:00"},
            {"id": "f", "startTime": "2020-01-01 00:00", "status": "failed", "failReason": "x"},
            {"id": "n", "startTime": "2020-01-01 00:00"},
            {"id": "o", "startTime": "2020-01-01 00:00", "status": "PENDING"}
        ]);
        write_store(&path, records.clone());

        let d = dispatcher(&path, ScriptedNotifier::default());
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert_eq!(d.notifier.calls(), 0);
        assert_eq!(read_store(&path), records);
    }

    #[test]
    fn test_empty_store_is_success_without_sends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        write_store(&path, json!([]));

        let d = dispatcher(&path, ScriptedNotifier::default());
        let summary = d.run_at(now()).unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert!(summary.is_success());
        assert_eq!(read_store(&path), json!([]));
    }

    #[test]
    fn test_missing_store_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");

        let d = dispatcher(&path, ScriptedNotifier::default());
        assert_eq!(d.run_at(now()).unwrap(), DispatchSummary::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_store_propagates_and_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        fs::write(&path, "{not json").unwrap();

        let d = dispatcher(&path, ScriptedNotifier::default());
        assert!(matches!(d.run_at(now()), Err(AppError::Corrupt(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_order_preserved_and_message_rendered() {
        let mut reminders: Vec<Reminder> = vec![
            Reminder::new("b", "Second", "2024-05-01 08:59"),
            Reminder::new("a", "First", "2024-05-01 07:00"),
        ];
        let d = dispatcher(Path::new("unused.json"), ScriptedNotifier::default());

        let summary = d.dispatch(&mut reminders, now());

        assert_eq!(summary.sent, 2);
        assert_eq!(reminders[0].id_label(), "b");
        assert_eq!(
            *d.notifier.sent_titles.borrow(),
            vec!["⏰ Second".to_string(), "⏰ First".to_string()]
        );
        assert!(reminders
            .iter()
            .all(|r| r.status == Some(ReminderStatus::Sent)));
    }

    #[test]
    fn test_summary_display() {
        let summary = DispatchSummary { sent: 3, failed: 1, skipped: 2 };
        assert_eq!(summary.to_string(), "sent: 3, failed: 1, skipped: 2");
    }
}
