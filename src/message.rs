//! Push message bodies.
//!
//! Everything here is pure string building; the send time is passed in.

use crate::config::TITLE_MARKER;
use crate::reminder::Reminder;
use chrono::{DateTime, FixedOffset};

const SEND_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const EMPTY_CHECKLIST_LINE: &str = "- 无待办事项";

/// A rendered push: provider title plus markdown body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

/// Render a due reminder.
pub fn format_reminder(reminder: &Reminder, now: DateTime<FixedOffset>) -> Message {
    let title = format!("{} {}", TITLE_MARKER, reminder.display_title());

    let checklist = if reminder.tasks().is_empty() {
        EMPTY_CHECKLIST_LINE.to_string()
    } else {
        reminder
            .tasks()
            .iter()
            .map(|task| format!("- [ ] {}", task))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let body = format!(
        "## {title}\n\
         \n\
         {content}\n\
         \n\
         ### 📝 待办事项\n\
         \n\
         {checklist}\n\
         \n\
         ---\n\
         \n\
         | 项目 | 详情 |\n\
         |------|------|\n\
         | 提醒 ID | {id} |\n\
         | 计划时间 | {start} |\n\
         | 发送时间 | {sent} ({zone}) |\n",
        title = reminder.display_title(),
        content = reminder.content_text(),
        checklist = checklist,
        id = reminder.id_label(),
        start = reminder.start_time_text(),
        sent = now.format(SEND_TIME_FORMAT),
        zone = zone_label(now),
    );

    Message { title, body }
}

/// Ad-hoc message with a caller-supplied title and content.
pub fn custom_message(title: &str, content: &str, now: DateTime<FixedOffset>) -> Message {
    let body = format!(
        "## {}\n\n{}\n\n---\n\n⏰ 发送时间: {} ({})\n",
        title,
        content,
        now.format(SEND_TIME_FORMAT),
        zone_label(now)
    );
    Message {
        title: title.to_string(),
        body,
    }
}

/// Heartbeat report sent when no custom message is configured.
pub fn daily_report(now: DateTime<FixedOffset>) -> Message {
    let title = format!("📋 每日定时通知 - {}", now.format("%m月%d日"));

    let body = format!(
        "## 🕐 定时任务执行报告\n\
         \n\
         **执行时间**: {time} ({zone})\n\
         \n\
         **任务状态**: ✅ 正常运行\n\
         \n\
         ---\n\
         \n\
         ### 📌 任务信息\n\
         \n\
         | 项目 | 详情 |\n\
         |------|------|\n\
         | 触发方式 | 定时任务 |\n\
         | 程序 | {name} {version} |\n",
        time = now.format(SEND_TIME_FORMAT),
        zone = zone_label(now),
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );

    Message { title, body }
}

fn zone_label(now: DateTime<FixedOffset>) -> String {
    if now.offset().local_minus_utc() == 8 * 3600 {
        "北京时间".to_string()
    } else {
        format!("UTC{}", now.format("%:z"))
    }
}
