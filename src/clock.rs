use crate::error::{AppError, AppResult};
use chrono::{DateTime, FixedOffset, Utc};

/// Wall clock pinned to a fixed UTC offset. No DST, no zone database.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    offset: FixedOffset,
}

impl Clock {
    pub fn new(offset_hours: i32) -> AppResult<Self> {
        let offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::config(format!("invalid UTC offset: {} hours", offset_hours))
            })?;
        Ok(Self { offset })
    }

    pub fn timezone(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}
