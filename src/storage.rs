use crate::error::{AppError, AppResult};
use crate::reminder::Reminder;
use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Load reminders from the JSON array at `path`.
///
/// A missing file or a top-level value that is not an array yields an empty
/// batch. Any other read failure is a storage error. Content that is not
/// JSON, or an element that is not an object, is reported as
/// [`AppError::Corrupt`].
pub fn load_reminders(path: &Path) -> AppResult<Vec<Reminder>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No reminder file at {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(AppError::storage(format!("{}: {}", path.display(), e))),
    };

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| AppError::corrupt(format!("{}: {}", path.display(), e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            warn!(
                "{} does not hold a JSON array (found {}), treating as empty",
                path.display(),
                json_kind(&other)
            );
            return Ok(Vec::new());
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Reminder>(item).map_err(|e| {
                AppError::corrupt(format!("{}: element {}: {}", path.display(), index, e))
            })
        })
        .collect()
}

/// Overwrite `path` with the full reminder array.
///
/// The array is written to a sibling temporary file first and then renamed
/// into place, so readers never observe a half-written file.
pub fn save_reminders(path: &Path, reminders: &[Reminder]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::storage(format!("{}: {}", parent.display(), e)))?;
    }

    let mut content = serde_json::to_string_pretty(reminders)
        .map_err(|e| AppError::storage(e.to_string()))?;
    content.push('\n');

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, content)
        .map_err(|e| AppError::storage(format!("{}: {}", tmp_path.display(), e)))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        AppError::storage(format!("{}: {}", path.display(), e))
    })?;

    debug!("Wrote {} reminders to {}", reminders.len(), path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "reminders.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
