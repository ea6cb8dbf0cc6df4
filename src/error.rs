use std::fmt;

/// Error types surfaced by the dispatcher.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Missing or invalid process configuration
    Config(String),
    /// Reading or writing the reminder file failed
    Storage(String),
    /// The reminder file exists but its content cannot be read as reminders
    Corrupt(String),
    /// Transport failure talking to the push provider
    Network(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Corrupt(msg) => write!(f, "Corrupt store: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Convenience constructors
impl AppError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AppError::Config(msg.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        AppError::Storage(msg.into())
    }

    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        AppError::Corrupt(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        AppError::Network(msg.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
