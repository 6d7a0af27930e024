use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Request to the sheet API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous ID: {} candidates", .0.len())]
    AmbiguousId(Vec<(String, String)>), // Vec of (ID, title)

    #[error("Sheet API error: {0}")]
    Transport(String),

    #[error("Unexpected response from the sheet API: {0}")]
    Format(String),

    #[error("{updated} task(s) updated, {failed} rejected")]
    PartialFailure {
        updated: usize,
        failed: usize,
        details: Vec<(String, String)>, // Vec of (ID, reason)
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        CoreError::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }
}
