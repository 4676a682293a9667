use std::path::PathBuf;

use thiserror::Error;

use crate::action::ActionName;

#[derive(Debug, Error)]
pub enum CritterError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("call to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("could not open patch {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("review has no identifier: create it first or pass --update <id>")]
    MissingReviewId,

    #[error("action '{0}' has already run; create a new action to retry")]
    ActionAlreadyRun(ActionName),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("cancelled")]
    Cancelled,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CritterError>;
