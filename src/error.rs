use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("model daemon did not answer after {attempts} attempts")]
    DaemonUnreachable { attempts: u32 },

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("model daemon returned {status}: {message}")]
    Daemon { status: u16, message: String },

    #[error("failed to pull model '{model}': {reason}")]
    Pull { model: String, reason: String },

    #[error("model daemon exited: {0}")]
    DaemonExited(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid run mode: {0}")]
    InvalidMode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ModelNotFound(_) => StatusCode::NOT_FOUND,
            Error::Daemon { .. }
            | Error::Http(_)
            | Error::DaemonUnreachable { .. }
            | Error::Pull { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned alongside every non-2xx status.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
