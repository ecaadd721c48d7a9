//! Error types module
//!
//! `BackendError` is what every `AssetBackend` call can fail with. `UploadFailure`
//! classifies the terminal error of a single upload so callers can tell a user
//! cancellation apart from a server rejection or a dropped connection.

/// Message recorded on an item whose upload was aborted by the user.
pub const CANCELLED_MESSAGE: &str = "Upload cancelled by user";

/// Fallback message when the server gives no usable explanation.
pub const GENERIC_UPLOAD_ERROR: &str = "Error uploading file";

const DUPLICATE_FILE_CODE: &str = "duplicate_file";
const DUPLICATE_FILE_MESSAGE: &str = "This file has already been uploaded";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The server answered with a non-success status.
    #[error("API request failed with status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        /// Machine-readable `error` field of the body, if any.
        code: Option<String>,
        /// Human-readable `message` / `detail` field of the body, if any.
        message: Option<String>,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Cannot read local file: {0}")]
    LocalFile(String),
}

impl BackendError {
    pub fn status(status: u16, code: Option<String>, message: Option<String>) -> Self {
        BackendError::Status {
            status,
            code,
            message,
        }
    }
}

/// Terminal failure of one upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadFailure {
    #[error("Upload cancelled by user")]
    Cancelled,

    #[error("{0}")]
    Duplicate(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Error uploading file: {0}")]
    Transport(String),
}

impl UploadFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadFailure::Cancelled)
    }

    /// Message stored on the failed item.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<BackendError> for UploadFailure {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status {
                code: Some(code),
                message,
                ..
            } if code == DUPLICATE_FILE_CODE => UploadFailure::Duplicate(
                message.unwrap_or_else(|| DUPLICATE_FILE_MESSAGE.to_string()),
            ),
            BackendError::Status {
                status, message, ..
            } => UploadFailure::Rejected {
                status,
                message: message.unwrap_or_else(|| GENERIC_UPLOAD_ERROR.to_string()),
            },
            BackendError::Timeout(detail)
            | BackendError::Transport(detail)
            | BackendError::InvalidResponse(detail)
            | BackendError::LocalFile(detail) => UploadFailure::Transport(detail),
        }
    }
}
