use lambda_http::http::StatusCode;
use std::fmt;

/// Failure reported by one of the external store clients.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("token error: {0}")]
    Auth(String),

    #[error("s3 error: {0}")]
    S3(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("injected failure: {0}")]
    Injected(String),
}

/// Which store call was in flight when a `StoreUnavailable` was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Upload,
    Append,
    Read,
    Update,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::Upload => "photo upload",
            StoreOperation::Append => "row append",
            StoreOperation::Read => "row read",
            StoreOperation::Update => "cell update",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    BadPassword,
    MissingReviewer,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::BadPassword => f.write_str("Please enter correct admin password."),
            AuthFailure::MissingReviewer => {
                f.write_str("Please enter your name/email to access Admin Dashboard.")
            }
        }
    }
}

pub const VALIDATION_MESSAGE: &str = "Please fill all fields and take a photo.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("cannot access the request sheet: {0}")]
    Connection(String),

    #[error("Please fill all fields and take a photo.")]
    Validation { missing: Vec<&'static str> },

    #[error("invalid photo: {0}")]
    InvalidPhoto(String),

    #[error("{operation} failed: {reason}")]
    StoreUnavailable {
        operation: StoreOperation,
        reason: String,
    },

    #[error("{0}")]
    Auth(AuthFailure),

    #[error("request {0} not found")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn store(operation: StoreOperation, err: StoreError) -> Self {
        AppError::StoreUnavailable {
            operation,
            reason: err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Connection(_) | AppError::StoreUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Validation { .. } | AppError::InvalidPhoto(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "ConnectionFailure",
            AppError::Validation { .. } => "ValidationFailure",
            AppError::InvalidPhoto(_) => "InvalidPhoto",
            AppError::StoreUnavailable {
                operation: StoreOperation::Upload,
                ..
            } => "UploadFailure",
            AppError::StoreUnavailable {
                operation: StoreOperation::Append,
                ..
            } => "AppendFailure",
            AppError::StoreUnavailable { .. } => "StoreUnavailable",
            AppError::Auth(_) => "AuthFailure",
            AppError::NotFound(_) => "NotFound",
            AppError::BadRequest(_) => "InvalidRequest",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// JSON body sent back to the caller.
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let AppError::Validation { missing } = self {
            body["missing"] = serde_json::json!(missing);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let upload = AppError::store(StoreOperation::Upload, StoreError::S3("boom".into()));
        assert_eq!(upload.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(upload.code(), "UploadFailure");

        let auth = AppError::Auth(AuthFailure::BadPassword);
        assert_eq!(auth.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth.to_string(), "Please enter correct admin password.");

        let internal = AppError::Internal("encode".into());
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.code(), "InternalError");
    }

    #[test]
    fn test_validation_body_lists_missing_fields() {
        let err = AppError::Validation {
            missing: vec!["site", "photo"],
        };
        let body = err.to_body();
        assert_eq!(body["error"], "ValidationFailure");
        assert_eq!(body["message"], VALIDATION_MESSAGE);
        assert_eq!(body["missing"], serde_json::json!(["site", "photo"]));
    }
}
