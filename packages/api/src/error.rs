use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Boundary error for every route handler.
///
/// Upstream failures (connectivity, malformed SQL, pool exhaustion) all
/// collapse into a generic 500 with the detail kept out of the response
/// body; validation failures carry their message to the caller as a 400.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_message: String,
    /// Logged at construction, never serialized.
    detail: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, public_message: impl Into<String>) -> Self {
        Self {
            status,
            public_message: public_message.into(),
            detail: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        let mut err = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        err.detail = Some(msg);
        err
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Not found: {}", msg);
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: &'a str,
        }

        (
            self.status,
            Json(ErrorBody {
                error: &self.public_message,
            }),
        )
            .into_response()
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::internal(format!("Database error: {err}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        // Serialization of our own rows failing is a server bug, not caller input.
        Self::internal(format!("JSON error: {err}"))
    }
}

impl From<std::num::ParseIntError> for ApiError {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::bad_request(format!("Invalid number format: {err}"))
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {} ({})", self.status, self.public_message, detail),
            None => write!(f, "{}: {}", self.status, self.public_message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = ApiError::internal("connection refused on 10.0.0.3:5432");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message, "Internal server error");
        assert_eq!(err.detail.as_deref(), Some("connection refused on 10.0.0.3:5432"));
    }

    #[test]
    fn bad_request_keeps_message_public() {
        let err = ApiError::bad_request("metrics must not be empty");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message, "metrics must not be empty");
    }
}
