use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lectern::errors::RagError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const ENV_PREFIX: &str = "LECTERN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets the dotted configuration key, e.g.
/// `completion.endpoint` -> `LECTERN_COMPLETION__ENDPOINT`
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "{}_{}",
        ENV_PREFIX,
        field_path.replace('.', "__").to_uppercase()
    )
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed request, rendered as HTTP 500 with an `{error}` body
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
