use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Attribute access method is neither `from_headers` nor `from_environment`
    #[error("Invalid attribute access method: {0}")]
    InvalidAttributeSource(String),

    /// Requested attribute names were not given as a list of strings
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No valid Shibboleth session (redirect to the SP login handler)
    #[error("Shibboleth login required: {redirect_url}")]
    LoginRequired { redirect_url: String },
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::LoginRequired { redirect_url } => {
                // Not an error, just a redirect
                return found(redirect_url);
            }
            AuthError::InvalidAttributeSource(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_configuration")
            }
            AuthError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
        };

        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// A `302 Found` response pointing at `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
