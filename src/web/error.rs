use std::collections::BTreeMap;

use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    error::log_error,
    model::{DatabaseError, ResourceType},
    utils::uploads::UploadError,
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceLocked: {resource_type:?}")]
    ResourceLocked { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}. {reason}")]
    ResourceConflict {
        resource_type: ResourceType,
        reason: String,
    },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ValidationInvalidFields: {0}")]
    ValidationInvalidFields(#[from] validator::ValidationErrors),

    #[error("ValidationMalformedBody: {0}")]
    ValidationMalformedBody(String),

    #[error("ValidationBadRequest: {0}")]
    ValidationBadRequest(String),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceLocked { .. } => StatusCode::FORBIDDEN,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceLocked { .. } => {
                String::from("Resource error, resource is locked until previous steps are done.")
            }
            Self::ResourceConflict { reason, .. } => format!("Resource error, conflict: {reason}"),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
        }
    }
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ValidationInvalidFields(_) => String::from("Validation error, invalid fields."),
            Self::ValidationMalformedBody(_) => String::from("Validation error, malformed body."),
            Self::ValidationBadRequest(msg) => format!("Validation error, {msg}"),
        }
    }

    /// Field name -> messages, only for field-level failures.
    pub fn fields(&self) -> Option<BTreeMap<String, Vec<String>>> {
        let Self::ValidationInvalidFields(errors) = self else {
            return None;
        };

        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Some(fields)
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("UploadError - {0}")]
    UploadError(#[from] UploadError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_locked(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceLocked {
            resource_type: r#type,
        })
    }

    pub fn resource_conflict<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    /// Maps repository failures: ownership to 403, unique violations to 409, rest to 500.
    pub fn from_database(r#type: ResourceType, error: DatabaseError) -> Self {
        if let DatabaseError::Forbidden = error {
            return Self::resource_forbidden(r#type);
        }
        if error.is_unique_violation() {
            return Self::resource_conflict(r#type, "resource already exists");
        }
        if error.is_foreign_key_violation() {
            return Self::resource_conflict(r#type, "resource is still referenced");
        }
        Self::resource_fetch_error(r#type, error)
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(ValidationError::ValidationBadRequest(msg.into()))
    }

    pub fn malformed_body<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(ValidationError::ValidationMalformedBody(msg.into()))
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ValidationError(e) => e.status_code(),
            Self::UploadError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ValidationError(e) => e.client_display(),
            Self::UploadError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();
        let fields = match &self {
            Self::ValidationError(e) => e.fields(),
            _ => None,
        };

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
            fields,
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            WebError::resource_locked(ResourceType::Lesson).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WebError::resource_conflict(ResourceType::Enrollment, "dup").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(WebError::auth_required().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(WebError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebError::from_database(ResourceType::Cohort, DatabaseError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn validation_errors_expose_fields() {
        let errors = Probe { name: "ab".into() }.validate().unwrap_err();
        let err = ValidationError::from(errors);
        let fields = err.fields().unwrap();
        assert_eq!(fields["name"], vec!["too short".to_string()]);
    }
}
