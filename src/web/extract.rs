//! Body extractors.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::{WebError, error::ValidationError};

/// JSON body that is deserialized and then checked with [`Validate`].
///
/// Unparseable bodies are reported as malformed, rule violations come back
/// with per-field messages. Both are 400.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| WebError::malformed_body(rejection.body_text()))?;

        value.validate().map_err(ValidationError::from)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod test {
    use axum::{body::Body, http::StatusCode};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(probe) = ValidatedJson::<Probe>::from_request(request(r#"{"name":"a"}"#), &())
            .await
            .unwrap();
        assert_eq!(probe.name, "a");
    }

    #[tokio::test]
    async fn rule_violations_are_bad_request_with_fields() {
        let err = ValidatedJson::<Probe>::from_request(request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, WebError::ValidationError(ValidationError::ValidationInvalidFields(_))));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = ValidatedJson::<Probe>::from_request(request("{nope"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, WebError::ValidationError(ValidationError::ValidationMalformedBody(_))));
    }
}
