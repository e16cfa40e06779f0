//! JSON extractors that report failures in the API error format

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::error::{ApiError, ApiErrorType};

/// Wrapper around `axum::Json` whose rejections are API errors
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consume the extractor and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

/// JSON body that must also pass `validator` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;

        value.validate().map_err(validation_to_error)?;

        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> ApiError {
    let (status, message) = match rejection {
        JsonRejection::JsonDataError(err) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON data: {}", err.body_text()),
        ),
        JsonRejection::JsonSyntaxError(err) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON syntax: {}", err.body_text()),
        ),
        JsonRejection::MissingJsonContentType(_) => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Missing Content-Type header. Expected 'application/json'.".to_string(),
        ),
        JsonRejection::BytesRejection(err) => (
            rejection.status(),
            format!("Failed to read request body: {}", err.body_text()),
        ),
        _ => (rejection.status(), "Invalid JSON request".to_string()),
    };

    ApiError::new(status, ApiErrorType::InvalidRequestError, message).with_code("json_parse_error")
}

fn validation_to_error(errors: ValidationErrors) -> ApiError {
    let field_errors = errors.field_errors();

    let mut fields: Vec<&str> = field_errors.keys().map(|f| f.as_ref()).collect();
    fields.sort_unstable();

    let message = field_errors
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    let error = ApiError::bad_request(if message.is_empty() {
        "Validation failed".to_string()
    } else {
        message
    })
    .with_code("validation_error");

    match fields.first() {
        Some(field) => error.with_param(*field),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
    }

    async fn plain(Json(body): Json<Named>) -> String {
        body.name
    }

    async fn validated(ValidatedJson(body): ValidatedJson<Named>) -> String {
        body.name
    }

    fn app() -> Router {
        Router::new()
            .route("/plain", post(plain))
            .route("/validated", post(validated))
    }

    async fn post_json(uri: &str, body: &str) -> Response {
        app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let response = post_json("/validated", r#"{"name":"Prod"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let response = post_json("/plain", "{not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let response = post_json("/plain", "{}").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validation_failure() {
        let response = post_json("/validated", r#"{"name":""}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["param"], "name");
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("must not be empty"));
    }

    #[test]
    fn test_json_into_inner() {
        let json = Json(42);
        assert_eq!(json.into_inner(), 42);
    }
}
