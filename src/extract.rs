use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
};

use crate::error::ApiError;

/// `axum::Json` wrapped so a body that fails to parse rejects through the
/// error envelope as a 400 `Validation` error instead of axum's plain-text
/// response.
#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Login {
        email: String,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_parses() {
        let req = json_request(r#"{"email":"a@b.com"}"#);
        let Json(login) = Json::<Login>::from_request(req, &()).await.unwrap();
        assert_eq!(login.email, "a@b.com");
    }

    #[tokio::test]
    async fn malformed_body_rejects_as_validation() {
        let req = json_request("{not json");
        let err = Json::<Login>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_field_rejects_as_validation() {
        let req = json_request(r#"{"unexpected":1}"#);
        let err = Json::<Login>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn rejection_renders_error_envelope() {
        let req = json_request("{not json");
        let err = Json::<Login>::from_request(req, &()).await.unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "error");
        assert!(!json["message"].as_str().unwrap().is_empty());
    }
}
