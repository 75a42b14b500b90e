//! Publisher identity extraction
//!
//! Authentication is an external collaborator: the auth service in front of
//! this server verifies the bearer credential and forwards the resolved
//! publisher identity in the `X-Publisher` header. This extractor only checks
//! that both pieces are present; it never validates tokens itself.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Resolved publisher identity for the current request.
///
/// Use as a handler argument; rejects with 401 when the identity headers are
/// missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher(pub String);

impl Publisher {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Publisher
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !authorization
            .strip_prefix("Bearer ")
            .is_some_and(|token| !token.trim().is_empty())
        {
            return Err(AppError::Unauthorized(
                "Missing or empty Bearer credential".to_string(),
            ));
        }

        let publisher = parts
            .headers
            .get("x-publisher")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "Publisher identity not resolved (missing X-Publisher header)".to_string(),
                )
            })?;

        Ok(Publisher(publisher.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Publisher, AppError> {
        let (mut parts, _) = req.into_parts();
        Publisher::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_resolves_publisher() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc123")
            .header("X-Publisher", "publisher@example.org")
            .body(())
            .unwrap();

        let publisher = extract(req).await.unwrap();
        assert_eq!(publisher.as_str(), "publisher@example.org");
    }

    #[tokio::test]
    async fn test_rejects_missing_bearer() {
        let req = Request::builder()
            .header("X-Publisher", "publisher@example.org")
            .body(())
            .unwrap();

        assert!(matches!(extract(req).await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_rejects_empty_token() {
        let req = Request::builder()
            .header("Authorization", "Bearer ")
            .header("X-Publisher", "publisher@example.org")
            .body(())
            .unwrap();

        assert!(matches!(extract(req).await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_rejects_unresolved_identity() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc123")
            .body(())
            .unwrap();

        assert!(matches!(extract(req).await, Err(AppError::Unauthorized(_))));
    }
}
