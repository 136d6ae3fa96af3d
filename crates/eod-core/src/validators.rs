//! Collaborator-boundary services
//!
//! Checks that need the outside world run here, before a poll is built and
//! never under an instance lock. Neither service touches game state.

use crate::error::GameError;
use async_trait::async_trait;
use eod_model::{ImageUrl, PayloadError, UserId};
use futures::future::join_all;
use indexmap::IndexSet;
use std::time::Duration;

/// Confirms an image link points at a supported image
#[async_trait]
pub trait ImageValidator: Send + Sync {
    /// Validate `raw` and return it as an [`ImageUrl`]
    ///
    /// # Errors
    /// - `GameError::InvalidPayload` for a malformed link or wrong content type
    /// - `GameError::ImageCheck` if the resource cannot be reached
    async fn verify(&self, raw: &str) -> Result<ImageUrl, GameError>;
}

/// Turns raw platform ids into confirmed accounts
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Whether `id` is a real account
    async fn exists(&self, id: UserId) -> bool;
}

/// [`ImageValidator`] issuing an HTTP HEAD request
#[derive(Debug, Clone)]
pub struct HttpImageValidator {
    client: reqwest::Client,
}

impl HttpImageValidator {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a validator with the default timeout
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Create a validator with a custom timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("eod/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpImageValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageValidator for HttpImageValidator {
    async fn verify(&self, raw: &str) -> Result<ImageUrl, GameError> {
        let url = ImageUrl::parse(raw)?;
        let response = self
            .client
            .head(url.as_str())
            .send()
            .await
            .map_err(|e| GameError::ImageCheck(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        check_head_response(status, content_type)?;
        tracing::debug!(url = %url, status, "image link verified");
        Ok(url)
    }
}

/// Judge a HEAD response: 2xx with a supported image content type
///
/// # Errors
/// `GameError::ImageCheck` for a non-2xx status, otherwise
/// `PayloadError::UnsupportedContentType`
pub fn check_head_response(status: u16, content_type: Option<&str>) -> Result<(), GameError> {
    if !(200..300).contains(&status) {
        return Err(GameError::ImageCheck(format!("HTTP {status}")));
    }
    let content_type = content_type.unwrap_or_default();
    if ImageUrl::is_supported_content_type(content_type) {
        Ok(())
    } else {
        Err(PayloadError::UnsupportedContentType(content_type.to_string()).into())
    }
}

/// Confirm every raw id, keeping first-seen order and dropping repeats
///
/// Lookups run concurrently.
///
/// # Errors
/// `PayloadError::UnknownUser` naming the first id that does not resolve
pub async fn resolve_collaborators(
    resolver: &dyn IdentityResolver,
    raw: &[u64],
) -> Result<Vec<UserId>, GameError> {
    let ids: IndexSet<UserId> = raw.iter().copied().map(UserId).collect();
    let checks = join_all(ids.iter().map(|id| resolver.exists(*id))).await;
    if let Some((id, _)) = ids.iter().zip(&checks).find(|(_, ok)| !**ok) {
        return Err(PayloadError::UnknownUser(id.get()).into());
    }
    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Known(HashSet<u64>);

    #[async_trait]
    impl IdentityResolver for Known {
        async fn exists(&self, id: UserId) -> bool {
            self.0.contains(&id.get())
        }
    }

    #[test]
    fn head_response_rules() {
        assert!(check_head_response(200, Some("image/png")).is_ok());
        assert!(check_head_response(204, Some("image/jpeg; charset=binary")).is_ok());
        assert!(matches!(
            check_head_response(404, Some("image/png")),
            Err(GameError::ImageCheck(_))
        ));
        assert!(matches!(
            check_head_response(200, Some("text/html")),
            Err(GameError::InvalidPayload(PayloadError::UnsupportedContentType(_)))
        ));
        assert!(check_head_response(200, None).is_err());
    }

    #[tokio::test]
    async fn collaborators_resolved_in_order() {
        let resolver = Known([1, 2, 3].into_iter().collect());
        let ids = resolve_collaborators(&resolver, &[3, 1, 3]).await.unwrap();
        assert_eq!(ids, vec![UserId(3), UserId(1)]);
    }

    #[tokio::test]
    async fn unknown_collaborator_rejected() {
        let resolver = Known([1].into_iter().collect());
        let err = resolve_collaborators(&resolver, &[1, 5]).await.unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidPayload(PayloadError::UnknownUser(5))
        ));
    }

    #[tokio::test]
    async fn malformed_link_rejected_before_request() {
        let validator = HttpImageValidator::new();
        let err = validator.verify("not a url").await.unwrap_err();
        assert!(matches!(err, GameError::InvalidPayload(_)));
    }
}
