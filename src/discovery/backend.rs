//! Page source abstraction for service discovery.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;

/// One page of services as returned by a backend.
#[derive(Debug, Clone, Default)]
pub struct ServicePage {
    /// Services in backend order.
    pub items: Vec<Service>,
    /// Cursor for the next page. `None` or empty means this was the last one.
    pub continue_token: Option<String>,
}

impl ServicePage {
    /// The continuation token, if another page follows.
    pub fn next_token(&self) -> Option<&str> {
        self.continue_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Failure listing a page.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The continuation token no longer matches cluster state; the scan has
    /// to start over.
    #[error("continuation token expired")]
    Expired,

    /// Any other failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl BackendError {
    /// Wrap an arbitrary error.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::Other(err.into())
    }
}

/// A source of service pages across all namespaces.
///
/// Implementations must be read-only; discovery may call them from several
/// tasks at once.
#[async_trait]
pub trait ServiceBackend: Send + Sync {
    /// Human-readable name for logging (e.g. "kube").
    fn name(&self) -> &'static str;

    /// List one page, resuming from `continue_token` when given.
    async fn list_page(
        &self,
        continue_token: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ServicePage, BackendError>;
}

#[async_trait]
impl<B: ServiceBackend + ?Sized> ServiceBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn list_page(
        &self,
        continue_token: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ServicePage, BackendError> {
        (**self).list_page(continue_token, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_means_last_page() {
        let page = ServicePage {
            items: Vec::new(),
            continue_token: Some(String::new()),
        };
        assert_eq!(page.next_token(), None);
        assert_eq!(ServicePage::default().next_token(), None);

        let page = ServicePage {
            items: Vec::new(),
            continue_token: Some("abc".into()),
        };
        assert_eq!(page.next_token(), Some("abc"));
    }

    #[test]
    fn other_error_keeps_message() {
        let err = BackendError::other("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert!(matches!(err, BackendError::Other(_)));
    }
}
