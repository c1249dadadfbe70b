//! Paginated scan with restart-on-expiry.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::backend::{BackendError, ServiceBackend};
use crate::error::{Error, Result};
use crate::model::Service;

/// Options for service discovery.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Page size requested from the backend. Default: backend's choice.
    pub page_size: Option<u32>,
    /// Deadline for the whole scan, restarts included. Default: none.
    pub overall_timeout: Option<Duration>,
}

impl DiscoveryOptions {
    /// Set the page size.
    pub fn page_size(mut self, n: u32) -> Self {
        self.page_size = Some(n);
        self
    }

    /// Set the overall deadline.
    pub fn overall_timeout(mut self, d: Duration) -> Self {
        self.overall_timeout = Some(d);
        self
    }
}

/// Enumerates every service in the cluster and resolves its local ports.
///
/// Discovery is all-or-nothing: a call returns either a complete list taken
/// from a single consistent pass, or an error. It holds no state between
/// calls and may be shared across tasks.
///
/// ```ignore
/// let backend = KubeBackend::try_default().await?;
/// let discovery = ServiceDiscovery::new(backend);
/// for svc in discovery.discover().await? {
///     println!("{}: {:?}", svc.key(), svc.ports);
/// }
/// ```
#[derive(Clone)]
pub struct ServiceDiscovery<B> {
    backend: B,
    options: DiscoveryOptions,
}

impl<B: ServiceBackend> ServiceDiscovery<B> {
    /// Create a discovery client with default options.
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, DiscoveryOptions::default())
    }

    /// Create a discovery client with custom options.
    pub fn with_options(backend: B, options: DiscoveryOptions) -> Self {
        Self { backend, options }
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Discover all services.
    pub async fn discover(&self) -> Result<Vec<Service>> {
        self.discover_with_cancel(std::future::pending()).await
    }

    /// Discover all services, giving up with [`Error::Cancelled`] as soon as
    /// `cancel` completes.
    ///
    /// There is no bound on how many times an expired scan is restarted;
    /// use `cancel` or [`DiscoveryOptions::overall_timeout`] to guarantee
    /// the call returns.
    pub async fn discover_with_cancel<C>(&self, cancel: C) -> Result<Vec<Service>>
    where
        C: Future<Output = ()>,
    {
        let scan = async {
            tokio::select! {
                biased;
                _ = cancel => {
                    debug!(backend = self.backend.name(), "Service discovery cancelled");
                    Err(Error::Cancelled)
                }
                result = self.scan() => result,
            }
        };

        match self.options.overall_timeout {
            Some(limit) => tokio::time::timeout(limit, scan)
                .await
                .unwrap_or(Err(Error::Timeout(limit))),
            None => scan.await,
        }
    }

    async fn scan(&self) -> Result<Vec<Service>> {
        let mut services: Vec<Service> = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;
        let mut restarts = 0usize;

        loop {
            let page = match self
                .backend
                .list_page(token.as_deref(), self.options.page_size)
                .await
            {
                Ok(page) => page,
                Err(BackendError::Expired) => {
                    restarts += 1;
                    warn!(
                        backend = self.backend.name(),
                        restarts,
                        discarded = services.len(),
                        "Continuation token expired, restarting service scan"
                    );
                    services.clear();
                    token = None;
                    // Keep the restart loop cancellable even if the backend
                    // answers without ever suspending.
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(err) => {
                    return Err(Error::backend("failed to retrieve services", err));
                }
            };

            pages += 1;
            services.extend(page.items.iter().map(Service::from_resource));

            match page.next_token() {
                Some(next) => token = Some(next.to_owned()),
                None => break,
            }
        }

        debug!(
            backend = self.backend.name(),
            services = services.len(),
            pages,
            restarts,
            "Service discovery complete"
        );

        Ok(services)
    }
}
