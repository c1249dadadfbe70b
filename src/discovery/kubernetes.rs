//! Kubernetes API server backend.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::trace;

use super::backend::{BackendError, ServiceBackend, ServicePage};

/// Lists `Service` resources across all namespaces.
#[derive(Clone)]
pub struct KubeBackend {
    api: Api<Service>,
}

impl KubeBackend {
    /// Create a backend using an existing client.
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    /// Create a backend from the inferred kubeconfig or in-cluster config.
    pub async fn try_default() -> crate::Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ServiceBackend for KubeBackend {
    fn name(&self) -> &'static str {
        "kube"
    }

    async fn list_page(
        &self,
        continue_token: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ServicePage, BackendError> {
        let mut params = ListParams::default();
        if let Some(token) = continue_token {
            params = params.continue_token(token);
        }
        if let Some(limit) = limit {
            params = params.limit(limit);
        }

        let list = self.api.list(&params).await.map_err(classify)?;
        trace!(items = list.items.len(), "Listed service page");

        Ok(ServicePage {
            continue_token: list.metadata.continue_,
            items: list.items,
        })
    }
}

/// Map a client error onto the discovery taxonomy.
///
/// The API server answers a stale `continue` with 410 Gone and reason
/// `Expired`.
pub(crate) fn classify(err: kube::Error) -> BackendError {
    match &err {
        kube::Error::Api(resp) if resp.code == 410 || resp.reason == "Expired" => {
            BackendError::Expired
        }
        _ => BackendError::other(err),
    }
}
