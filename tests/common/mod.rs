#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube_expose::{BackendError, ServiceBackend, ServicePage};

/// Build a cluster `Service` resource.
pub fn kube_service(
    namespace: &str,
    name: &str,
    ports: &[(&str, i32)],
    annotations: &[(&str, &str)],
) -> Service {
    let annotations: BTreeMap<String, String> = annotations
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Service {
        metadata: ObjectMeta {
            name: Some(name.into()),
            namespace: Some(namespace.into()),
            annotations: (!annotations.is_empty()).then_some(annotations),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(
                ports
                    .iter()
                    .map(|(port_name, port)| ServicePort {
                        name: Some(port_name.to_string()),
                        port: *port,
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build `count` single-port services named `{prefix}-{i}`.
pub fn services(prefix: &str, count: usize) -> Vec<Service> {
    (0..count)
        .map(|i| kube_service("default", &format!("{prefix}-{i}"), &[("http", 80)], &[]))
        .collect()
}

/// Injected failure for a page request.
#[derive(Debug, Clone)]
pub enum Failure {
    Expired,
    Other(&'static str),
}

/// In-memory paginated backend.
///
/// Page `i` is requested with token `page-{i}` (page 0 with no token). The
/// last page answers with an empty token.
pub struct ScriptedBackend {
    pages: Vec<Vec<Service>>,
    failures: Mutex<VecDeque<(usize, Failure)>>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedBackend {
    pub fn new(pages: Vec<Vec<Service>>) -> Self {
        Self {
            pages,
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next request for page `page` once.
    pub fn fail_once(self, page: usize, failure: Failure) -> Self {
        self.failures.lock().unwrap().push_back((page, failure));
        self
    }

    /// Page indices requested so far, in order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn list_page(
        &self,
        continue_token: Option<&str>,
        _limit: Option<u32>,
    ) -> Result<ServicePage, BackendError> {
        let index = match continue_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|i| i.parse().ok())
                .ok_or_else(|| BackendError::other(format!("unknown token {token}")))?,
        };
        self.calls.lock().unwrap().push(index);

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(pos) = failures.iter().position(|(page, _)| *page == index) {
                let (_, failure) = failures.remove(pos).unwrap();
                return Err(match failure {
                    Failure::Expired => BackendError::Expired,
                    Failure::Other(msg) => BackendError::other(msg),
                });
            }
        }

        let items = self.pages.get(index).cloned().unwrap_or_default();
        let continue_token = if index + 1 < self.pages.len() {
            Some(format!("page-{}", index + 1))
        } else {
            Some(String::new())
        };

        Ok(ServicePage {
            items,
            continue_token,
        })
    }
}

/// Backend that never answers.
pub struct HangingBackend;

#[async_trait]
impl ServiceBackend for HangingBackend {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn list_page(
        &self,
        _continue_token: Option<&str>,
        _limit: Option<u32>,
    ) -> Result<ServicePage, BackendError> {
        std::future::pending().await
    }
}

/// Backend whose tokens always expire after the first page.
pub struct AlwaysExpiring {
    calls: Mutex<usize>,
}

impl AlwaysExpiring {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ServiceBackend for AlwaysExpiring {
    fn name(&self) -> &'static str {
        "always-expiring"
    }

    async fn list_page(
        &self,
        continue_token: Option<&str>,
        _limit: Option<u32>,
    ) -> Result<ServicePage, BackendError> {
        *self.calls.lock().unwrap() += 1;
        match continue_token {
            None => Ok(ServicePage {
                items: services("svc", 1),
                continue_token: Some("next".into()),
            }),
            Some(_) => Err(BackendError::Expired),
        }
    }
}
