//! Discovered services and their resolved ports.

use k8s_openapi::api::core::v1::Service as KubeService;
use kube::ResourceExt;
use tracing::warn;

use crate::remap::{resolve_ports, DeclaredPort};

/// A service running in the cluster that can be exposed locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service name.
    pub name: String,
    /// Namespace the service lives in.
    pub namespace: String,
    /// Ports in declared order.
    pub ports: Vec<ServicePort>,
}

/// A port exposed by a remote service and the local port it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServicePort {
    /// Port declared on the service.
    pub remote_port: u16,
    /// Port to bind locally. Equals `remote_port` unless remapped; never 0.
    pub local_port: u16,
}

impl Service {
    /// Build a service record from a cluster resource, applying port remap
    /// annotations.
    pub fn from_resource(resource: &KubeService) -> Self {
        let name = resource.metadata.name.clone().unwrap_or_default();
        let namespace = resource.namespace().unwrap_or_default();

        let declared: Vec<DeclaredPort> = resource
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .filter_map(|p| match u16::try_from(p.port) {
                        Ok(port) if port != 0 => {
                            Some(DeclaredPort::new(p.name.clone().unwrap_or_default(), port))
                        }
                        _ => {
                            warn!(
                                service = %name,
                                namespace = %namespace,
                                port = p.port,
                                "Skipping service port outside the valid range"
                            );
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let ports = resolve_ports(&declared, resource.annotations());

        Self {
            name,
            namespace,
            ports,
        }
    }

    /// `namespace/name`, for logging.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ServicePort as KubeServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    use crate::remap::REMAP_ANNOTATION_PREFIX;

    fn kube_service(ports: Vec<(Option<&str>, i32)>, annotations: &[(&str, &str)]) -> KubeService {
        KubeService {
            metadata: ObjectMeta {
                name: Some("web".into()),
                namespace: Some("default".into()),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                ports: Some(
                    ports
                        .into_iter()
                        .map(|(name, port)| KubeServicePort {
                            name: name.map(String::from),
                            port,
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn copies_identity_and_remaps_ports() {
        let key = format!("{REMAP_ANNOTATION_PREFIX}http");
        let svc = Service::from_resource(&kube_service(
            vec![(Some("http"), 80), (Some("grpc"), 9000)],
            &[(key.as_str(), "8080")],
        ));

        assert_eq!(svc.name, "web");
        assert_eq!(svc.namespace, "default");
        assert_eq!(svc.key(), "default/web");
        assert_eq!(
            svc.ports,
            vec![
                ServicePort {
                    remote_port: 80,
                    local_port: 8080
                },
                ServicePort {
                    remote_port: 9000,
                    local_port: 9000
                },
            ]
        );
    }

    #[test]
    fn missing_spec_yields_no_ports() {
        let mut resource = kube_service(vec![], &[]);
        resource.spec = None;
        assert!(Service::from_resource(&resource).ports.is_empty());
    }

    #[test]
    fn out_of_range_ports_are_skipped() {
        let svc = Service::from_resource(&kube_service(
            vec![(None, 0), (None, 70000), (None, 443)],
            &[],
        ));
        assert_eq!(
            svc.ports,
            vec![ServicePort {
                remote_port: 443,
                local_port: 443
            }]
        );
    }
}
