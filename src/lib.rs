//! Kubernetes service discovery with annotation-driven local port remapping,
//! and a streaming gRPC contract for exposing discovered services locally.

#![deny(missing_docs)]

pub mod console;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod model;
pub mod port_map;
pub mod remap;
pub mod server;

/// Generated protobuf types and tonic service for `kubeexpose.v1`.
#[allow(missing_docs)]
pub mod pb {
    tonic::include_proto!("kubeexpose.v1");
}

// Re-export key types
pub use console::{Console, ConsoleStream};
pub use discovery::{
    BackendError, DiscoveryOptions, KubeBackend, ServiceBackend, ServiceDiscovery, ServicePage,
};
pub use error::{Error, Result};
pub use executor::{ExposeExecutor, ExposeRequest, StopRequest};
pub use model::{Service, ServicePort};
pub use pb::ConsoleLevel;
pub use port_map::{parse_port_map, PortMapError, PortMapping};
pub use remap::{resolve_ports, DeclaredPort, REMAP_ANNOTATION_PREFIX};
pub use server::{ExposeServer, RpcGuard, RpcServer};
