//! Consistent, paginated service discovery.
//!
//! - Pluggable page source via the [`ServiceBackend`] trait
//! - [`KubeBackend`] lists services across all namespaces of a cluster
//! - [`ServiceDiscovery`] drives the scan and restarts it when the
//!   continuation token expires, so a result always reflects a single pass

pub mod backend;
pub mod discover;
pub mod kubernetes;

pub use backend::{BackendError, ServiceBackend, ServicePage};
pub use discover::{DiscoveryOptions, ServiceDiscovery};
pub use kubernetes::KubeBackend;
