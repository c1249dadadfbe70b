//! Seam for the component that actually opens and closes local paths to
//! remote services.

use async_trait::async_trait;

use crate::console::Console;
use crate::port_map::PortMapping;

/// Validated expose request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeRequest {
    /// Namespace of the target service.
    pub namespace: String,
    /// Target service name.
    pub service: String,
    /// Requested `local:remote` mappings, in request order.
    pub ports: Vec<PortMapping>,
}

/// Validated stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRequest {
    /// Namespace of the target service.
    pub namespace: String,
    /// Target service name.
    pub service: String,
}

/// Performs expose/stop work, reporting progress on a [`Console`].
///
/// The future is dropped if the caller cancels the stream, so
/// implementations should hold their resources in guards that clean up on
/// drop. Returning `Err` is reported to the caller as a final `Error`
/// message.
#[async_trait]
pub trait ExposeExecutor: Send + Sync + 'static {
    /// Start exposing a service locally.
    async fn expose(&self, request: ExposeRequest, console: Console) -> anyhow::Result<()>;

    /// Stop exposing a service.
    async fn stop(&self, request: StopRequest, console: Console) -> anyhow::Result<()>;
}
