//! gRPC server for the expose/stop streaming calls.
//!
//! Each call becomes its own task driving the [`ExposeExecutor`]. Console
//! output is forwarded as it is produced; the stream closes when the work
//! finishes. If the caller drops the stream first, the executor future is
//! dropped with it.
//!
//! ```no_run
//! # use kube_expose::{Console, ExposeExecutor, ExposeRequest, RpcServer, StopRequest};
//! # struct Noop;
//! # #[async_trait::async_trait]
//! # impl ExposeExecutor for Noop {
//! #     async fn expose(&self, _: ExposeRequest, _: Console) -> anyhow::Result<()> { Ok(()) }
//! #     async fn stop(&self, _: StopRequest, _: Console) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # async fn run() -> kube_expose::Result<()> {
//! let guard = RpcServer::new("127.0.0.1:50051".parse().unwrap())
//!     .serve(Noop)
//!     .await?;
//! // ... later
//! guard.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

use crate::console::{Console, ConsoleStream, CONSOLE_BUFFER};
use crate::error::Result;
use crate::executor::{ExposeExecutor, ExposeRequest, StopRequest};
use crate::pb::expose_control_server::{ExposeControl, ExposeControlServer};
use crate::pb::{ExposeServiceRequest, StopExposeRequest};
use crate::port_map::parse_port_map;

/// Tonic service implementation backed by an [`ExposeExecutor`].
pub struct ExposeServer<E> {
    executor: Arc<E>,
}

impl<E> Clone for ExposeServer<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: ExposeExecutor> ExposeServer<E> {
    /// Wrap an executor.
    pub fn new(executor: E) -> Self {
        Self::from_arc(Arc::new(executor))
    }

    /// Wrap a shared executor.
    pub fn from_arc(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Convert into the generated tonic service.
    pub fn into_service(self) -> ExposeControlServer<Self> {
        ExposeControlServer::new(self)
    }
}

fn require(field: &str, value: &str) -> std::result::Result<(), Status> {
    if value.trim().is_empty() {
        return Err(Status::invalid_argument(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Run `work` on its own task, racing it against the caller hanging up.
fn spawn_operation<F, Fut>(operation: &'static str, key: String, work: F) -> ConsoleStream
where
    F: FnOnce(Console) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let (console, stream) = Console::channel(CONSOLE_BUFFER);
    let fut = work(console.clone());

    tokio::spawn(async move {
        tokio::select! {
            result = fut => match result {
                Ok(()) => debug!(operation, service = %key, "Operation finished"),
                Err(e) => {
                    warn!(operation, service = %key, "Operation failed: {e:#}");
                    console.error(format!("failed to {operation} {key}: {e:#}")).await;
                }
            },
            _ = console.closed() => {
                debug!(operation, service = %key, "Caller went away, cancelling operation");
            }
        }
    });

    stream
}

#[tonic::async_trait]
impl<E: ExposeExecutor> ExposeControl for ExposeServer<E> {
    type ExposeServiceStream = ConsoleStream;

    async fn expose_service(
        &self,
        request: Request<ExposeServiceRequest>,
    ) -> std::result::Result<Response<Self::ExposeServiceStream>, Status> {
        let req = request.into_inner();
        require("namespace", &req.namespace)?;
        require("service", &req.service)?;
        let ports =
            parse_port_map(&req.port_map).map_err(|e| Status::invalid_argument(e.to_string()))?;

        let key = format!("{}/{}", req.namespace, req.service);
        info!(service = %key, ports = ports.len(), "Expose requested");

        let request = ExposeRequest {
            namespace: req.namespace,
            service: req.service,
            ports,
        };
        let executor = Arc::clone(&self.executor);
        let stream = spawn_operation("expose", key, move |console| async move {
            executor.expose(request, console).await
        });

        Ok(Response::new(stream))
    }

    type StopExposeStream = ConsoleStream;

    async fn stop_expose(
        &self,
        request: Request<StopExposeRequest>,
    ) -> std::result::Result<Response<Self::StopExposeStream>, Status> {
        let req = request.into_inner();
        require("namespace", &req.namespace)?;
        require("service", &req.service)?;

        let key = format!("{}/{}", req.namespace, req.service);
        info!(service = %key, "Stop requested");

        let request = StopRequest {
            namespace: req.namespace,
            service: req.service,
        };
        let executor = Arc::clone(&self.executor);
        let stream = spawn_operation("stop", key, move |console| async move {
            executor.stop(request, console).await
        });

        Ok(Response::new(stream))
    }
}

/// Builder for serving the expose service over TCP.
pub struct RpcServer {
    addr: SocketAddr,
}

impl RpcServer {
    /// Create a server builder for the given bind address. Port 0 picks a
    /// free port; see [`RpcGuard::local_addr`].
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Bind and start serving, returning a guard for shutdown.
    pub async fn serve<E: ExposeExecutor>(self, executor: E) -> Result<RpcGuard> {
        self.serve_service(ExposeServer::new(executor)).await
    }

    /// Like [`serve`](RpcServer::serve) with an already wrapped service.
    pub async fn serve_service<E: ExposeExecutor>(
        self,
        service: ExposeServer<E>,
    ) -> Result<RpcGuard> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel(1);

        let router = Server::builder().add_service(service.into_service());

        let mut shutdown_rx = shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let shutdown_fut = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(e) = router
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_fut)
                .await
            {
                error!("tonic server error: {e}");
            }
        });

        info!(addr = %local_addr, "Expose control server listening");

        Ok(RpcGuard {
            local_addr,
            shutdown_tx,
            handle: Some(handle),
        })
    }
}

/// Guard for a running RPC server. Dropping it signals shutdown.
pub struct RpcGuard {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl RpcGuard {
    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Graceful shutdown. Waits for open calls to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }

        debug!(addr = %self.local_addr, "Expose control server stopped");
        Ok(())
    }
}

impl Drop for RpcGuard {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}
