//! Leveled console output streamed back to RPC callers.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::{error, info, warn};

use crate::pb::{ConsoleLevel, ConsoleResponse};

/// Messages buffered per call before a slow reader applies backpressure.
pub const CONSOLE_BUFFER: usize = 100;

/// Stream handed to tonic for a server-streaming call.
pub type ConsoleStream = ReceiverStream<Result<ConsoleResponse, Status>>;

/// Producer handle for one call's console output.
///
/// Cloning is cheap. The stream ends once every clone has been dropped.
#[derive(Clone, Debug)]
pub struct Console {
    tx: mpsc::Sender<Result<ConsoleResponse, Status>>,
}

impl Console {
    /// Create a console and the stream that drains it.
    pub fn channel(buffer: usize) -> (Self, ConsoleStream) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, ReceiverStream::new(rx))
    }

    /// Send a message. Returns `false` once the reader has gone away.
    ///
    /// `Unspecified` is never put on the wire; it is sent as `Info`.
    pub async fn send(&self, level: ConsoleLevel, message: impl Into<String>) -> bool {
        let level = match level {
            ConsoleLevel::Unspecified => ConsoleLevel::Info,
            other => other,
        };
        let message = message.into();

        match level {
            ConsoleLevel::Error => error!(target: "kube_expose::console", "{message}"),
            ConsoleLevel::Warn => warn!(target: "kube_expose::console", "{message}"),
            _ => info!(target: "kube_expose::console", "{message}"),
        }

        self.tx
            .send(Ok(ConsoleResponse {
                level: level as i32,
                message,
            }))
            .await
            .is_ok()
    }

    /// Send an `Info` message.
    pub async fn info(&self, message: impl Into<String>) -> bool {
        self.send(ConsoleLevel::Info, message).await
    }

    /// Send a `Warn` message.
    pub async fn warn(&self, message: impl Into<String>) -> bool {
        self.send(ConsoleLevel::Warn, message).await
    }

    /// Send an `Error` message.
    pub async fn error(&self, message: impl Into<String>) -> bool {
        self.send(ConsoleLevel::Error, message).await
    }

    /// Completes when the reader has dropped the stream.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// True if the reader has dropped the stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
