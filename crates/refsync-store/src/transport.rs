//! In-process transport and protocol request dispatch

use crate::store::ByteRangeStore;
use async_trait::async_trait;
use refsync_protocol::{RemoteStore, StoreRequest, StoreResponse};
use refsync_types::Result;
use std::sync::Arc;
use tracing::warn;

/// A [`RemoteStore`] backed by a local [`ByteRangeStore`].
///
/// Lets the synchronization client drive a destination directory on the
/// same machine through the exact interface a network transport would
/// offer, so local-to-local synchronization and tests exercise the same
/// client code path as a remote deployment.
#[derive(Debug, Clone)]
pub struct DirectTransport {
    store: Arc<ByteRangeStore>,
}

impl DirectTransport {
    /// Wrap a local store
    pub fn new(store: Arc<ByteRangeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RemoteStore for DirectTransport {
    async fn append(&self, name: &str, data: &[u8]) -> Result<()> {
        self.store.append(name, data).await
    }

    async fn copy_range(&self, name: &str, source: &str, offset: u64, length: u64) -> Result<()> {
        self.store.copy_range(name, source, offset, length).await
    }

    async fn reset(&self, name: &str) -> Result<()> {
        self.store.reset(name).await
    }
}

/// Dispatches decoded protocol requests against a local store.
///
/// The serving half of the transfer protocol: a transport that carries
/// [`StoreRequest`] frames hands each one to [`handle`](Self::handle) and
/// sends the returned [`StoreResponse`] back to the client.
#[derive(Debug, Clone)]
pub struct StoreService {
    store: Arc<ByteRangeStore>,
}

impl StoreService {
    /// Create a service over a local store
    pub fn new(store: Arc<ByteRangeStore>) -> Self {
        Self { store }
    }

    /// Apply one request and report the outcome
    pub async fn handle(&self, request: StoreRequest) -> StoreResponse {
        let destination = request.destination().to_string();
        let outcome = match request {
            StoreRequest::Append { name, data } => self.store.append(&name, &data).await,
            StoreRequest::CopyRange {
                name,
                source,
                offset,
                length,
            } => self.store.copy_range(&name, &source, offset, length).await,
            StoreRequest::Reset { name } => self.store.reset(&name).await,
        };
        if let Err(e) = &outcome {
            warn!("store request for '{}' failed: {}", destination, e);
        }
        StoreResponse::from_result(&outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fixture(dir: &TempDir) -> (Arc<ByteRangeStore>, DirectTransport, StoreService) {
        let store = Arc::new(ByteRangeStore::open(dir.path().join("dest")).await.unwrap());
        (
            Arc::clone(&store),
            DirectTransport::new(Arc::clone(&store)),
            StoreService::new(store),
        )
    }

    #[tokio::test]
    async fn test_direct_transport_forwards_operations() {
        let dir = TempDir::new().unwrap();
        let (store, transport, _) = fixture(&dir).await;

        transport.reset("file.bin").await.unwrap();
        transport.append("file.bin", b"abcdef").await.unwrap();
        transport.append("other.bin", b"--").await.unwrap();
        transport.copy_range("other.bin", "file.bin", 2, 3).await.unwrap();

        assert_eq!(store.read("other.bin").await.unwrap(), b"--cde");
    }

    #[tokio::test]
    async fn test_service_applies_requests_in_order() {
        let dir = TempDir::new().unwrap();
        let (store, _, service) = fixture(&dir).await;

        let requests = vec![
            StoreRequest::Reset {
                name: "out.bin".to_string(),
            },
            StoreRequest::Append {
                name: "base.bin".to_string(),
                data: b"0123456789".to_vec(),
            },
            StoreRequest::Append {
                name: "out.bin".to_string(),
                data: b"lit:".to_vec(),
            },
            StoreRequest::CopyRange {
                name: "out.bin".to_string(),
                source: "base.bin".to_string(),
                offset: 4,
                length: 4,
            },
        ];
        for request in requests {
            assert_eq!(service.handle(request).await, StoreResponse::Done);
        }

        assert_eq!(store.read("out.bin").await.unwrap(), b"lit:4567");
    }

    #[tokio::test]
    async fn test_service_reports_failures() {
        let dir = TempDir::new().unwrap();
        let (_, _, service) = fixture(&dir).await;

        let response = service
            .handle(StoreRequest::CopyRange {
                name: "out.bin".to_string(),
                source: "ghost.bin".to_string(),
                offset: 0,
                length: 1,
            })
            .await;

        match response {
            StoreResponse::Failed { message } => assert!(message.contains("ghost.bin")),
            StoreResponse::Done => unreachable!(),
        }
    }
}
