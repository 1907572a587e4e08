//! The client side: [StreamClient] opens [ClientStream]s on pooled connections.
//!
//! ## Usage
//!
//! ```no_run
//! use tandem_rpc_core::{CallContext, ClientConfig};
//! use tandem_rpc_stream::client::{CallRequest, Connector, StreamClient};
//!
//! async fn transfer<N: Connector>(client: &StreamClient<N>) {
//!     let req = CallRequest::new("bank", "Bank.Transfer").streaming(true);
//!     let stream = client.stream(CallContext::new(), req, "127.0.0.1:9000").await.unwrap();
//!     stream.send(&100u64).await.unwrap();
//!     let mut balance = 0u64;
//!     while stream.recv(&mut balance).await.is_ok() {
//!         println!("balance {}", balance);
//!     }
//!     let _ = stream.close().await;
//! }
//! ```

use crate::transport::FrameTransport;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tandem_rpc_core::error::{RpcIntErr, StreamError};
use tandem_rpc_core::{CallContext, ClientConfig};

mod pool;
pub use pool::{ConnPool, ReleaseHook};
mod stream;
pub use stream::ClientStream;

/// Names the target of a call, immutable once a stream is created.
#[derive(Clone, Debug)]
pub struct CallRequest {
    service: String,
    method: String,
    endpoint: String,
    content_type: String,
    stream: bool,
}

impl CallRequest {
    /// The method defaults to the endpoint.
    pub fn new(service: &str, endpoint: &str) -> Self {
        Self {
            service: service.to_string(),
            method: endpoint.to_string(),
            endpoint: endpoint.to_string(),
            content_type: "application/msgpack".to_string(),
            stream: false,
        }
    }

    #[inline]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    #[inline]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Mark the call open-ended, the peer then expects an end-of-stream frame on close.
    #[inline]
    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    #[inline(always)]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[inline(always)]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline(always)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[inline(always)]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline(always)]
    pub fn is_stream(&self) -> bool {
        self.stream
    }
}

/// How to establish a connection to an address.
pub trait Connector: Send + Sync + 'static {
    type Transport: FrameTransport;

    fn connect(
        &self, addr: &str, config: &ClientConfig,
    ) -> impl Future<Output = Result<Self::Transport, RpcIntErr>> + Send;
}

/// Opens streams on connections taken from its pool, dialing when the pool is empty.
pub struct StreamClient<N: Connector> {
    connector: N,
    config: ClientConfig,
    pool: Arc<ConnPool<N::Transport>>,
    seq: AtomicU64,
}

impl<N: Connector> StreamClient<N> {
    pub fn new(connector: N, config: ClientConfig) -> Self {
        let pool = Arc::new(ConnPool::new(&config));
        Self { connector, config, pool, seq: AtomicU64::new(1) }
    }

    #[inline(always)]
    pub fn get_connector(&self) -> &N {
        &self.connector
    }

    #[inline(always)]
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline(always)]
    pub fn pool(&self) -> &Arc<ConnPool<N::Transport>> {
        &self.pool
    }

    /// Start a stream on `addr`.
    ///
    /// Nothing is written until the first send. The stream writes an end-of-stream frame on
    /// close when `request` is streaming.
    pub async fn stream(
        &self, ctx: CallContext, request: CallRequest, addr: &str,
    ) -> Result<ClientStream<N::Transport>, StreamError> {
        if ctx.is_expired() {
            debug!("call {}.{} to {} expired before start", request.service(), request.endpoint(), addr);
            return Err(StreamError::Rpc(RpcIntErr::Timeout));
        }
        let conn = match self.pool.checkout(addr) {
            Some(conn) => conn,
            None => match self.connector.connect(addr, &self.config).await {
                Ok(conn) => Arc::new(conn),
                Err(e) => {
                    warn!("connect {} err: {}", addr, e);
                    return Err(StreamError::Rpc(e));
                }
            },
        };
        let id = self.seq.fetch_add(1, Ordering::SeqCst).to_string();
        let release = self.pool.release_hook(addr, conn.clone());
        let send_eos = request.is_stream();
        let stream = ClientStream::new(id, request, ctx, conn, send_eos, release);
        debug!("{:?} started on {}", stream, addr);
        Ok(stream)
    }
}
