#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # tandem-rpc
//!
//! Client-side bidirectional RPC streams over pooled, framed connections.
//!
//! A [ClientStream](stream::client::ClientStream) is one logical call identified by a
//! correlation id. The caller sends and receives any number of messages on it, possibly from
//! a writer task and a reader task at once, then closes it. Closing tells the peer the stream
//! is over and returns the connection to the pool exactly once.
//!
//! ## Components
//!
//! - [`tandem-rpc-core`](https://docs.rs/tandem-rpc-core): Errors, codec interface, config and call context.
//! - [`tandem-rpc-codec`](https://docs.rs/tandem-rpc-codec): Provides codecs for serialization, such as `msgpack`.
//! - [`tandem-rpc-stream`](https://docs.rs/tandem-rpc-stream): Frame format, framed transport, streams and the pool.
//! - [`tandem-rpc-tcp`](https://docs.rs/tandem-rpc-tcp): A TCP connector.
//!
//! ## Usage
//!
//! ```no_run
//! use tandem_rpc::{CallContext, ClientConfig, MsgpCodec};
//! use tandem_rpc::stream::client::{CallRequest, StreamClient};
//! use tandem_rpc::tcp::TcpConnector;
//!
//! # async fn run() {
//! let client = StreamClient::new(TcpConnector::<MsgpCodec>::new(), ClientConfig::default());
//! let req = CallRequest::new("calc", "Calc.Count").streaming(true);
//! let stream = client.stream(CallContext::new(), req, "127.0.0.1:9000").await.unwrap();
//! stream.send(&3i64).await.unwrap();
//! let mut n = 0i64;
//! while stream.recv(&mut n).await.is_ok() {
//!     println!("{}", n);
//! }
//! stream.close().await.unwrap();
//! # }
//! ```

pub use tandem_rpc_codec as codec;
pub use tandem_rpc_core::error;
pub use tandem_rpc_stream as stream;
#[cfg(feature = "tcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "tcp")))]
pub use tandem_rpc_tcp as tcp;

pub use tandem_rpc_core::error::{RpcIntErr, StreamError};
pub use tandem_rpc_core::{CallContext, ClientConfig, Codec};
#[cfg(feature = "msgpack")]
pub use tandem_rpc_codec::MsgpCodec;
