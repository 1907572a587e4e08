#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # tandem-rpc-stream
//!
//! This crate provides the client-side bidirectional streams of `tandem-rpc`.
//! A stream is one logical call, identified by a correlation id, exchanging framed
//! messages over a connection borrowed from a pool.
//!
//! ## Components
//!
//! `tandem-rpc` is built from a collection of crates that provide different functionalities:
//!
//! - [`tandem-rpc`](https://docs.rs/tandem-rpc): Re-exports the crates below.
//! - [`tandem-rpc-core`](https://docs.rs/tandem-rpc-core): Errors, codec interface, config and call context.
//! - [`tandem-rpc-codec`](https://docs.rs/tandem-rpc-codec): Provides codecs for serialization, such as `msgpack`.
//! - [`tandem-rpc-tcp`](https://docs.rs/tandem-rpc-tcp): A TCP connector.
//!
//! The pieces in this crate:
//!
//! - [proto]: the frame format.
//! - [FrameTransport](transport::FrameTransport): the two-phase read / write contract a stream needs.
//! - [FramedTransport](framed::FramedTransport): the frame format over tokio I/O.
//! - [client]: [ClientStream](client::ClientStream), the pool and [StreamClient](client::StreamClient).

#[macro_use]
extern crate log;

pub mod client;
pub mod framed;
pub mod proto;
pub mod transport;
pub use tandem_rpc_core::error;
pub use tandem_rpc_core::{CallContext, ClientConfig};
