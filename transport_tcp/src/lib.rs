#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # tandem-rpc-tcp
//!
//! This crate provides a TCP [Connector](tandem_rpc_stream::client::Connector) for [`tandem-rpc`](https://docs.rs/tandem-rpc).
//! The socket is split into owned halves and framed with
//! [FramedTransport](tandem_rpc_stream::framed::FramedTransport).

#[macro_use]
extern crate log;
mod client;
pub use client::*;
