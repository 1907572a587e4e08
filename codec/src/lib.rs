#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # tandem-rpc-codec
//!
//! This crate provides [tandem_rpc_core::Codec](https://docs.rs/tandem-rpc-core/latest/tandem_rpc_core/trait.Codec.html) implementations for [`tandem-rpc`](https://docs.rs/tandem-rpc).
//! The framed transport uses the codec for both the frame header meta and the message body.

pub use tandem_rpc_core::Codec;
#[cfg(feature = "msgpack")]
mod msgpack;
#[cfg(feature = "msgpack")]
pub use msgpack::*;
