use crate::error::RpcIntErr;
use serde::{Deserialize, Serialize};

/// Serializes the frame meta and the message bodies of the framed transport.
///
/// See [tandem-rpc-codec](https://docs.rs/tandem-rpc-codec) for implementations.
///
/// One codec is shared by both directions of a connection, so it is immutable. A codec
/// needing state (like a cipher) should have inner mutability.
pub trait Codec: Default + Send + Sync + Sized + 'static {
    /// Fails with [RpcIntErr::Encode]
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, RpcIntErr>;

    /// Append the encoded msg to buf, and return the size appended.
    ///
    /// The frame encoder relies on this to write meta and body behind a reserved head.
    fn encode_into<T: Serialize>(&self, msg: &T, buf: &mut Vec<u8>) -> Result<usize, RpcIntErr>;

    /// Fails with [RpcIntErr::Decode]
    fn decode<'a, T: Deserialize<'a>>(&self, buf: &'a [u8]) -> Result<T, RpcIntErr>;
}
