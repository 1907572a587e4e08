use crate::proto::FrameHeader;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::future::Future;
use tandem_rpc_core::error::RpcIntErr;

/// The framed message channel a [ClientStream](crate::client::ClientStream) talks through.
///
/// The read side is two-phase: [read_header](FrameTransport::read_header) returns the
/// header alone, the caller then decides whether to [read_body](FrameTransport::read_body)
/// into a target or [discard_body](FrameTransport::discard_body).
///
/// A transport is shared by reference between the send and recv paths of a stream, so every
/// method takes `&self`. Implementations serialize writes so frames never interleave.
pub trait FrameTransport: fmt::Debug + Send + Sync + 'static {
    /// Write one frame, the body is omitted (length 0) when None.
    fn write_frame<M: Serialize + Sync>(
        &self, header: &FrameHeader, body: Option<&M>,
    ) -> impl Future<Output = Result<(), RpcIntErr>> + Send;

    /// Read the next frame header without consuming its body.
    ///
    /// Returns [RpcIntErr::Eof] when the peer closed on a frame boundary.
    fn read_header(&self) -> impl Future<Output = Result<FrameHeader, RpcIntErr>> + Send;

    /// Decode the body of the frame returned by the last `read_header`.
    fn read_body<M: DeserializeOwned + Send>(
        &self,
    ) -> impl Future<Output = Result<M, RpcIntErr>> + Send;

    /// Skip the body of the frame returned by the last `read_header`.
    fn discard_body(&self) -> impl Future<Output = Result<(), RpcIntErr>> + Send;

    /// Finish the use of the transport by one stream.
    fn close(&self) -> impl Future<Output = Result<(), RpcIntErr>> + Send;

    /// Whether the framing is still intact, checked by the pool before keeping a connection.
    fn is_healthy(&self) -> bool;

    /// Keep the connection out of the pool, for a stream closed while frames of it may still
    /// be on the way.
    fn mark_unhealthy(&self);
}
