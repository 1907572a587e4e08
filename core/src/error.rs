use std::{fmt, io};

pub const RPC_ERR_PREFIX: &'static str = "rpc_";

/// The reserved error string a peer puts in a frame header to end a stream gracefully.
///
/// Both sides special-case this exact value, it is never a real application error.
pub const EOS_SENTINEL: &'static str = "EOS";

/// "rpc_" prefix is reserved for internal error
///
/// These are failures of the transport layer (framing, socket, codec), they are cheap to
/// clone so a stream can keep the last one and hand out copies.
#[derive(
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    PartialEq,
    Eq,
    Clone,
    Copy,
    thiserror::Error,
)]
#[repr(u8)]
pub enum RpcIntErr {
    /// Connect error
    #[strum(serialize = "rpc_unreachable")]
    Unreachable = 0,
    /// Peer closed the connection on a frame boundary
    #[strum(serialize = "rpc_eof")]
    Eof = 1,
    /// IO error
    #[strum(serialize = "rpc_io_err")]
    IO = 2,
    /// Read or write timeout
    #[strum(serialize = "rpc_timeout")]
    Timeout = 3,
    /// Encode Error
    #[strum(serialize = "rpc_encode")]
    Encode = 4,
    /// Decode Error
    #[strum(serialize = "rpc_decode")]
    Decode = 5,
    /// invalid magic or version number in frame head
    #[strum(serialize = "rpc_invalid_ver")]
    Version = 6,
}

// The default Debug derive just ignore strum customized string, by strum only have a Display derive
impl fmt::Debug for RpcIntErr {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl RpcIntErr {
    #[inline]
    pub fn as_bytes<'a>(&'a self) -> &'a [u8] {
        self.as_ref().as_bytes()
    }
}

impl From<io::Error> for RpcIntErr {
    #[inline]
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::IO,
        }
    }
}

/// The error of a client stream, as returned by send / recv and handed to the release hook.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Send or recv after the stream was closed
    #[error("rpc_stream_closed")]
    Closed,
    /// The connection ended without the peer terminating the stream
    #[error("rpc_unexpected_eof")]
    UnexpectedEof,
    /// The peer terminated the stream with [EOS_SENTINEL], this is not a failure
    #[error("{}", EOS_SENTINEL)]
    EndOfStream,
    /// Application error reported by the peer in the frame header
    #[error("{0}")]
    Remote(String),
    /// Transport, encode or decode failure
    #[error("{0}")]
    Rpc(#[from] RpcIntErr),
}

impl fmt::Debug for StreamError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Remote(s) => write!(f, "remote: {}", s),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

impl StreamError {
    #[inline(always)]
    pub fn is_eos(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether the connection that produced this error can still be trusted.
    ///
    /// Only the graceful end of stream leaves the framing intact.
    #[inline]
    pub fn conn_reusable(err: Option<&Self>) -> bool {
        match err {
            None => true,
            Some(e) => e.is_eos(),
        }
    }
}

impl From<&str> for StreamError {
    #[inline]
    fn from(e: &str) -> Self {
        Self::Remote(e.to_string())
    }
}
