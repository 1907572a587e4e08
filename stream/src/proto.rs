//! The frame format on the wire.
//!
//! Every frame starts with a fixed-length head, followed by the header meta and the body:
//!
//! Fixed len of FrameHead = 12B
//! | 2B   |1B | 1B        | 4B       | 4B       |
//! | magic|ver| frame_type| meta_len | body_len |
//!
//! Variable length:
//! meta_len: the [FrameHeader] fields (id, service, method, endpoint, error) encoded by the codec
//! body_len: the message encoded by the codec, zero for the end-of-stream terminator
//!
//! Integers are little-endian.

use serde::Serialize;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::mem::size_of;
use tandem_rpc_core::Codec;
use tandem_rpc_core::error::{EOS_SENTINEL, RpcIntErr};
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

pub const RPC_MAGIC: [u8; 2] = [b'%', b'T'];
pub const RPC_VER: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Request = 1,
    Response = 2,
    Error = 3,
}

impl TryFrom<u8> for FrameType {
    type Error = RpcIntErr;

    #[inline]
    fn try_from(v: u8) -> Result<Self, RpcIntErr> {
        match v {
            1 => Ok(Self::Request),
            2 => Ok(Self::Response),
            3 => Ok(Self::Error),
            _ => Err(RpcIntErr::Decode),
        }
    }
}

#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, PartialEq, Clone, Copy)]
#[repr(C)]
pub struct FrameHead {
    pub magic: [u8; 2],
    pub ver: u8,
    pub frame_type: u8,
    /// length of the encoded header meta
    pub meta_len: U32<LittleEndian>,
    /// length of the encoded body
    pub body_len: U32<LittleEndian>,
}

pub const FRAME_HEAD_LEN: usize = size_of::<FrameHead>();

impl FrameHead {
    #[inline]
    pub fn new(frame_type: FrameType, meta_len: u32, body_len: u32) -> Self {
        Self {
            magic: RPC_MAGIC,
            ver: RPC_VER,
            frame_type: frame_type as u8,
            meta_len: U32::new(meta_len),
            body_len: U32::new(body_len),
        }
    }

    #[inline]
    pub fn decode(head_buf: &[u8]) -> Result<Self, RpcIntErr> {
        let Some(head) = Self::read_from(head_buf) else {
            return Err(RpcIntErr::Decode);
        };
        if head.magic != RPC_MAGIC {
            warn!("wrong magic receive {:?}", head.magic);
            return Err(RpcIntErr::Version);
        }
        if head.ver != RPC_VER {
            warn!("version {} not supported", head.ver);
            return Err(RpcIntErr::Version);
        }
        Ok(head)
    }

    #[inline]
    pub fn get_type(&self) -> Result<FrameType, RpcIntErr> {
        FrameType::try_from(self.frame_type)
    }
}

impl fmt::Display for FrameHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[type:{}, meta:{}, body:{}]",
            self.frame_type,
            self.meta_len.get(),
            self.body_len.get()
        )
    }
}

impl fmt::Debug for FrameHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The decoded header of a frame, readable before deciding what to do with the body.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    /// correlation id of the call
    pub id: String,
    pub service: String,
    pub method: String,
    pub endpoint: String,
    /// empty for non-error frames
    pub error: String,
}

/// The part of [FrameHeader] carried in the meta section
#[derive(Serialize, Deserialize)]
struct FrameMeta<'a> {
    id: &'a str,
    service: &'a str,
    method: &'a str,
    endpoint: &'a str,
    error: &'a str,
}

impl FrameHeader {
    #[inline]
    pub fn new(
        frame_type: FrameType, id: &str, service: &str, method: &str, endpoint: &str,
    ) -> Self {
        Self {
            frame_type,
            id: id.to_string(),
            service: service.to_string(),
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            error: String::new(),
        }
    }

    #[inline]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = error.to_string();
        self
    }

    /// Whether the peer ended the stream gracefully
    #[inline(always)]
    pub fn is_eos(&self) -> bool {
        self.error == EOS_SENTINEL
    }

    #[inline(always)]
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Encode the whole frame into `buf` (cleared first), the body is skipped when None.
    ///
    /// Fails with [RpcIntErr::Encode] when the meta or the body is longer than `max_len`.
    pub fn encode_frame<C: Codec, M: Serialize>(
        &self, codec: &C, body: Option<&M>, max_len: usize, buf: &mut Vec<u8>,
    ) -> Result<(), RpcIntErr> {
        buf.clear();
        buf.resize(FRAME_HEAD_LEN, 0);
        let meta = FrameMeta {
            id: &self.id,
            service: &self.service,
            method: &self.method,
            endpoint: &self.endpoint,
            error: &self.error,
        };
        let meta_len = codec.encode_into(&meta, buf)?;
        let body_len = match body {
            Some(msg) => codec.encode_into(msg, buf)?,
            None => 0,
        };
        let (Some(meta_len), Some(body_len)) =
            (section_len(meta_len, max_len), section_len(body_len, max_len))
        else {
            warn!("frame {} of meta {} body {} bytes exceeds limit {}", self, meta_len, body_len, max_len);
            buf.clear();
            return Err(RpcIntErr::Encode);
        };
        let head = FrameHead::new(self.frame_type, meta_len, body_len);
        buf[..FRAME_HEAD_LEN].copy_from_slice(head.as_bytes());
        Ok(())
    }

    /// Decode the meta section that follows `head`
    pub fn decode_meta<C: Codec>(
        codec: &C, head: &FrameHead, meta_buf: &[u8],
    ) -> Result<Self, RpcIntErr> {
        let frame_type = head.get_type()?;
        let meta: FrameMeta = codec.decode(meta_buf)?;
        Ok(Self::new(frame_type, meta.id, meta.service, meta.method, meta.endpoint)
            .with_error(meta.error))
    }
}

#[inline]
fn section_len(len: usize, max_len: usize) -> Option<u32> {
    if len > max_len {
        return None;
    }
    u32::try_from(len).ok()
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[id:{}, {:?} {}.{}", self.id, self.frame_type, self.service, self.endpoint)?;
        if self.has_error() {
            write!(f, ", err:{:?}]", self.error)
        } else {
            write!(f, "]")
        }
    }
}

impl fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
