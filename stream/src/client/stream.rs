//! [ClientStream] is one logical call on a pooled connection.
//!
//! The caller may send and receive any number of messages, possibly from a writer task and
//! a reader task at the same time, then [close](ClientStream::close) it. Close is the only
//! teardown path: it tells the peer the stream is over (when the call is open-ended) and
//! hands the connection back to the pool together with the final error of the stream.

use super::CallRequest;
use super::pool::ReleaseHook;
use crate::proto::{FrameHeader, FrameType};
use crate::transport::FrameTransport;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_rpc_core::CallContext;
use tandem_rpc_core::error::{EOS_SENTINEL, RpcIntErr, StreamError};
use tokio::sync::RwLock;

struct StreamState {
    err: Option<StreamError>,
    release: Option<ReleaseHook>,
    /// header of the last frame received for this stream
    response: Option<FrameHeader>,
    /// a request frame was written
    sent: bool,
    /// the peer has nothing more to send on this stream
    drained: bool,
}

impl StreamState {
    /// Only the graceful end of stream may be overwritten.
    #[inline]
    fn record(&mut self, e: StreamError) {
        match self.err.as_ref() {
            Some(old) if !old.is_eos() => {}
            _ => self.err = Some(e),
        }
    }

    #[inline(always)]
    fn result(&self) -> Result<(), StreamError> {
        match self.err.as_ref() {
            None => Ok(()),
            Some(e) => Err(e.clone()),
        }
    }
}

/// The client side of a bidirectional stream.
///
/// All the mutable state sits behind one [RwLock]. `send` holds it for the whole write so
/// frames of the stream never interleave, `recv` drops it while waiting on the peer so a
/// concurrent `send` can make progress.
pub struct ClientStream<T: FrameTransport> {
    id: String,
    request: CallRequest,
    context: CallContext,
    transport: Arc<T>,
    state: RwLock<StreamState>,
    closed: AtomicBool,
    send_eos: bool,
}

impl<T: FrameTransport> fmt::Debug for ClientStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "stream {} {}.{}", self.id, self.request.service(), self.request.endpoint())
    }
}

impl<T: FrameTransport> ClientStream<T> {
    /// send_eos: write the end-of-stream frame on close, for open-ended calls.
    ///
    /// `release` is called exactly once, by the first [close](Self::close).
    pub fn new(
        id: String, request: CallRequest, context: CallContext, transport: Arc<T>,
        send_eos: bool, release: ReleaseHook,
    ) -> Self {
        Self {
            id,
            request,
            context,
            transport,
            state: RwLock::new(StreamState {
                err: None,
                release: Some(release),
                response: None,
                sent: false,
                drained: false,
            }),
            closed: AtomicBool::new(false),
            send_eos,
        }
    }

    /// The correlation id tagged on every frame of this stream
    #[inline(always)]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline(always)]
    pub fn request(&self) -> &CallRequest {
        &self.request
    }

    #[inline(always)]
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The last recorded error, [StreamError::EndOfStream] after the peer ended the stream.
    pub async fn error(&self) -> Option<StreamError> {
        self.state.read().await.err.clone()
    }

    /// Header of the last response frame received, None before the first one.
    pub async fn response(&self) -> Option<FrameHeader> {
        self.state.read().await.response.clone()
    }

    #[inline]
    fn frame_header(&self, frame_type: FrameType) -> FrameHeader {
        FrameHeader::new(
            frame_type,
            &self.id,
            self.request.service(),
            self.request.method(),
            self.request.endpoint(),
        )
    }

    /// Write `msg` as one request frame.
    ///
    /// A write failure is recorded and returned, the stream stays open.
    pub async fn send<M: Serialize + Sync>(&self, msg: &M) -> Result<(), StreamError> {
        let mut state = self.state.write().await;
        if self.is_closed() {
            state.record(StreamError::Closed);
            return Err(StreamError::Closed);
        }
        let header = self.frame_header(FrameType::Request);
        state.sent = true;
        match self.transport.write_frame(&header, Some(msg)).await {
            Ok(()) => {
                trace!("{:?} sent", self);
                return Ok(());
            }
            Err(e) => {
                warn!("{:?} send err: {}", self, e);
                let e = StreamError::Rpc(e);
                state.record(e.clone());
                return Err(e);
            }
        }
    }

    /// Receive the next message into `msg`.
    ///
    /// Returns the error of the stream after this call, that is `Err(EndOfStream)` once the
    /// peer finished. Any recorded error is returned again without touching the transport.
    pub async fn recv<M: DeserializeOwned + Send>(&self, msg: &mut M) -> Result<(), StreamError> {
        {
            let mut state = self.state.write().await;
            if self.is_closed() {
                state.record(StreamError::Closed);
                return Err(StreamError::Closed);
            }
            state.result()?;
        }

        let r = loop {
            match self.transport.read_header().await {
                Ok(header) if header.id != self.id => {
                    debug!("{:?} skip frame of another stream {}", self, header);
                    if let Err(e) = self.transport.discard_body().await {
                        break Err(e);
                    }
                    if self.is_closed() {
                        break Err(RpcIntErr::Eof);
                    }
                }
                r => break r,
            }
        };
        let mut state = self.state.write().await;
        let header = match r {
            Ok(header) => header,
            Err(e) => {
                let err = if self.is_closed() {
                    debug!("{:?} closed while reading header: {}", self, e);
                    StreamError::Closed
                } else if e == RpcIntErr::Eof {
                    warn!("{:?} connection ended without end of stream", self);
                    StreamError::UnexpectedEof
                } else {
                    warn!("{:?} read header err: {}", self, e);
                    StreamError::Rpc(e)
                };
                state.record(err);
                return state.result();
            }
        };

        if header.frame_type == FrameType::Request {
            warn!("{:?} recv unexpected frame {}", self, header);
            state.record(StreamError::Rpc(RpcIntErr::Decode));
            return state.result();
        }
        state.response = Some(header.clone());

        if header.has_error() {
            if header.is_eos() {
                debug!("{:?} recv end of stream", self);
                state.drained = true;
                state.record(StreamError::EndOfStream);
            } else {
                debug!("{:?} recv remote err: {:?}", self, header.error);
                state.record(StreamError::Remote(header.error));
            }
            drop(state);
            let r = self.transport.discard_body().await;
            let mut state = self.state.write().await;
            if let Err(e) = r {
                warn!("{:?} discard body err: {}", self, e);
                // A remote error is kept, the connection is not reused after it anyway
                state.record(StreamError::Rpc(e));
            }
            return state.result();
        }

        drop(state);
        let r = self.transport.read_body::<M>().await;
        let mut state = self.state.write().await;
        match r {
            Ok(body) => {
                *msg = body;
                if !self.send_eos {
                    // The single response of a unary call
                    state.drained = true;
                }
                trace!("{:?} recv", self);
            }
            Err(e) => {
                warn!("{:?} read body err: {}", self, e);
                state.record(StreamError::Rpc(e));
            }
        }
        return state.result();
    }

    /// End the stream, only the first call has effects.
    ///
    /// Writes the end-of-stream frame if the stream was created with `send_eos`, ignoring
    /// its failure, closes the transport and calls the release hook with the last error.
    /// Returns the error of closing the transport.
    ///
    /// If the peer may still send frames of this stream (requests were sent and neither the
    /// end of stream nor the response of a unary call was received), the transport is marked
    /// unhealthy so the pool does not hand it to the next stream.
    pub async fn close(&self) -> Result<(), StreamError> {
        if self.is_closed() {
            return Ok(());
        }
        let (release, settled) = {
            let mut state = self.state.write().await;
            if self.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            (state.release.take(), !state.sent || state.drained)
        };

        if self.send_eos {
            let header = self.frame_header(FrameType::Error).with_error(EOS_SENTINEL);
            if let Err(e) = self.transport.write_frame::<()>(&header, None).await {
                debug!("{:?} write end of stream err: {}", self, e);
            }
        }
        let r = self.transport.close().await;
        if !settled {
            debug!("{:?} closed with responses in flight", self);
            self.transport.mark_unhealthy();
        }
        if let Some(release) = release {
            release(self.error().await);
        }
        match r {
            Ok(()) => {
                trace!("{:?} closed", self);
                return Ok(());
            }
            Err(e) => {
                warn!("{:?} close transport err: {}", self, e);
                return Err(StreamError::Rpc(e));
            }
        }
    }
}

impl<T: FrameTransport> Drop for ClientStream<T> {
    fn drop(&mut self) {
        if !self.is_closed() {
            warn!("{:?} dropped without close, connection is not returned", self);
        }
    }
}
