//! [FramedTransport] speaks the frame format of [proto](crate::proto) over any tokio byte stream.

use crate::proto::{FRAME_HEAD_LEN, FrameHead, FrameHeader};
use crate::transport::FrameTransport;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tandem_rpc_core::io::{Cancellable, io_with_timeout};
use tandem_rpc_core::{ClientConfig, Codec, error::RpcIntErr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{Mutex, Notify};

struct FrameReader<R> {
    inner: R,
    /// body bytes of the last header not consumed yet
    pending_body: usize,
    buf: Vec<u8>,
}

struct FrameWriter<W> {
    inner: BufWriter<W>,
    buf: Vec<u8>,
}

/// A [FrameTransport] over a pair of read and write halves.
///
/// The halves sit behind separate locks, a write is never blocked by a pending read.
/// Waiting for the next frame head is unbounded (streams may idle), it is aborted by
/// [close](FrameTransport::close). Meta and body reads are bounded by `read_timeout`,
/// writes by `write_timeout`.
pub struct FramedTransport<R, W, C: Codec> {
    reader: Mutex<FrameReader<R>>,
    writer: Mutex<FrameWriter<W>>,
    codec: C,
    read_timeout: Duration,
    write_timeout: Duration,
    max_frame_size: usize,
    conn_id: String,
    broken: AtomicBool,
    close_noti: Notify,
}

impl<R, W, C: Codec> fmt::Debug for FramedTransport<R, W, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "conn {}", self.conn_id)
    }
}

impl<R, W, C> FramedTransport<R, W, C>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    C: Codec,
{
    /// conn_id: used for log fmt, can be the same as addr.
    pub fn new(conn_id: &str, reader: R, writer: W, config: &ClientConfig) -> Self {
        Self {
            reader: Mutex::new(FrameReader { inner: reader, pending_body: 0, buf: Vec::new() }),
            writer: Mutex::new(FrameWriter {
                inner: BufWriter::with_capacity(config.stream_buf_size, writer),
                buf: Vec::with_capacity(256),
            }),
            codec: C::default(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            max_frame_size: config.max_frame_size,
            conn_id: conn_id.to_string(),
            broken: AtomicBool::new(false),
            close_noti: Notify::new(),
        }
    }

    #[inline(always)]
    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    #[inline(always)]
    pub fn get_codec(&self) -> &C {
        &self.codec
    }

    #[inline]
    fn set_broken(&self, e: RpcIntErr) -> RpcIntErr {
        if e != RpcIntErr::Decode {
            self.broken.store(true, Ordering::SeqCst);
        }
        e
    }

    #[inline]
    fn check_frame_len(&self, len: usize) -> Result<(), RpcIntErr> {
        if len > self.max_frame_size {
            warn!("{:?} frame section of {} bytes exceeds limit {}", self, len, self.max_frame_size);
            // The oversized bytes are never consumed
            self.broken.store(true, Ordering::SeqCst);
            return Err(RpcIntErr::Decode);
        }
        Ok(())
    }

    async fn skip_body(&self, reader: &mut FrameReader<R>) -> Result<(), RpcIntErr> {
        let len = reader.pending_body;
        if len == 0 {
            return Ok(());
        }
        reader.pending_body = 0;
        let inner = &mut reader.inner;
        let mut body = inner.take(len as u64);
        match io_with_timeout!(self.read_timeout, tokio::io::copy(&mut body, &mut tokio::io::sink()))
        {
            Ok(n) if n as usize == len => Ok(()),
            Ok(n) => {
                warn!("{:?} skip body ended at {} of {} bytes", self, n, len);
                Err(self.set_broken(RpcIntErr::IO))
            }
            Err(e) => {
                warn!("{:?} skip body err: {}", self, e);
                Err(self.set_broken(e.into()))
            }
        }
    }
}

/// Fill `buf` with a frame head, a clean end of input before the first byte is [RpcIntErr::Eof].
async fn read_head<R: AsyncRead + Unpin>(
    r: &mut R, buf: &mut [u8; FRAME_HEAD_LEN],
) -> Result<(), RpcIntErr> {
    let mut offset = 0;
    while offset < FRAME_HEAD_LEN {
        match r.read(&mut buf[offset..]).await {
            Ok(0) => {
                if offset == 0 {
                    return Err(RpcIntErr::Eof);
                }
                return Err(RpcIntErr::IO);
            }
            Ok(n) => offset += n,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

impl<R, W, C> FrameTransport for FramedTransport<R, W, C>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    C: Codec,
{
    async fn write_frame<M: Serialize + Sync>(
        &self, header: &FrameHeader, body: Option<&M>,
    ) -> Result<(), RpcIntErr> {
        let mut guard = self.writer.lock().await;
        let FrameWriter { inner, buf } = &mut *guard;
        header.encode_frame(&self.codec, body, self.max_frame_size, buf)?;
        let r = io_with_timeout!(self.write_timeout, async {
            match inner.write_all(buf).await {
                Ok(()) => inner.flush().await,
                Err(e) => Err(e),
            }
        });
        match r {
            Ok(()) => {
                trace!("{:?} write frame {}", self, header);
                Ok(())
            }
            Err(e) => {
                warn!("{:?} write frame {} err: {}", self, header, e);
                Err(self.set_broken(e.into()))
            }
        }
    }

    async fn read_header(&self) -> Result<FrameHeader, RpcIntErr> {
        let mut guard = self.reader.lock().await;
        self.skip_body(&mut guard).await?;
        let reader = &mut *guard;
        let mut head_buf = [0u8; FRAME_HEAD_LEN];
        match Cancellable::new(read_head(&mut reader.inner, &mut head_buf), self.close_noti.notified())
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if e != RpcIntErr::Eof {
                    warn!("{:?} read head err: {}", self, e);
                }
                return Err(self.set_broken(e));
            }
            Err(()) => {
                debug!("{:?} read head aborted by close", self);
                // Part of a head may have been consumed
                return Err(self.set_broken(RpcIntErr::Eof));
            }
        }
        let head = match FrameHead::decode(&head_buf) {
            Ok(head) => head,
            Err(e) => return Err(self.set_broken(e)),
        };
        let meta_len = head.meta_len.get() as usize;
        let body_len = head.body_len.get() as usize;
        self.check_frame_len(meta_len)?;
        self.check_frame_len(body_len)?;
        reader.buf.resize(meta_len, 0);
        if let Err(e) = io_with_timeout!(self.read_timeout, reader.inner.read_exact(&mut reader.buf))
        {
            warn!("{:?} read meta err: {}", self, e);
            return Err(self.set_broken(e.into()));
        }
        // The body stays pending even if the meta is garbage, the next header skips it.
        reader.pending_body = body_len;
        let header = FrameHeader::decode_meta(&self.codec, &head, &reader.buf)?;
        trace!("{:?} read header {} {}", self, header, head);
        Ok(header)
    }

    async fn read_body<M: DeserializeOwned + Send>(&self) -> Result<M, RpcIntErr> {
        let mut guard = self.reader.lock().await;
        let FrameReader { inner, pending_body, buf } = &mut *guard;
        let len = *pending_body;
        *pending_body = 0;
        buf.resize(len, 0);
        if len > 0 {
            if let Err(e) = io_with_timeout!(self.read_timeout, inner.read_exact(buf)) {
                warn!("{:?} read body err: {}", self, e);
                return Err(self.set_broken(e.into()));
            }
        }
        match self.codec.decode::<M>(buf) {
            Ok(msg) => Ok(msg),
            Err(e) => {
                debug!("{:?} decode body of {} bytes failed", self, len);
                Err(e)
            }
        }
    }

    async fn discard_body(&self) -> Result<(), RpcIntErr> {
        let mut guard = self.reader.lock().await;
        self.skip_body(&mut guard).await
    }

    async fn close(&self) -> Result<(), RpcIntErr> {
        self.close_noti.notify_waiters();
        let mut guard = self.writer.lock().await;
        if let Err(e) = io_with_timeout!(self.write_timeout, guard.inner.flush()) {
            warn!("{:?} flush on close err: {}", self, e);
            return Err(self.set_broken(e.into()));
        }
        Ok(())
    }

    #[inline(always)]
    fn is_healthy(&self) -> bool {
        !self.broken.load(Ordering::SeqCst)
    }

    #[inline(always)]
    fn mark_unhealthy(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}
