//! The far side of a connection for end-to-end tests, speaking the frame format directly.

use crate::Codec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tandem_rpc_core::ClientConfig;
use tandem_rpc_core::error::{EOS_SENTINEL, RpcIntErr};
use tandem_rpc_stream::client::Connector;
use tandem_rpc_stream::framed::FramedTransport;
use tandem_rpc_stream::proto::{FrameHeader, FrameType};
use tandem_rpc_stream::transport::FrameTransport;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

pub type DuplexTransport = FramedTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>, Codec>;

pub const DOUBLE: &str = "Calc.Double";
/// Responds 0..n then ends the stream
pub const COUNT: &str = "Calc.Count";
/// Responds with an application error
pub const TRANSFER: &str = "Bank.Transfer";
/// Drops the connection
pub const HANGUP: &str = "Calc.Hangup";

pub const REMOTE_ERR: &str = "insufficient funds";

/// Serve requests until the connection ends, the end-of-stream frames of the client are skipped.
pub async fn serve_calc<T: FrameTransport>(conn: T) {
    loop {
        let header = match conn.read_header().await {
            Ok(header) => header,
            Err(e) => {
                debug!("peer {:?} exit: {}", conn, e);
                return;
            }
        };
        if header.is_eos() {
            if conn.discard_body().await.is_err() {
                return;
            }
            continue;
        }
        let x: i64 = match conn.read_body().await {
            Ok(x) => x,
            Err(e) => {
                warn!("peer {:?} read body err: {}", conn, e);
                return;
            }
        };
        let resp = FrameHeader::new(
            FrameType::Response,
            &header.id,
            &header.service,
            &header.method,
            &header.endpoint,
        );
        let r = match header.endpoint.as_str() {
            DOUBLE => conn.write_frame(&resp, Some(&(x * 2))).await,
            COUNT => count(&conn, &resp, x).await,
            TRANSFER => {
                let mut err = resp.with_error(REMOTE_ERR);
                err.frame_type = FrameType::Error;
                conn.write_frame::<()>(&err, None).await
            }
            _ => return,
        };
        if r.is_err() {
            return;
        }
    }
}

async fn count<T: FrameTransport>(conn: &T, resp: &FrameHeader, n: i64) -> Result<(), RpcIntErr> {
    for i in 0..n {
        conn.write_frame(resp, Some(&i)).await?;
    }
    let mut eos = resp.clone().with_error(EOS_SENTINEL);
    eos.frame_type = FrameType::Error;
    conn.write_frame::<()>(&eos, None).await
}

/// Each connect makes an in-memory pipe with [serve_calc] on the other end.
#[derive(Default)]
pub struct DuplexConnector {
    connects: Arc<AtomicUsize>,
}

impl DuplexConnector {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for DuplexConnector {
    type Transport = DuplexTransport;

    async fn connect(&self, addr: &str, config: &ClientConfig) -> Result<DuplexTransport, RpcIntErr> {
        let n = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (r, w) = tokio::io::split(server);
        let peer: DuplexTransport = FramedTransport::new("peer", r, w, config);
        tokio::spawn(serve_calc(peer));
        let (r, w) = tokio::io::split(client);
        Ok(FramedTransport::new(&format!("{}#{}", addr, n), r, w, config))
    }
}
