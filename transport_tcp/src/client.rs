use std::fmt;
use std::marker::PhantomData;
use tandem_rpc_core::io::io_with_timeout;
use tandem_rpc_core::{ClientConfig, Codec, error::RpcIntErr};
use tandem_rpc_stream::client::Connector;
use tandem_rpc_stream::framed::FramedTransport;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// A framed TCP connection
pub type TcpTransport<C> = FramedTransport<OwnedReadHalf, OwnedWriteHalf, C>;

/// Dials TCP connections for a [StreamClient](tandem_rpc_stream::client::StreamClient).
pub struct TcpConnector<C: Codec> {
    _phan: PhantomData<fn(&C)>,
}

impl<C: Codec> TcpConnector<C> {
    pub fn new() -> Self {
        Self { _phan: PhantomData }
    }
}

impl<C: Codec> Default for TcpConnector<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> fmt::Debug for TcpConnector<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tcp connector")
    }
}

impl<C: Codec> Connector for TcpConnector<C> {
    type Transport = TcpTransport<C>;

    async fn connect(&self, addr: &str, config: &ClientConfig) -> Result<TcpTransport<C>, RpcIntErr> {
        let stream = match io_with_timeout!(config.connect_timeout, TcpStream::connect(addr)) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("connect {} err: {}", addr, e);
                return Err(RpcIntErr::Unreachable);
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            warn!("set nodelay on {} err: {}", addr, e);
        }
        let conn_id = match stream.local_addr() {
            Ok(local) => format!("{}->{}", local, addr),
            Err(_) => addr.to_string(),
        };
        let (reader, writer) = stream.into_split();
        debug!("connected {}", conn_id);
        Ok(FramedTransport::new(&conn_id, reader, writer, config))
    }
}
