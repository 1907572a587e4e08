use std::time::Duration;

/// Client-side settings shared by the framed transport, the connector and the pool.
///
/// A zero timeout disables the corresponding bound.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// socket read timeout, applied to each header or body read
    pub read_timeout: Duration,
    /// Socket write timeout
    pub write_timeout: Duration,
    /// connect timeout
    pub connect_timeout: Duration,
    /// Capacity of the buffered writer of a connection
    pub stream_buf_size: usize,
    /// Max idle connections kept per address
    pub pool_size: usize,
    /// Idle connection older than this is discarded on checkout
    pub pool_ttl: Duration,
    /// Frame meta or body larger than this is rejected on read
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            stream_buf_size: 8 * 1024,
            pool_size: 8,
            pool_ttl: Duration::from_secs(60),
            max_frame_size: 4 * 1024 * 1024,
        }
    }
}
