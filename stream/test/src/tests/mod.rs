use crate::spy::SpyTransport;
use parking_lot::Mutex;
use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;
use tandem_rpc_core::CallContext;
use tandem_rpc_core::error::StreamError;
use tandem_rpc_stream::client::{CallRequest, ClientStream};
use tandem_rpc_stream::proto::{FrameHeader, FrameType};
use tandem_rpc_stream::transport::FrameTransport;

mod test_close;

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
pub struct Point {
    pub x: i32,
}

pub const STREAM_ID: &str = "7";

/// Every final error the release hook was called with
pub type Released = Arc<Mutex<Vec<Option<StreamError>>>>;

pub fn spy_stream(send_eos: bool) -> (ClientStream<SpyTransport>, Arc<SpyTransport>, Released) {
    let spy = Arc::new(SpyTransport::new());
    let released: Released = Arc::new(Mutex::new(Vec::new()));
    let _released = released.clone();
    let request = CallRequest::new("geo", "Geo.Move").streaming(send_eos);
    let stream = ClientStream::new(
        STREAM_ID.to_string(),
        request,
        CallContext::new(),
        spy.clone(),
        send_eos,
        Box::new(move |err| _released.lock().push(err)),
    );
    (stream, spy, released)
}

pub fn response(error: &str) -> FrameHeader {
    let frame_type = if error.is_empty() { FrameType::Response } else { FrameType::Error };
    FrameHeader::new(frame_type, STREAM_ID, "geo", "Geo.Move", "Geo.Move").with_error(error)
}
