extern crate tandem_rpc_stream;
#[macro_use]
extern crate log;

pub mod peer;

use rstest::*;
use std::fmt;
use std::future::Future;
use tokio::runtime::Runtime;

pub type Codec = tandem_rpc_codec::MsgpCodec;

#[fixture]
pub fn runner() -> TestRunner {
    TestRunner::new()
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "")
    }
}

pub struct TestRunner {
    rt: Runtime,
}

impl TestRunner {
    pub fn new() -> Self {
        // Only the first runner of the process installs the logger
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Trace)
            .format_timestamp_micros()
            .try_init();
        Self {
            rt: tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .enable_all()
                .build()
                .expect("runtime"),
        }
    }

    pub fn block_on<F: Future<Output = ()> + Send + 'static>(&self, f: F) {
        self.rt.block_on(f);
    }
}

#[cfg(test)]
mod tests;
