use crate::Codec;
use serde::{Deserialize, Serialize};
use tandem_rpc_core::error::RpcIntErr;

/// MessagePack codec, structs are encoded as maps so fields can be added on either side.
#[derive(Default, Debug, Clone, Copy)]
pub struct MsgpCodec();

impl Codec for MsgpCodec {
    #[inline(always)]
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, RpcIntErr> {
        match rmp_serde::encode::to_vec_named(msg) {
            Ok(buf) => return Ok(buf),
            Err(e) => {
                log::error!("msgpack encode error: {:?}", e);
                return Err(RpcIntErr::Encode);
            }
        }
    }

    fn encode_into<T: Serialize>(&self, msg: &T, buf: &mut Vec<u8>) -> Result<usize, RpcIntErr> {
        let pre_len = buf.len();
        if let Err(e) = rmp_serde::encode::write_named(buf, msg) {
            log::error!("msgpack encode error: {:?}", e);
            // Drop what was partially written
            buf.truncate(pre_len);
            return Err(RpcIntErr::Encode);
        }
        Ok(buf.len() - pre_len)
    }

    #[inline(always)]
    fn decode<'a, T: Deserialize<'a>>(&self, buf: &'a [u8]) -> Result<T, RpcIntErr> {
        match rmp_serde::decode::from_slice::<T>(buf) {
            Err(e) => {
                log::warn!("msgpack decode error: {:?}", e);
                return Err(RpcIntErr::Decode);
            }
            Ok(s) => return Ok(s),
        }
    }
}
