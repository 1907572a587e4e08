use super::*;
use crate::spy::Op;
use crate::*;
use tandem_rpc_core::error::{EOS_SENTINEL, RpcIntErr};

#[rstest]
fn test_closed_rejects(runner: TestRunner) {
    runner.block_on(async move {
        let (stream, spy, _released) = spy_stream(true);
        stream.close().await.expect("close");
        assert!(stream.is_closed());
        let ops = spy.ops();

        let mut out = Point::default();
        for _ in 0..2 {
            assert_eq!(stream.send(&Point { x: 1 }).await, Err(StreamError::Closed));
            assert_eq!(stream.recv(&mut out).await, Err(StreamError::Closed));
        }
        assert_eq!(spy.ops(), ops);
    });
}

#[rstest]
fn test_close_idempotent(runner: TestRunner) {
    runner.block_on(async move {
        let (stream, spy, released) = spy_stream(true);
        assert_eq!(stream.close().await, Ok(()));
        assert_eq!(stream.close().await, Ok(()));
        assert_eq!(stream.close().await, Ok(()));
        assert_eq!(released.lock().len(), 1);
        assert_eq!(spy.count(Op::Close), 1);
        assert_eq!(spy.count(Op::Write), 1);
    });
}

#[rstest]
fn test_concurrent_close(runner: TestRunner) {
    runner.block_on(async move {
        let (stream, spy, released) = spy_stream(true);
        let stream = Arc::new(stream);
        let mut ths = Vec::new();
        for _ in 0..8 {
            let _stream = stream.clone();
            ths.push(tokio::spawn(async move { _stream.close().await }));
        }
        for r in futures::future::join_all(ths).await {
            assert_eq!(r.expect("join"), Ok(()));
        }
        assert_eq!(released.lock().len(), 1);
        assert_eq!(spy.count(Op::Close), 1);
    });
}

#[rstest]
#[case(true, vec![Op::Write, Op::Close])]
#[case(false, vec![Op::Close])]
fn test_eos_on_close(runner: TestRunner, #[case] send_eos: bool, #[case] expect_ops: Vec<Op>) {
    runner.block_on(async move {
        let (stream, spy, _released) = spy_stream(send_eos);
        stream.close().await.expect("close");
        assert_eq!(spy.ops(), expect_ops);
        let headers = spy.written_headers();
        if send_eos {
            assert_eq!(headers.len(), 1);
            assert_eq!(headers[0].frame_type, FrameType::Error);
            assert_eq!(headers[0].error, EOS_SENTINEL);
            assert_eq!(headers[0].id, STREAM_ID);
            assert_eq!(spy.written_body::<()>(0), None);
        } else {
            assert!(headers.is_empty());
        }
    });
}

#[rstest]
fn test_eos_write_failure_ignored(runner: TestRunner) {
    runner.block_on(async move {
        let (stream, spy, released) = spy_stream(true);
        spy.fail_write(Some(RpcIntErr::IO));
        assert_eq!(stream.close().await, Ok(()));
        assert_eq!(spy.ops(), vec![Op::Write, Op::Close]);
        // The stream error is untouched by the terminator
        assert_eq!(*released.lock(), vec![None]);
    });
}

#[rstest]
fn test_close_returns_transport_error(runner: TestRunner) {
    runner.block_on(async move {
        let (stream, spy, released) = spy_stream(false);
        spy.fail_close(Some(RpcIntErr::Timeout));
        assert_eq!(stream.close().await, Err(StreamError::Rpc(RpcIntErr::Timeout)));
        assert_eq!(*released.lock(), vec![None]);
        assert!(stream.is_closed());
        assert_eq!(stream.close().await, Ok(()));
    });
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Ok,
    SendFail,
    DecodeFail,
    RecvEof,
}

#[rstest]
#[case(Outcome::Ok, None)]
#[case(Outcome::SendFail, Some(StreamError::Rpc(RpcIntErr::IO)))]
#[case(Outcome::DecodeFail, Some(StreamError::Rpc(RpcIntErr::Decode)))]
#[case(Outcome::RecvEof, Some(StreamError::UnexpectedEof))]
fn test_release_always_fires(
    runner: TestRunner, #[case] outcome: Outcome, #[case] expect: Option<StreamError>,
) {
    runner.block_on(async move {
        let (stream, spy, released) = spy_stream(false);
        let mut out = Point::default();
        match outcome {
            Outcome::Ok => {
                spy.push_frame(response(""), Some(&Point { x: 9 }));
                stream.send(&Point { x: 1 }).await.expect("send");
                stream.recv(&mut out).await.expect("recv");
            }
            Outcome::SendFail => {
                spy.fail_write(Some(RpcIntErr::IO));
                assert!(stream.send(&Point { x: 1 }).await.is_err());
            }
            Outcome::DecodeFail => {
                spy.push_frame(response(""), Some(&"garbage"));
                assert!(stream.recv(&mut out).await.is_err());
            }
            Outcome::RecvEof => {
                assert!(stream.recv(&mut out).await.is_err());
            }
        }
        stream.close().await.expect("close");
        let _ = stream.close().await;
        assert_eq!(*released.lock(), vec![expect]);
    });
}

#[derive(Debug, Clone, Copy)]
enum Progress {
    Idle,
    Partial,
    Ended,
    Unary,
}

#[rstest]
#[case(Progress::Idle, true, true)]
#[case(Progress::Partial, true, false)]
#[case(Progress::Ended, true, true)]
#[case(Progress::Unary, false, true)]
#[case(Progress::Partial, false, false)]
fn test_close_keeps_conn_only_when_drained(
    runner: TestRunner, #[case] progress: Progress, #[case] send_eos: bool, #[case] healthy: bool,
) {
    runner.block_on(async move {
        let (stream, spy, _released) = spy_stream(send_eos);
        let mut out = Point::default();
        match progress {
            Progress::Idle => {}
            Progress::Partial => {
                stream.send(&Point { x: 1 }).await.expect("send");
            }
            Progress::Ended => {
                spy.push_frame(response(""), Some(&Point { x: 2 }));
                spy.push_frame::<()>(response(EOS_SENTINEL), None);
                stream.send(&Point { x: 1 }).await.expect("send");
                stream.recv(&mut out).await.expect("recv");
                assert_eq!(stream.recv(&mut out).await, Err(StreamError::EndOfStream));
            }
            Progress::Unary => {
                spy.push_frame(response(""), Some(&Point { x: 2 }));
                stream.send(&Point { x: 1 }).await.expect("send");
                stream.recv(&mut out).await.expect("recv");
            }
        }
        stream.close().await.expect("close");
        assert_eq!(spy.is_healthy(), healthy);
    });
}
