//! End-to-end pipeline tests: a session over a socketpair, framed by each
//! strategy, exercised the way a device consumer would.

use std::io::Write;
use std::os::unix::net::UnixStream;

use serialkit::frame::{
    CustomFramer, DelimiterFramer, Endianness, LengthPrefixedConfig, LengthPrefixedFramer,
    ParsedPacket, StartEndMarkerFramer,
};
use serialkit::session::{Session, SessionError};

fn socket_session() -> (Session, UnixStream) {
    let (ours, theirs) = UnixStream::pair().expect("socketpair");
    let reader = ours.try_clone().expect("clone for reader");
    let session = Session::from_parts(Box::new(reader), Box::new(ours));
    (session, theirs)
}

#[tokio::test]
async fn delimiter_pipeline_end_to_end() {
    let (session, mut peer) = socket_session();
    peer.write_all(b"sensor=1\nsensor=2\n").unwrap();
    peer.write_all(b"sensor=3\ntrailing").unwrap();
    drop(peer);

    let mut packets = session
        .packets(DelimiterFramer::new(*b"\n").unwrap())
        .unwrap();

    let mut received = Vec::new();
    while let Some(item) = packets.recv().await {
        received.push(item.unwrap());
    }

    assert_eq!(received.len(), 3);
    assert_eq!(received[0].as_ref(), b"sensor=1");
    assert_eq!(received[2].as_ref(), b"sensor=3");
}

#[tokio::test]
async fn length_prefixed_pipeline_end_to_end() {
    let (session, mut peer) = socket_session();
    peer.write_all(&[0x00, 0x03, 0xAA, 0xBB, 0xCC]).unwrap();
    peer.write_all(&[0x00, 0x01, 0xDD]).unwrap();
    drop(peer);

    let config = LengthPrefixedConfig {
        header_size: 2,
        length_field_offset: 0,
        length_field_size: 2,
        endianness: Endianness::Big,
        length_includes_header: false,
    };
    let mut packets = session
        .packets(LengthPrefixedFramer::new(config).unwrap())
        .unwrap();

    let first = packets.recv().await.unwrap().unwrap();
    assert_eq!(first.as_ref(), &[0x00, 0x03, 0xAA, 0xBB, 0xCC]);
    let second = packets.recv().await.unwrap().unwrap();
    assert_eq!(second.as_ref(), &[0x00, 0x01, 0xDD]);
    assert!(packets.recv().await.is_none());
}

#[tokio::test]
async fn marker_pipeline_drops_interleaved_noise() {
    let (session, mut peer) = socket_session();
    peer.write_all(b"garbage<<one>>more garbage<<two>>").unwrap();
    drop(peer);

    let mut packets = session
        .packets(StartEndMarkerFramer::new(*b"<<", *b">>", false).unwrap())
        .unwrap();

    let first = packets.recv().await.unwrap().unwrap();
    assert_eq!(first.as_ref(), b"one");
    let second = packets.recv().await.unwrap().unwrap();
    assert_eq!(second.as_ref(), b"two");
    assert!(packets.recv().await.is_none());
}

#[tokio::test]
async fn custom_parser_pipeline_end_to_end() {
    let (session, mut peer) = socket_session();
    // [len, payload...] frames.
    peer.write_all(&[2, 0x10, 0x20, 3, 0x30, 0x40, 0x50]).unwrap();
    drop(peer);

    let parser = |buf: &[u8]| {
        let len = *buf.first()? as usize;
        if buf.len() < 1 + len {
            return None;
        }
        Some(ParsedPacket {
            packet: bytes::Bytes::copy_from_slice(&buf[1..1 + len]),
            consumed: 1 + len,
        })
    };
    let mut packets = session.packets(CustomFramer::new(parser)).unwrap();

    let first = packets.recv().await.unwrap().unwrap();
    assert_eq!(first.as_ref(), &[0x10, 0x20]);
    let second = packets.recv().await.unwrap().unwrap();
    assert_eq!(second.as_ref(), &[0x30, 0x40, 0x50]);
    assert!(packets.recv().await.is_none());
}

#[tokio::test]
async fn packet_stream_is_not_restartable() {
    let (session, _peer) = socket_session();
    let _packets = session
        .packets(DelimiterFramer::new(*b"\n").unwrap())
        .unwrap();
    let err = session
        .packets(DelimiterFramer::new(*b"\n").unwrap())
        .unwrap_err();
    assert!(matches!(err, SessionError::StreamTaken));
}

#[tokio::test]
async fn write_then_read_full_duplex() {
    let (session, mut peer) = socket_session();

    session.write(&b"AT+STATUS\r\n"[..]).await.unwrap();

    let mut request = [0u8; 11];
    std::io::Read::read_exact(&mut peer, &mut request).unwrap();
    assert_eq!(&request, b"AT+STATUS\r\n");

    peer.write_all(b"OK\r\n").unwrap();
    drop(peer);

    let mut packets = session
        .packets(DelimiterFramer::new(*b"\r\n").unwrap())
        .unwrap();
    let reply = packets.recv().await.unwrap().unwrap();
    assert_eq!(reply.as_ref(), b"OK");

    assert_eq!(session.bytes_written(), 11);
    assert_eq!(session.bytes_read(), 4);
}
