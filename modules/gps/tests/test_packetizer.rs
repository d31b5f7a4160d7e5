use bytes::BytesMut;
use futures::StreamExt;
use gps::packetizer::{Packet, Packetizer, SENTINEL, packetize};
use tokio_util::codec::Decoder;

async fn collect(stream: &[u8]) -> Vec<Packet> {
    packetize(stream)
        .map(|packet| packet.unwrap())
        .collect()
        .await
}

#[test]
fn single_chunk_keeps_last_packet_pending() {
    let mut packetizer = Packetizer::new();
    let mut buf = BytesMut::from(&b"$GPGGA,1\n$GPRMC,2\n"[..]);

    let packet = packetizer.decode(&mut buf).unwrap().unwrap();
    assert_eq!(&*packet, b"$GPGGA,1\n");
    assert!(packetizer.decode(&mut buf).unwrap().is_none());
    assert_eq!(&buf[..], b"$GPRMC,2\n");
}

#[test]
fn first_sentinel_emits_nothing() {
    let mut packetizer = Packetizer::new();
    let mut buf = BytesMut::from(&b"$"[..]);
    assert!(packetizer.decode(&mut buf).unwrap().is_none());
    buf.extend_from_slice(b"GPGGA,1\n");
    assert!(packetizer.decode(&mut buf).unwrap().is_none());
    buf.extend_from_slice(b"$");
    let packet = packetizer.decode(&mut buf).unwrap().unwrap();
    assert_eq!(&*packet, b"$GPGGA,1\n");
}

#[tokio::test]
#[test_log::test]
async fn packets_reconstruct_the_stream() {
    let stream = b"$GPGGA,1\r\n$GPRMC,2\r\n$$GPGSV,3\r\n$GPVTG";
    let packets = collect(stream).await;

    let sentinels = stream.iter().filter(|b| **b == SENTINEL).count();
    // The packet in progress is flushed at the end of the stream.
    assert_eq!(packets.len(), sentinels);
    let joined: Vec<u8> = packets.iter().flat_map(|p| p.iter().copied()).collect();
    assert_eq!(joined, stream);
    assert_eq!(&*packets[2], b"$");
    assert!(!packets[2].is_sentence());
}

#[tokio::test]
#[test_log::test]
async fn bytes_before_first_sentinel_are_no_sentence() {
    let packets = collect(b"\xa0\xa2\x00$GPGGA,1\n").await;
    assert_eq!(packets.len(), 2);
    assert_eq!(&*packets[0], b"\xa0\xa2\x00");
    assert!(!packets[0].is_sentence());
    assert!(packets[1].is_sentence());
}
