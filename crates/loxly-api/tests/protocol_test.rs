#![allow(clippy::unwrap_used)]
// Integration tests driving the wire codecs the way a transport would:
// header, payload, header, payload, out of one contiguous buffer.

use bytes::{Buf, BufMut, BytesMut};
use serde_json::json;

use loxly_api::event::{decode_text_states, decode_value_states};
use loxly_api::{
    CommandKind, CommandResponse, Error, Id128, MessageHeader, MessageInfo, MessageKind,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn push_frame(stream: &mut BytesMut, kind_raw: u8, payload: &[u8]) {
    stream.put_u8(0x03);
    stream.put_u8(kind_raw);
    stream.put_u8(0);
    stream.put_u8(0);
    stream.put_u32_le(u32::try_from(payload.len()).unwrap());
    stream.put_slice(payload);
}

fn take_payload(stream: &mut BytesMut, header: &MessageHeader) -> bytes::Bytes {
    stream.split_to(usize::try_from(header.length).unwrap()).freeze()
}

// ── Stream tests ────────────────────────────────────────────────────

#[test]
fn test_mixed_stream_stays_aligned() {
    let sensor: Id128 = "0e839a0b-00d8-1ab1-ffffa1b98ee6c71d".parse().unwrap();
    let body = json!({
        "LL": {
            "control": "dev/sps/LoxAPPversion3",
            "value": "2024-03-01 08:00:00",
            "Code": "200"
        }
    })
    .to_string();

    let mut values = BytesMut::new();
    sensor.write_le(&mut values);
    values.put_f64_le(42.0);

    let mut stream = BytesMut::new();
    push_frame(&mut stream, 0, body.as_bytes());
    push_frame(&mut stream, 0x7F, b"future payload");
    push_frame(&mut stream, 2, &values);
    push_frame(&mut stream, 6, &[]);

    // text message
    let header = MessageHeader::decode(&mut stream).unwrap();
    assert_eq!(header.kind, MessageKind::TextMessage);
    let payload = take_payload(&mut stream, &header);
    let resp = CommandResponse::parse(std::str::from_utf8(&payload).unwrap()).unwrap();
    assert_eq!(resp.kind, Some(CommandKind::StructureFileLastModifiedDate));

    // unknown kind: skip its payload using the reported length
    let err = MessageHeader::decode(&mut stream).unwrap_err();
    let Error::UnknownMessageKind { raw, length } = err else {
        panic!("expected unknown kind, got {err:?}");
    };
    assert_eq!(raw, 0x7F);
    stream.advance(usize::try_from(length).unwrap());

    // value table
    let header = MessageHeader::decode(&mut stream).unwrap();
    assert!(header.kind.is_event_table());
    let mut payload = take_payload(&mut stream, &header);
    let states = decode_value_states(&mut payload).unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].uuid, sensor);
    assert!((states[0].value - 42.0).abs() < f64::EPSILON);

    // keepalive has no payload
    let header = MessageHeader::decode(&mut stream).unwrap();
    assert_eq!(header.kind, MessageKind::Keepalive);
    assert_eq!(header.length, 0);
    assert!(stream.is_empty());
}

#[test]
fn test_partial_header_waits_for_more_bytes() {
    let mut stream = BytesMut::new();
    stream.put_slice(&[0x03, 0x03, 0x01]);
    let err = MessageHeader::decode(&mut stream).unwrap_err();
    assert!(err.is_incomplete());
    assert_eq!(stream.len(), 3);

    stream.put_slice(&[0x00, 0x24, 0x00, 0x00, 0x00]);
    let header = MessageHeader::decode(&mut stream).unwrap();
    assert_eq!(header.kind, MessageKind::EventTableTextStates);
    assert!(header.info.contains(MessageInfo::ESTIMATED_SIZE));
    assert_eq!(header.length, 36);
}

#[test]
fn test_text_table_after_header() {
    let id = Id128::from_u128(0x1234);
    let mut table = BytesMut::new();
    id.write_le(&mut table);
    Id128::NIL.write_le(&mut table);
    table.put_u32_le(2);
    table.put_slice(b"on\0\0");

    let mut stream = BytesMut::new();
    push_frame(&mut stream, 3, &table);
    let header = MessageHeader::decode(&mut stream).unwrap();
    let mut payload = take_payload(&mut stream, &header);
    let states = decode_text_states(&mut payload).unwrap();
    assert_eq!(states[0].uuid, id);
    assert_eq!(states[0].text, "on");
}

// ── Command tests ───────────────────────────────────────────────────

#[test]
fn test_io_command_round_trip() {
    let target = Id128::from_u128(0xABCD).encode();
    let sent = CommandKind::IoControl.command_text(&[&target, "pulse"]);
    assert!(sent.starts_with("jdev/sps/io/"));

    // the reply drops the leading "j"
    let echoed = sent.trim_start_matches('j');
    let (kind, args) = CommandKind::resolve_with_args(echoed).unwrap();
    assert_eq!(kind, CommandKind::IoControl);
    assert_eq!(args, vec![target.as_str(), "pulse"]);
}
