// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;
use keel_core::{CommandEvent, CommandMetadata};

#[test]
fn request_is_tagged_by_type() {
    let request = Request::Peek {
        org: "acme".to_string(),
        cluster: "eu-1".to_string(),
    };

    let encoded = encode(&request).expect("encode failed");
    let value: serde_json::Value = serde_json::from_slice(&encoded).expect("valid JSON");

    assert_eq!(value["type"], "Peek");
    assert_eq!(decode::<Request>(&encoded).expect("decode failed"), request);
}

#[test]
fn enqueue_command_carries_the_packet() {
    let request = Request::EnqueueCommand {
        org: "acme".to_string(),
        cluster: "eu-1".to_string(),
        packet: CommandPacket::new(
            "apps",
            CommandEvent::DeployNamedApp {
                meta: CommandMetadata::default(),
                app_name: "storefront".to_string(),
            },
        ),
    };

    let encoded = encode(&request).expect("encode failed");
    let decoded: Request = decode(&encoded).expect("decode failed");

    assert_eq!(request, decoded);
}

#[test]
fn optional_fields_default() {
    let decoded: Request = decode(
        br#"{"type":"PipelineStatus","pipeline":{"org":"acme","team":"web","pipeline":"shop"}}"#,
    )
    .expect("decode failed");

    assert_eq!(
        decoded,
        Request::PipelineStatus {
            pipeline: PipelineRef::new("acme", "web", "shop"),
            uvn: None,
        }
    );
}

#[test]
fn error_response_defaults_to_not_bad_request() {
    let decoded: Response =
        decode(br#"{"type":"Error","message":"boom"}"#).expect("decode failed");

    assert_eq!(
        decoded,
        Response::Error {
            message: "boom".to_string(),
            bad_request: false,
        }
    );
}

#[test]
fn unknown_request_type_is_rejected() {
    let err = decode::<Request>(br#"{"type":"Launch"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::Json(_)));
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    // First 4 bytes are the length prefix
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");
    assert_eq!(read_back, data);
}

#[tokio::test]
async fn empty_stream_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn oversized_length_is_rejected() {
    let prefix = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
    let mut cursor = std::io::Cursor::new(prefix);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge(_)));
}

#[tokio::test(start_paused = true)]
async fn read_request_times_out() {
    let (_client, mut server) = tokio::io::duplex(64);
    let err = read_request(&mut server, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}

#[tokio::test]
async fn request_response_over_a_stream() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    let data = encode(&Request::Ping).expect("encode failed");
    write_message(&mut client, &data).await.expect("write failed");
    let request = read_request(&mut server, DEFAULT_TIMEOUT)
        .await
        .expect("read failed");
    assert_eq!(request, Request::Ping);

    write_response(&mut server, &Response::Pong, DEFAULT_TIMEOUT)
        .await
        .expect("write failed");
    let response: Response = decode(&read_message(&mut client).await.expect("read failed"))
        .expect("decode failed");
    assert_eq!(response, Response::Pong);
}
