use std::time::Duration;

use tokio::io::AsyncWriteExt;
use wicket::http::message::Message;
use wicket::http::method::Method;
use wicket::http::reader::{CHUNK_SIZE, MessageReader, ReadError, ReadLimits};

fn limits() -> ReadLimits {
    ReadLimits {
        read_timeout: Duration::from_secs(2),
        idle_grace: Duration::from_millis(50),
        max_message_size: 64 * 1024,
    }
}

#[tokio::test]
async fn test_reads_message_split_across_writes() {
    let (mut client, mut server) = tokio::io::duplex(16);

    tokio::spawn(async move {
        let parts: [&[u8]; 4] = [
            b"POST /an_end",
            b"point HTTP/1.1\r\nhea",
            b"der: value\r\n\r\nbo",
            b"dy",
        ];
        for part in parts {
            client.write_all(part).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        client.shutdown().await.unwrap();
    });

    let mut reader = MessageReader::new(limits());
    let msg = reader.read_request(&mut server).await.unwrap();

    let expected = Message::request(Method::POST, "/an_endpoint")
        .with_header("header", "value")
        .with_body("body");
    assert_eq!(msg, expected);
}

#[tokio::test]
async fn test_reads_message_larger_than_one_chunk() {
    let body = "x".repeat(CHUNK_SIZE * 3 + 17);
    let raw = format!("PUT /big HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);
    let (mut client, mut server) = tokio::io::duplex(CHUNK_SIZE);

    tokio::spawn(async move {
        client.write_all(raw.as_bytes()).await.unwrap();
        // Keep the stream open: the declared length alone must end the read.
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut reader = MessageReader::new(limits());
    let msg = reader.read_request(&mut server).await.unwrap();

    assert_eq!(msg.body().len(), body.len());
}

#[tokio::test]
async fn test_exact_chunk_boundary_is_not_a_terminator() {
    let header = "GET /aligned HTTP/1.1\r\n\r\n";
    let body = "y".repeat(CHUNK_SIZE - header.len());
    let raw = format!("{header}{body}");
    assert_eq!(raw.len(), CHUNK_SIZE);

    let mut stream = raw.as_bytes();
    let mut reader = MessageReader::new(limits());
    let msg = reader.read_request(&mut stream).await.unwrap();

    assert_eq!(msg.target(), "/aligned");
    assert_eq!(msg.body(), body.as_bytes());
}

#[tokio::test]
async fn test_idle_peer_ends_message_without_length() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    tokio::spawn(async move {
        client
            .write_all(b"GET / HTTP/1.1\r\nhost: localhost\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut reader = MessageReader::new(limits());
    let msg = reader.read_request(&mut server).await.unwrap();

    assert_eq!(msg.method(), Method::GET);
    assert_eq!(msg.header("host"), Some("localhost"));
}

#[tokio::test]
async fn test_stalled_headers_time_out() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    tokio::spawn(async move {
        client.write_all(b"GET / HTTP/1.1\r\nhost: loc").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut reader = MessageReader::new(ReadLimits {
        read_timeout: Duration::from_millis(100),
        ..limits()
    });
    let err = reader.read_raw(&mut server).await.unwrap_err();

    assert!(matches!(err, ReadError::Timeout(_)));
}

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let raw = format!("POST / HTTP/1.1\r\n\r\n{}", "z".repeat(4096));
    let mut stream = raw.as_bytes();

    let mut reader = MessageReader::new(ReadLimits {
        max_message_size: 2048,
        ..limits()
    });
    let err = reader.read_raw(&mut stream).await.unwrap_err();

    assert!(matches!(err, ReadError::TooLarge { limit: 2048 }));
}

#[tokio::test]
async fn test_closed_without_data() {
    let (client, mut server) = tokio::io::duplex(64);
    drop(client);

    let mut reader = MessageReader::new(limits());
    let err = reader.read_raw(&mut server).await.unwrap_err();

    assert!(matches!(err, ReadError::ConnectionClosed));
}

#[tokio::test]
async fn test_reads_response() {
    let mut stream: &[u8] = b"HTTP/1.1 400 Bad Request\r\ncontent-type: application/json\r\n\r\n{}";

    let mut reader = MessageReader::new(limits());
    let msg = reader.read_response(&mut stream).await.unwrap();

    assert_eq!(msg.status_code(), 400);
    assert_eq!(msg.status_reason(), "Bad Request");
    assert_eq!(msg.body(), b"{}");
}

#[tokio::test]
async fn test_overflowing_content_length_is_rejected() {
    let mut stream: &[u8] = b"POST /x HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\nbody";

    let mut reader = MessageReader::new(limits());
    let res = reader.read_request(&mut stream).await;

    assert!(matches!(res, Err(ReadError::TooLarge { limit: 65536 })));
}

#[tokio::test]
async fn test_declared_length_over_limit_fails_without_waiting() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    tokio::spawn(async move {
        client
            .write_all(b"PUT /x HTTP/1.1\r\nContent-Length: 100000\r\n\r\nstart")
            .await
            .unwrap();
        // Never send the rest; the declared size alone must be refused.
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut reader = MessageReader::new(limits());
    let res = tokio::time::timeout(Duration::from_millis(500), reader.read_raw(&mut server))
        .await
        .expect("reader waited for bytes that can never fit");

    assert!(matches!(res, Err(ReadError::TooLarge { .. })));
}
