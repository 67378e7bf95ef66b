use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wicket::http::message::Message;
use wicket::server::listener::{AcceptError, Listener};

#[tokio::test]
async fn test_close_handle_wakes_pending_accept() {
    let mut listener = Listener::new("127.0.0.1:0");
    listener.listen().await.unwrap();
    let handle = listener.close_handle();

    let pending = tokio::spawn(async move {
        let res = listener.accept().await;
        (res.err(), listener.is_open())
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.close();

    let (err, open) = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("accept was not woken")
        .unwrap();
    assert!(matches!(err, Some(AcceptError::Closed)));
    assert!(!open);
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mut listener = Listener::new("127.0.0.1:0");
    let addr = listener.listen().await.unwrap();
    assert!(listener.is_open());
    assert_eq!(listener.local_addr(), Some(addr));

    listener.close();
    listener.close();

    assert!(!listener.is_open());
    assert_eq!(listener.local_addr(), None);
    assert!(matches!(listener.accept().await, Err(AcceptError::Closed)));
}

#[tokio::test]
async fn test_unbound_listener_does_not_accept() {
    let mut listener = Listener::new("127.0.0.1:0");

    assert!(!listener.is_open());
    assert!(matches!(listener.accept().await, Err(AcceptError::Closed)));
}

#[tokio::test]
async fn test_listen_fails_on_busy_port() {
    let mut first = Listener::new("127.0.0.1:0");
    let addr = first.listen().await.unwrap();

    let mut second = Listener::new(addr.to_string());
    assert!(second.listen().await.is_err());
}

#[tokio::test]
async fn test_listen_fails_on_bad_address() {
    let mut listener = Listener::new("not an address");
    assert!(listener.listen().await.is_err());
}

#[tokio::test]
async fn test_accepted_connection_round_trip() {
    let mut listener = Listener::new("127.0.0.1:0");
    let addr = listener.listen().await.unwrap();

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"OPTIONS * HTTP/1.1\r\nhost: here\r\n\r\n")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();

        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    });

    let mut conn = listener.accept().await.unwrap();
    let request = conn.receive().await.unwrap();
    assert_eq!(request.target(), "*");
    assert_eq!(request.header("host"), Some("here"));

    conn.send(&Message::response(204)).await.unwrap();
    conn.close().await;
    conn.close().await;
    assert!(!conn.is_open());
    assert!(conn.send(&Message::response(200)).await.is_err());

    assert_eq!(client.await.unwrap(), "HTTP/1.1 204 No Content\r\n\r\n");
}
