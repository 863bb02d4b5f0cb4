//! Integration tests for the WebSocket transport against a real client.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use parlor_transport::{Connection, Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on an OS-assigned port and returns the transport and address.
    async fn bind_any() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind_any().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // JSON text goes out as a text frame.
        server_conn
            .send(br#"{"event":"stateUpdated","data":{}}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(
            msg.into_text().unwrap().as_str(),
            r#"{"event":"stateUpdated","data":{}}"#
        );

        client_ws
            .send(Message::text(r#"{"event":"leaveRoom","data":"r1"}"#.to_owned()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"event":"leaveRoom","data":"r1"}"#.to_vec());

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_non_utf8_goes_out_as_binary() {
        let (mut transport, addr) = bind_any().await;
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        server_conn.send(&[0xff, 0xfe]).await.unwrap();

        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), &[0xff, 0xfe]);
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_any().await;
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }
}
