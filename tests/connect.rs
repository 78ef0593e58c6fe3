//! Handshake/auth and `ping` against the fake server harness.

mod support;

use myproto_mysql::{ClientOptions, Connection, Error};
use support::{handshake_err, handshake_ok, ok_packet, read_frame, server_capabilities, write_frame};

#[tokio::test]
async fn connects_and_pings() {
    let (client_half, mut server_half) = tokio::io::duplex(8192);
    let caps = server_capabilities();

    let server = tokio::spawn(async move {
        handshake_ok(&mut server_half, caps).await;

        // COM_PING
        let (_seq, payload) = read_frame(&mut server_half).await;
        assert_eq!(payload[0], 0x0E);
        write_frame(&mut server_half, 1, &ok_packet(0, 0, 0x0002)).await;
        server_half
    });

    let options = ClientOptions::default();
    let connection = Connection::connect(client_half, support::USERNAME, support::PASSWORD, &options)
        .await
        .expect("handshake should succeed");

    let rtt = connection.ping().await.expect("ping should succeed");
    assert!(rtt < 5_000, "round trip should be fast against an in-process peer");

    server.await.unwrap();
}

#[tokio::test]
async fn failed_authentication_surfaces_as_a_server_error() {
    let (client_half, mut server_half) = tokio::io::duplex(8192);
    let caps = server_capabilities();

    let server = tokio::spawn(async move {
        handshake_err(&mut server_half, caps).await;
    });

    let options = ClientOptions::default();
    let result = Connection::connect(client_half, support::USERNAME, "wrong", &options).await;

    match result {
        Ok(_) => panic!("expected authentication to fail"),
        Err(Error::Server { code, .. }) => assert_eq!(code, 1045),
        Err(other) => panic!("expected a server error, got {other:?}"),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn empty_password_produces_empty_auth_response() {
    let (client_half, mut server_half) = tokio::io::duplex(8192);
    let caps = server_capabilities();

    let server = tokio::spawn(async move {
        write_frame(&mut server_half, 0, &support::greeting(caps)).await;
        let (_seq, response) = read_frame(&mut server_half).await;

        // capabilities(4) + max_packet(4) + charset(1) + reserved(23) + username + nul
        let username_start = 4 + 4 + 1 + 23;
        let username_end = response[username_start..]
            .iter()
            .position(|&b| b == 0)
            .map(|p| username_start + p)
            .unwrap();
        // PLUGIN_AUTH_LENENC_CLIENT_DATA is negotiated, so the auth
        // response is a length-encoded byte string; an empty response is
        // therefore a single `0x00` length prefix.
        assert_eq!(response[username_end + 1], 0x00);

        write_frame(&mut server_half, 2, &ok_packet(0, 0, 0x0002)).await;
    });

    let options = ClientOptions::default();
    Connection::connect(client_half, support::USERNAME, "", &options)
        .await
        .expect("handshake with an empty password should succeed");

    server.await.unwrap();
}
