//! Cancellation safety: a command future dropped mid-flight must poison
//! the connection rather than let a later command read a desynced stream.

mod support;

use std::time::Duration;

use myproto_mysql::{ClientOptions, Connection};
use support::{handshake_ok, read_frame, server_capabilities};

#[tokio::test]
async fn aborting_an_in_flight_command_poisons_and_then_shuts_down_the_connection() {
    let (client_half, mut server_half) = tokio::io::duplex(8192);
    let caps = server_capabilities();

    let server = tokio::spawn(async move {
        handshake_ok(&mut server_half, caps).await;

        // Read the client's COM_STMT_PREPARE but never reply: the caller
        // will abort its task while this command is still in flight.
        let (_seq, _payload) = read_frame(&mut server_half).await;

        // Keep the peer half alive past the abort so the client's read
        // doesn't fail with an EOF instead of genuinely hanging.
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let options = ClientOptions::default();
    let connection = Connection::connect(client_half, support::USERNAME, support::PASSWORD, &options)
        .await
        .unwrap();

    let mut statement = connection.prepare("SELECT name FROM customer").unwrap();
    let task = tokio::spawn(async move {
        let _ = statement.execute().await;
    });

    // Give the task time to send COM_STMT_PREPARE and block on the reply.
    tokio::time::sleep(Duration::from_millis(50)).await;
    task.abort();
    let _ = task.await;

    // The next command observes the stream left poisoned by the cancelled
    // one and refuses to reuse it.
    let first_result = connection.ping().await;
    assert!(
        first_result.is_err(),
        "a command following a cancelled one must fail instead of reading a desynced stream"
    );

    // The Client is now shut down; anything after that fails fast without
    // touching the stream at all.
    let second_result = connection.ping().await;
    assert!(second_result.is_err(), "the connection should stay shut down");

    server.abort();
}
