//! A minimal in-process MySQL/MariaDB wire-protocol responder used by the
//! integration tests in this directory, standing in for a real server (none
//! is reachable in this environment). Each test spawns one of these over
//! half of a `tokio::io::duplex` pair and drives it by hand; the helpers
//! here only build and parse raw frames, independent of the crate's own
//! codec, so the tests exercise the client against an intentionally
//! separate implementation of the wire format.

#![allow(dead_code)]

use myproto_mysql::protocol::Capabilities;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub const USERNAME: &str = "root";
pub const PASSWORD: &str = "hunter2";
pub const SCRAMBLE: [u8; 20] = *b"01234567890123456789";

pub const STATUS_AUTOCOMMIT: u16 = 0x0002;
pub const STATUS_IN_TRANS: u16 = 0x0001;

/// The capability set this harness negotiates: enough to exercise the
/// binary protocol's `DEPRECATE_EOF` path without any legacy EOF frames.
pub fn server_capabilities() -> Capabilities {
    Capabilities::PROTOCOL_41
        | Capabilities::TRANSACTIONS
        | Capabilities::SECURE_CONNECTION
        | Capabilities::MULTI_RESULTS
        | Capabilities::PLUGIN_AUTH
        | Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA
        | Capabilities::DEPRECATE_EOF
}

fn lenenc(out: &mut Vec<u8>, v: u64) {
    if v < 0xFB {
        out.push(v as u8);
    } else if v <= 0xFFFF {
        out.push(0xFC);
        out.extend_from_slice(&(v as u16).to_le_bytes());
    } else if v <= 0x00FF_FFFF {
        out.push(0xFD);
        out.extend_from_slice(&(v as u32).to_le_bytes()[..3]);
    } else {
        out.push(0xFE);
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn lenenc_bytes(out: &mut Vec<u8>, b: &[u8]) {
    lenenc(out, b.len() as u64);
    out.extend_from_slice(b);
}

pub fn frame(seq: u8, payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    let mut out = Vec::with_capacity(4 + len);
    out.push((len & 0xFF) as u8);
    out.push(((len >> 8) & 0xFF) as u8);
    out.push(((len >> 16) & 0xFF) as u8);
    out.push(seq);
    out.extend_from_slice(payload);
    out
}

/// Read one frame (no multi-packet reassembly; tests never exceed 16 MiB).
pub async fn read_frame(stream: &mut DuplexStream) -> (u8, Vec<u8>) {
    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .await
        .expect("read frame header");
    let len =
        u32::from(header[0]) | (u32::from(header[1]) << 8) | (u32::from(header[2]) << 16);
    let mut payload = vec![0u8; len as usize];
    if len > 0 {
        stream
            .read_exact(&mut payload)
            .await
            .expect("read frame payload");
    }
    (header[3], payload)
}

pub async fn write_frame(stream: &mut DuplexStream, seq: u8, payload: &[u8]) {
    stream
        .write_all(&frame(seq, payload))
        .await
        .expect("write frame");
    stream.flush().await.expect("flush frame");
}

/// Server greeting (protocol version 10), matching `protocol::Handshake::read`.
pub fn greeting(capabilities: Capabilities) -> Vec<u8> {
    let mut p = vec![0x0A];
    p.extend_from_slice(b"8.0.0-fake\x00");
    p.extend_from_slice(&42u32.to_le_bytes());
    p.extend_from_slice(&SCRAMBLE[..8]);
    p.push(0); // filler

    let bits = capabilities.bits();
    p.extend_from_slice(&((bits & 0xFFFF) as u16).to_le_bytes());
    p.push(45); // charset
    p.extend_from_slice(&STATUS_AUTOCOMMIT.to_le_bytes());
    p.extend_from_slice(&(((bits >> 16) & 0xFFFF) as u16).to_le_bytes());

    p.push(21); // auth_data_len: 8 + 12 + 1 nul pad
    p.extend_from_slice(&[0u8; 10]); // reserved

    p.extend_from_slice(&SCRAMBLE[8..20]); // scramble part 2 (12 bytes)
    p.push(0); // nul pad terminating the scramble

    p.extend_from_slice(b"mysql_native_password\x00");
    p
}

/// `OK` packet, header `0x00`.
pub fn ok_packet(affected_rows: u64, last_insert_id: u64, status: u16) -> Vec<u8> {
    let mut p = vec![0x00];
    lenenc(&mut p, affected_rows);
    lenenc(&mut p, last_insert_id);
    p.extend_from_slice(&status.to_le_bytes());
    p.extend_from_slice(&0u16.to_le_bytes()); // warnings
    p
}

/// The short-form `OK`-as-terminator used to end a `DEPRECATE_EOF` row
/// stream: header `0xFE`, total length under 9 bytes.
pub fn short_ok_terminator(status: u16) -> Vec<u8> {
    let mut p = vec![0xFE];
    lenenc(&mut p, 0); // affected rows
    lenenc(&mut p, 0); // last insert id
    p.extend_from_slice(&status.to_le_bytes());
    p.extend_from_slice(&0u16.to_le_bytes()); // warnings
    p
}

/// `ERR` packet, header `0xFF`.
pub fn err_packet(code: u16, sql_state: &str, message: &str) -> Vec<u8> {
    let mut p = vec![0xFF];
    p.extend_from_slice(&code.to_le_bytes());
    p.push(b'#');
    p.extend_from_slice(sql_state.as_bytes());
    p.extend_from_slice(message.as_bytes());
    p
}

/// `COM_STMT_PREPARE_OK`.
pub fn prepare_ok_packet(statement_id: u32, column_count: u16, param_count: u16) -> Vec<u8> {
    let mut p = vec![0x00];
    p.extend_from_slice(&statement_id.to_le_bytes());
    p.extend_from_slice(&column_count.to_le_bytes());
    p.extend_from_slice(&param_count.to_le_bytes());
    p.push(0); // filler
    p.extend_from_slice(&0u16.to_le_bytes()); // warning count
    p
}

/// A column-definition packet for a `VAR_STRING` (0xFD) column named `name`.
pub fn string_column_def(name: &str) -> Vec<u8> {
    let mut p = Vec::new();
    lenenc_bytes(&mut p, b"def"); // catalog
    lenenc_bytes(&mut p, b"testdb"); // schema
    lenenc_bytes(&mut p, b"customer"); // table alias
    lenenc_bytes(&mut p, b"customer"); // table
    lenenc_bytes(&mut p, name.as_bytes()); // column alias
    lenenc_bytes(&mut p, name.as_bytes()); // column
    lenenc(&mut p, 0x0C); // fixed-fields length marker
    p.extend_from_slice(&45u16.to_le_bytes()); // charset
    p.extend_from_slice(&255u32.to_le_bytes()); // length
    p.push(0xFD); // VAR_STRING
    p.extend_from_slice(&0u16.to_le_bytes()); // flags
    p.push(0); // decimals
    p.extend_from_slice(&[0u8; 2]); // filler
    p
}

/// Like [`read_frame`], but returns `None` once the peer half is closed
/// instead of panicking (used by the long-lived pool-test server loops).
pub async fn try_read_frame(stream: &mut DuplexStream) -> Option<(u8, Vec<u8>)> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.ok()?;
    let len =
        u32::from(header[0]) | (u32::from(header[1]) << 8) | (u32::from(header[2]) << 16);
    let mut payload = vec![0u8; len as usize];
    if len > 0 {
        stream.read_exact(&mut payload).await.ok()?;
    }
    Some((header[3], payload))
}

/// Serve `COM_PING` forever (replying `OK` each time) until the peer closes
/// the connection. Stands in for a live server backing a pooled `Client`.
pub async fn serve_pings(mut server_half: DuplexStream) {
    handshake_ok(&mut server_half, server_capabilities()).await;
    while let Some((tag, _payload)) = try_read_frame(&mut server_half).await {
        if tag != 0x0E {
            break;
        }
        write_frame(&mut server_half, 1, &ok_packet(0, 0, STATUS_AUTOCOMMIT)).await;
    }
}

/// Build a fresh authenticated [`myproto_mysql::client::Client`] backed by
/// a dedicated in-process fake server task that only answers `COM_PING`.
/// Used as a pool [`myproto_mysql::pool::ConnectFactory`] in pool tests.
pub async fn spawn_fake_client() -> myproto_mysql::Result<myproto_mysql::client::Client> {
    let (client_half, server_half) = tokio::io::duplex(8192);
    tokio::spawn(serve_pings(server_half));
    myproto_mysql::client::Client::connect(client_half, USERNAME, PASSWORD, 45).await
}

/// Perform the server side of a successful handshake: send the greeting,
/// read (and discard) the client's handshake response, reply `OK`.
pub async fn handshake_ok(server: &mut DuplexStream, capabilities: Capabilities) {
    write_frame(server, 0, &greeting(capabilities)).await;
    let (_seq, _response) = read_frame(server).await;
    write_frame(server, 2, &ok_packet(0, 0, STATUS_AUTOCOMMIT)).await;
}

/// Perform the server side of a handshake that fails authentication.
pub async fn handshake_err(server: &mut DuplexStream, capabilities: Capabilities) {
    write_frame(server, 0, &greeting(capabilities)).await;
    let (_seq, _response) = read_frame(server).await;
    write_frame(
        server,
        2,
        &err_packet(1045, "28000", "Access denied for user"),
    )
    .await;
}

/// A single binary-protocol row with one string-family column, or `None`
/// for SQL NULL.
pub fn string_row(value: Option<&str>) -> Vec<u8> {
    let mut p = vec![0x00];
    let mut bitmap = vec![0u8; 1]; // row_bitmap_len(1) == 1
    if value.is_none() {
        let shifted = 0 + 2;
        bitmap[shifted >> 3] |= 1 << (shifted & 7);
    }
    p.extend_from_slice(&bitmap);
    if let Some(v) = value {
        lenenc_bytes(&mut p, v.as_bytes());
    }
    p
}
