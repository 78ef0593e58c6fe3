//! An asynchronous MySQL/MariaDB wire-protocol client core.
//!
//! Given an already-opened duplex byte stream (socket establishment, TLS,
//! and DSN parsing are the caller's job), this crate performs the
//! handshake and authentication, serializes commands one at a time per
//! connection, exposes prepared statements with bound parameters, streams
//! result rows through a bounded channel, and multiplexes connections
//! through a pool.

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod io;
pub mod options;
pub mod pool;
pub mod protocol;
pub mod result_set;
pub mod statement;
pub mod value;

pub use connection::Connection;
pub use error::{Error, Result};
pub use options::{ClientOptions, PoolOptions};
pub use pool::{Pool, PooledConnection, PooledStatement};
pub use result_set::ResultSet;
pub use statement::Statement;
pub use value::{MySqlColumnValue, MySqlValue};
