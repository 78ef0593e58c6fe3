//! Binary-protocol prepared statements: prepare, bind
//! parameters, execute, and stream rows or drain an `OK`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::client::Client;
use crate::error::{protocol_err, Error, Result};
use crate::protocol::{self, ColumnDefinition, EofPacket, OkPacket};
use crate::result_set::ResultSet;
use crate::value::MySqlValue;

/// A prepared statement bound to one [`Client`]. Re-preparing (after a
/// `limit`/`offset` change) closes the previous statement id first.
pub struct Statement {
    client: Client,
    sql: String,
    statement_id: Option<u32>,
    param_count: usize,
    bound: Vec<Option<MySqlValue>>,
    limit: Option<u64>,
    offset: Option<u64>,
    recompile_needed: bool,
    disposed: bool,
    prefetch: usize,
}

impl Statement {
    pub(crate) fn new(client: Client, sql: impl Into<String>, prefetch: usize) -> Self {
        Statement {
            client,
            sql: sql.into(),
            statement_id: None,
            param_count: 0,
            bound: Vec::new(),
            limit: None,
            offset: None,
            recompile_needed: true,
            disposed: false,
            prefetch,
        }
    }

    pub fn limit(&mut self, n: u64) -> Result<&mut Self> {
        if n < 1 {
            return Err(Error::usage("limit must be >= 1"));
        }
        if self.limit != Some(n) {
            self.recompile_needed = true;
        }
        self.limit = Some(n);
        Ok(self)
    }

    pub fn offset(&mut self, k: u64) -> Result<&mut Self> {
        if self.offset != Some(k) {
            self.recompile_needed = true;
        }
        self.offset = Some(k);
        Ok(self)
    }

    pub fn bind(&mut self, index: usize, value: impl Into<MySqlValue>) -> Result<&mut Self> {
        if self.bound.len() <= index {
            self.bound.resize(index + 1, None);
        }
        self.bound[index] = Some(value.into());
        Ok(self)
    }

    pub fn bind_all<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<MySqlValue>,
    {
        self.bound = values.into_iter().map(|v| Some(v.into())).collect();
        Ok(self)
    }

    fn check_usable(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::usage("statement is disposed"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(sql = %self.sql))]
    pub async fn execute(&mut self) -> Result<ResultSet> {
        self.check_usable()?;

        if self.statement_id.is_none() || self.recompile_needed {
            self.prepare().await?;
        }

        for i in 0..self.param_count {
            if self.bound.get(i).and_then(Option::as_ref).is_none() {
                return Err(Error::usage(format!("parameter {i} is not bound")));
            }
        }

        self.run_execute().await
    }

    async fn prepare(&mut self) -> Result<()> {
        if let Some(old_id) = self.statement_id.take() {
            // Best-effort: a failure here does not block preparing the
            // replacement; the old id is simply leaked server-side until
            // the connection closes.
            let _ = self.send_close(old_id).await;
        }

        let payload = protocol::com_stmt_prepare::encode(&self.sql, self.limit, self.offset);
        let mut cmd = self.client.begin_command().await?;
        let result = Self::drive_prepare(&mut cmd, &payload, self.client.capabilities()).await;
        cmd.complete(result.as_ref().err().is_some_and(Error::is_fatal));

        let (prepare_ok, param_defs) = result?;
        debug!(statement_id = prepare_ok.statement_id, params = prepare_ok.param_count, "prepared");

        self.statement_id = Some(prepare_ok.statement_id);
        self.param_count = prepare_ok.param_count as usize;
        self.bound.resize(self.param_count, None);
        self.recompile_needed = false;
        let _ = param_defs;
        Ok(())
    }

    async fn drive_prepare(
        cmd: &mut crate::client::CommandGuard,
        payload: &[u8],
        capabilities: crate::protocol::Capabilities,
    ) -> Result<(protocol::com_stmt_prepare::PrepareOk, Vec<ColumnDefinition>)> {
        cmd.send_packet(payload).await?;
        let (tag, first_payload) = cmd.read_raw_packet().await?;
        if tag == 0xFF {
            return Err(protocol::ErrPacket::read(&first_payload)?.into_error());
        }

        let prepare_ok = protocol::com_stmt_prepare::PrepareOk::read(&first_payload)?;
        let deprecate_eof = capabilities.contains(crate::protocol::Capabilities::DEPRECATE_EOF);

        let mut param_defs = Vec::with_capacity(prepare_ok.param_count as usize);
        for _ in 0..prepare_ok.param_count {
            let (_, payload) = cmd.read_raw_packet().await?;
            param_defs.push(ColumnDefinition::read(&payload)?);
        }
        if prepare_ok.param_count > 0 && !deprecate_eof {
            let (tag, payload) = cmd.read_raw_packet().await?;
            if tag != 0xFE {
                return Err(protocol_err!("expected EOF after parameter definitions"));
            }
            let _ = EofPacket::read(&payload)?;
        }

        // Result-set column definitions are also sent at prepare time, but
        // EXECUTE resends fresh column metadata of its own; these are read
        // here only to keep the wire in sync and then discarded.
        for _ in 0..prepare_ok.column_count {
            cmd.read_raw_packet().await?;
        }
        if prepare_ok.column_count > 0 && !deprecate_eof {
            let (tag, _) = cmd.read_raw_packet().await?;
            if tag != 0xFE {
                return Err(protocol_err!("expected EOF after result column definitions"));
            }
        }

        Ok((prepare_ok, param_defs))
    }

    async fn send_close(&mut self, statement_id: u32) -> Result<()> {
        let mut cmd = self.client.begin_command().await?;
        let result = cmd
            .send_packet(&protocol::com_stmt_prepare::encode_close(statement_id))
            .await;
        cmd.complete(result.as_ref().err().is_some_and(Error::is_fatal));
        result
    }

    async fn run_execute(&mut self) -> Result<ResultSet> {
        let statement_id = self.statement_id.expect("prepared above");
        let params: Vec<MySqlValue> = (0..self.param_count)
            .map(|i| self.bound.get(i).cloned().flatten().unwrap_or(MySqlValue::Null))
            .collect();
        let payload = protocol::com_stmt_execute::encode(statement_id, &params);

        let mut cmd = self.client.begin_command().await?;
        cmd.send_packet(&payload).await?;

        let (_seq, first) = cmd.read_raw_packet().await?;
        match first.first().copied() {
            Some(0xFF) => {
                let err = protocol::ErrPacket::read(&first)?.into_error();
                cmd.complete(false);
                Err(err)
            }
            Some(tag) if (tag == 0x00 || tag == 0xFE) && first.len() < 9 => {
                let ok = OkPacket::read(&first, self.client.capabilities())?;
                cmd.complete(false);
                Ok(ResultSet::ok_only(ok.affected_rows, ok.last_insert_id))
            }
            _ => {
                let mut reader = crate::io::PacketReader::new(&first);
                let column_count = reader
                    .lenenc_int_header()
                    .map_err(|_| protocol_err!("expected a length-encoded column count"))?;

                let deprecate_eof = self
                    .client
                    .capabilities()
                    .contains(crate::protocol::Capabilities::DEPRECATE_EOF);

                match Self::read_result_columns(&mut cmd, column_count, deprecate_eof).await {
                    Ok(columns) => Ok(Self::spawn_row_stream(cmd, columns, self.prefetch)),
                    Err(e) => {
                        let fatal = e.is_fatal();
                        cmd.complete(fatal);
                        Err(e)
                    }
                }
            }
        }
    }

    async fn read_result_columns(
        cmd: &mut crate::client::CommandGuard,
        column_count: u64,
        deprecate_eof: bool,
    ) -> Result<Vec<ColumnDefinition>> {
        let mut columns = Vec::with_capacity(column_count as usize);
        for _ in 0..column_count {
            let (_, payload) = cmd.read_raw_packet().await?;
            columns.push(ColumnDefinition::read(&payload)?);
        }
        if !deprecate_eof {
            let (tag, payload) = cmd.read_raw_packet().await?;
            if tag != 0xFE {
                return Err(protocol_err!("expected EOF after column definitions"));
            }
            let _ = EofPacket::read(&payload)?;
        }
        Ok(columns)
    }

    /// Spawn the task that owns the command for as long as rows are being
    /// produced, forwarding them through a bounded channel for backpressure
    /// until the server's row-stream `EOF`.
    fn spawn_row_stream(
        mut cmd: crate::client::CommandGuard,
        columns: Vec<ColumnDefinition>,
        prefetch: usize,
    ) -> ResultSet {
        let columns = Arc::new(columns);
        let (tx, rx) = mpsc::channel(prefetch.max(1));
        let task_columns = columns.clone();

        tokio::spawn(async move {
            let mut fatal = false;
            loop {
                let next = cmd.read_raw_packet().await;
                let (tag, payload) = match next {
                    Ok(pair) => pair,
                    Err(e) => {
                        fatal = e.is_fatal();
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                };

                if EofPacket::looks_like_eof(&payload) {
                    break;
                }
                if tag == 0xFF {
                    let err = match protocol::ErrPacket::read(&payload) {
                        Ok(e) => e.into_error(),
                        Err(e) => e,
                    };
                    let _ = tx.send(Err(err)).await;
                    break;
                }

                match protocol::decode_row(&payload, &task_columns) {
                    Ok(row) => {
                        if tx.send(Ok(row)).await.is_err() {
                            // Receiver dropped (cursor closed without
                            // draining): keep reading off the wire without
                            // forwarding so the Client stays usable
                            //.
                            if drain_remaining(&mut cmd).await.is_err() {
                                fatal = true;
                            }
                            break;
                        }
                    }
                    Err(e) => {
                        fatal = e.is_fatal();
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
            cmd.complete(fatal);
        });

        ResultSet::streaming(columns, rx)
    }

    #[instrument(skip(self))]
    pub async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        if let Some(id) = self.statement_id.take() {
            self.send_close(id).await?;
        }
        self.param_count = 0;
        self.bound.clear();
        Ok(())
    }
}

/// Consume server packets until the row stream's terminal `EOF`, without
/// decoding or forwarding them.
async fn drain_remaining(cmd: &mut crate::client::CommandGuard) -> Result<()> {
    loop {
        let (tag, payload) = cmd.read_raw_packet().await?;
        if EofPacket::looks_like_eof(&payload) || tag == 0xFF {
            return Ok(());
        }
    }
}
