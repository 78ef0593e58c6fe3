//! Configuration recognized by this crate. Plain structs with a builder:
//! one type holds the resolved values, a separate builder accumulates
//! overrides before producing one.

/// Options for a single [`crate::connection::Connection`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// `utf8mb4_general_ci` by default.
    pub charset: u8,
    /// Row channel capacity for each [`crate::result_set::ResultSet`]
    ///.
    pub statement_prefetch: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            charset: 45,
            statement_prefetch: 4,
        }
    }
}

impl ClientOptions {
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    pub fn charset(mut self, charset: u8) -> Self {
        self.options.charset = charset;
        self
    }

    pub fn statement_prefetch(mut self, prefetch: usize) -> Self {
        self.options.statement_prefetch = prefetch;
        self
    }

    pub fn build(self) -> ClientOptions {
        self.options
    }
}

/// Options for a [`crate::pool::Pool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum number of simultaneously active (checked-out + idle)
    /// clients.
    pub size: usize,
    pub client: ClientOptions,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions {
            size: 10,
            client: ClientOptions::default(),
        }
    }
}

impl PoolOptions {
    pub fn builder() -> PoolOptionsBuilder {
        PoolOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolOptionsBuilder {
    options: PoolOptions,
}

impl PoolOptionsBuilder {
    pub fn size(mut self, size: usize) -> Self {
        self.options.size = size;
        self
    }

    pub fn client(mut self, client: ClientOptions) -> Self {
        self.options.client = client;
        self
    }

    pub fn build(self) -> PoolOptions {
        self.options
    }
}
