use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("introspection failed: {0}")]
    Introspection(String),

    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    #[error(transparent)]
    Config(#[from] plumb_config::ConfigError),
}
