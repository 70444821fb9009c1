use std::fmt::Display;

use anyhow::{anyhow, Context, Result};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FcError {
    #[error("Precondition not met error: {0}")]
    PreconditionNotMet(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("No configuration found")]
    ConfigurationNotFound,
    #[error("HTTP transport error: {0}")]
    HttpTransportError(String),
    #[error("Cache storage error: {0}")]
    StorageError(String),
    #[error("{0}")]
    CacheLocationDoesNotExist(String),
    #[error("{0}")]
    CacheLocationIsNotADirectory(String),
    #[error("{0}")]
    CacheLocationIsNotWriteable(String),
    #[error("{0}")]
    CacheLocationWriteTestFailed(String),
    #[error("Maximum retries reached: {0}")]
    MaxRetriesReached(String),
}

pub trait AddContext<T, E>: Context<T, E> {
    fn err_context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T, anyhow::Error>
    where
        Self: Sized,
    {
        self.with_context(|| msg.to_string())
    }
}

impl<U, T, E> AddContext<T, E> for U where U: Context<T, E> {}

pub fn gen<T: AsRef<str>>(msg: T) -> anyhow::Error {
    anyhow!(msg.as_ref().to_string())
}
