pub mod backoff;
pub mod cli;
pub mod config;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod exec;
pub mod gateway;
pub mod http;
pub mod init;
pub mod io;
pub mod logging;
pub mod router;
pub mod store;
pub mod time;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
pub type Cmd<T> = Box<dyn FnOnce() -> Result<T> + Send + Sync>;

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate derive_builder;
