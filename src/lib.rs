pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod resources;
pub mod session;

pub use client::AdminClient;
pub use config::{AppConfig, ServiceName};
pub use error::ClientError;
