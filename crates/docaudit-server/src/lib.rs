//! # Docaudit Server
//!
//! HTTP gateway for the document audit service.
//!
//! This crate ties the service together:
//!
//! - [`Server`] - Hyper/Tokio HTTP server, routing and graceful shutdown
//! - [`Gateway`] - validate, stage, analyze and clean up one upload
//! - [`multipart`] - bounded body collection and `multipart/form-data` parsing
//! - [`ShutdownSignal`] - shutdown coordination
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docaudit_config::ConfigLoader;
//! use docaudit_engine::CommandEngine;
//! use docaudit_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("DOCAUDIT").load()?;
//!     let engine = CommandEngine::new(config.engine.program.clone())
//!         .with_args(config.engine.args.clone());
//!
//!     Server::from_config(&config, Arc::new(engine)).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/docaudit-server/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod gateway;
pub mod multipart;
mod server;
mod shutdown;

pub use error::{ServerError, ServerResult};
pub use gateway::Gateway;
pub use multipart::{FileUpload, UploadLimits, FILE_FIELD};
pub use server::{HttpResponse, ResponseBody, Server, REQUEST_ID_HEADER};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
