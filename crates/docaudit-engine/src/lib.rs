//! # Docaudit Engine
//!
//! The boundary between the service and the external analysis engine.
//!
//! The engine is a black box: it receives the filesystem path of a staged
//! document and returns a JSON value or fails. [`AnalysisEngine`] is the
//! trait at that seam; [`CommandEngine`] is the production implementation,
//! running the engine as a child process. [`AnalysisInvoker`] wraps one
//! engine with a deadline and makes exactly one call per invocation.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use docaudit_engine::{AnalysisInvoker, CommandEngine};
//!
//! # async fn example() -> Result<(), docaudit_engine::AnalysisError> {
//! let engine = CommandEngine::new("python3").with_args(["-m", "pipeline"]);
//! let invoker = AnalysisInvoker::new(Arc::new(engine)).with_timeout(Duration::from_secs(300));
//! let result = invoker.invoke(Path::new("/tmp/docaudit-abc.pdf")).await?;
//! println!("{}", result.as_value());
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/docaudit-engine/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod command;
mod engine;
mod error;
mod invoker;

pub use command::CommandEngine;
pub use engine::AnalysisEngine;
pub use error::AnalysisError;
pub use invoker::{AnalysisInvoker, InvocationState};
