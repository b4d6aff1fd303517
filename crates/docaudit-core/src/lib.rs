//! # Docaudit Core
//!
//! Core types for the document audit service.
//!
//! This crate provides the request-scoped data model shared by every other
//! docaudit crate:
//!
//! - [`UploadedDocument`] - A validated upload (filename, extension, bytes)
//! - [`AcceptedExtensions`] - The set of file extensions `/analyze` accepts
//! - [`AnalysisResult`] - The engine's opaque JSON result
//! - [`RequestOutcome`] - The terminal result of one request
//! - [`AuditError`] - The error taxonomy surfaced to clients
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use docaudit_core::{AcceptedExtensions, UploadedDocument};
//!
//! let accepted = AcceptedExtensions::default();
//! let doc = UploadedDocument::validate(Some("report.PDF"), Bytes::from_static(b"%PDF"), &accepted)
//!     .unwrap();
//! assert_eq!(doc.extension(), ".pdf");
//!
//! let err = UploadedDocument::validate(Some("notes.docx"), Bytes::new(), &accepted).unwrap_err();
//! assert!(err.to_string().contains(".pdf, .txt"));
//! ```

#![doc(html_root_url = "https://docs.rs/docaudit-core/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod document;
mod error;
mod info;
mod outcome;

pub use document::{extension_of, AcceptedExtensions, UploadedDocument, DEFAULT_ACCEPTED_EXTENSIONS};
pub use error::{AuditError, AuditResult, ErrorCategory};
pub use info::{ServiceInfo, StatusInfo, SERVICE_TITLE};
pub use outcome::{AnalysisResult, ErrorDetail, RequestOutcome};

/// Crate version, reported by the root endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
