//! Request body collection and `multipart/form-data` parsing for `/analyze`.
//!
//! The body is collected under a byte ceiling before parsing, so an
//! oversized upload is rejected with 413 without being buffered in full.
//! The document is the part named [`FILE_FIELD`]; other parts are skipped.

use std::error::Error as StdError;
use std::io;

use bytes::Bytes;
use docaudit_core::{AuditError, AuditResult};
use http::{header, HeaderMap};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use mime::Mime;

/// Name of the form field that carries the document.
pub const FILE_FIELD: &str = "file";

/// Default request body ceiling (50 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Default ceiling on the number of multipart parts read.
pub const DEFAULT_MAX_FIELDS: usize = 16;

/// Limits applied to an `/analyze` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Maximum number of parts read before giving up on finding the file.
    pub max_fields: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl UploadLimits {
    /// Creates limits with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body ceiling.
    #[must_use]
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Sets the part ceiling.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// The `file` part of an upload, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    filename: Option<String>,
    content: Bytes,
}

impl FileUpload {
    /// Creates an upload from its parts.
    #[must_use]
    pub fn new(filename: Option<String>, content: Bytes) -> Self {
        Self { filename, content }
    }

    /// The client-supplied filename, if the part carried one.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The uploaded bytes.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Splits the upload into filename and content.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, Bytes) {
        (self.filename, self.content)
    }
}

/// Collects a request body, failing with 413 once it exceeds `limit` bytes.
pub async fn collect_body<B>(body: B, limit: usize) -> AuditResult<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(AuditError::payload_too_large(limit))
        }
        Err(e) => Err(AuditError::bad_request(format!(
            "Failed to read request body: {e}"
        ))),
    }
}

/// Extracts the multipart boundary from a `multipart/form-data` content type.
pub fn boundary(headers: &HeaderMap) -> AuditResult<String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .ok_or_else(|| AuditError::bad_request("Expected a multipart/form-data request"))?
        .to_str()
        .map_err(|_| AuditError::bad_request("Invalid Content-Type header"))?;

    let mime: Mime = content_type
        .parse()
        .map_err(|_| AuditError::bad_request("Invalid Content-Type header"))?;
    if mime.essence_str() != mime::MULTIPART_FORM_DATA.essence_str() {
        return Err(AuditError::bad_request(format!(
            "Expected a multipart/form-data request, got {}",
            mime.essence_str()
        )));
    }

    multer::parse_boundary(content_type)
        .map_err(|_| AuditError::bad_request("Missing multipart boundary"))
}

/// Reads the [`FILE_FIELD`] part out of a collected multipart body.
///
/// # Errors
///
/// Returns a 400-class [`AuditError`] when the content type is wrong, the
/// body is malformed, the part ceiling is hit, or no `file` part exists.
pub async fn read_upload(
    headers: &HeaderMap,
    body: Bytes,
    limits: &UploadLimits,
) -> AuditResult<FileUpload> {
    let boundary = boundary(headers)?;
    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut seen = 0usize;
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        seen += 1;
        if seen > limits.max_fields {
            return Err(AuditError::bad_request(format!(
                "Too many multipart fields (max {})",
                limits.max_fields
            )));
        }

        if field.name() == Some(FILE_FIELD) {
            let filename = field.file_name().map(ToString::to_string);
            let content = field.bytes().await.map_err(malformed)?;
            return Ok(FileUpload::new(filename, content));
        }
    }

    Err(AuditError::bad_request(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

fn malformed(err: multer::Error) -> AuditError {
    AuditError::bad_request(format!("Malformed multipart body: {err}"))
}
