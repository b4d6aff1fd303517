//! Upload validation.
//!
//! An [`UploadedDocument`] can only be obtained through
//! [`UploadedDocument::validate`], so holding one proves the extension check
//! already passed.

use bytes::Bytes;

use crate::error::{AuditError, AuditResult};

/// Extensions accepted by `/analyze` when no override is configured.
pub const DEFAULT_ACCEPTED_EXTENSIONS: [&str; 2] = [".pdf", ".txt"];

/// The set of file extensions an upload may carry.
///
/// Entries are stored lower-cased with a leading dot, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedExtensions {
    extensions: Vec<String>,
}

impl AcceptedExtensions {
    /// Creates a set from the given extensions.
    ///
    /// Entries are lower-cased and given a leading dot if missing. Duplicates
    /// are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().to_lowercase();
            if ext.is_empty() {
                continue;
            }
            let ext = if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            };
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Self {
            extensions: normalized,
        }
    }

    /// Returns `true` if `extension` (already lower-cased) is accepted.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// Iterates over the accepted extensions.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Returns the number of accepted extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns `true` if nothing is accepted.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Comma-separated list for error messages, e.g. `.pdf, .txt`.
    pub fn display_list(&self) -> String {
        self.extensions.join(", ")
    }
}

impl Default for AcceptedExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTED_EXTENSIONS)
    }
}

/// Extracts the lower-cased extension of a client-supplied filename.
///
/// Only the last path component is considered. The extension runs from the
/// last `.` to the end and includes the dot. Leading dots (as in `.pdf` or
/// `..txt`) do not separate an extension, and a trailing dot yields `"."`.
///
/// ```
/// use docaudit_core::extension_of;
///
/// assert_eq!(extension_of("Report.PDF"), ".pdf");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of("README"), "");
/// assert_eq!(extension_of(".pdf"), "");
/// assert_eq!(extension_of("dir.d/notes"), "");
/// ```
pub fn extension_of(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(idx) => name[stem_start + idx..].to_lowercase(),
        None => String::new(),
    }
}

/// A client upload whose extension has been accepted.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    filename: String,
    extension: String,
    content: Bytes,
}

impl UploadedDocument {
    /// Validates an upload against the accepted extension set.
    ///
    /// A missing or empty filename is rejected with an empty extension.
    /// No I/O happens here; rejection is decided from the name alone.
    pub fn validate(
        filename: Option<&str>,
        content: Bytes,
        accepted: &AcceptedExtensions,
    ) -> AuditResult<Self> {
        let filename = filename.unwrap_or_default();
        let extension = extension_of(filename);

        if filename.is_empty() || !accepted.contains(&extension) {
            return Err(AuditError::unsupported_extension(extension, accepted.iter()));
        }

        Ok(Self {
            filename: filename.to_string(),
            extension,
            content,
        })
    }

    /// The filename as supplied by the client.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The lower-cased extension, including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The uploaded bytes.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Size of the upload in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` for a zero-byte upload.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Consumes the document, returning its content.
    pub fn into_content(self) -> Bytes {
        self.content
    }
}
