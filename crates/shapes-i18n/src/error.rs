//! Errors from catalog loading, lookup, and persistence.

use std::io;
use std::path::PathBuf;

/// Errors from catalog operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The document could not be parsed into contexts and messages.
    Malformed {
        /// Byte offset into the document where parsing stopped.
        offset: usize,
        /// What was wrong.
        reason: String,
    },
    /// Two active messages in one context share (source, comment).
    DuplicateMessage {
        context: String,
        source: String,
        comment: Option<String>,
    },
    /// A context name appears twice in one document.
    DuplicateContext(String),
    /// A comment-less lookup matched more than one active message.
    AmbiguousLookup { context: String, source: String },
    /// A catalog file could not be read or written.
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },
    /// The XML writer rejected an event while serializing a catalog.
    Serialize(String),
}

impl CatalogError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &io::Error) -> Self {
        Self::Io {
            path: path.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether this error means the document itself is unusable.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. } | Self::DuplicateMessage { .. } | Self::DuplicateContext(_)
        )
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { offset, reason } => {
                write!(f, "malformed catalog at byte {offset}: {reason}")
            }
            Self::DuplicateMessage {
                context,
                source,
                comment: Some(comment),
            } => write!(
                f,
                "duplicate message '{source}' (comment '{comment}') in context '{context}'"
            ),
            Self::DuplicateMessage {
                context,
                source,
                comment: None,
            } => write!(f, "duplicate message '{source}' in context '{context}'"),
            Self::DuplicateContext(name) => write!(f, "duplicate context '{name}'"),
            Self::AmbiguousLookup { context, source } => write!(
                f,
                "ambiguous lookup of '{source}' in context '{context}': a comment is required"
            ),
            Self::Io {
                path,
                message,
                ..
            } => write!(f, "catalog I/O error on {}: {message}", path.display()),
            Self::Serialize(reason) => write!(f, "cannot serialize catalog: {reason}"),
        }
    }
}

impl std::error::Error for CatalogError {}
