//! Error Classification
//!
//! Decides whether a remote failure means the local cache holds identifiers
//! the remote side no longer recognizes.
//!
//! The default classifier is a best-effort heuristic: it matches provider
//! error codes and free-text message fragments of an opaque remote error.
//! Swap it through [`ErrorClassifier`] without touching the retry logic.

use crate::error::RemoteError;

/// Outcome of classifying a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Stale identifier, eligible for one invalidate-and-retry cycle
    Consistency,
    /// Anything else, surfaced immediately
    Other,
}

/// Classifies failures of type `E`.
///
/// Implemented for any `Fn(&E) -> ErrorClass`.
pub trait ErrorClassifier<E: ?Sized>: Send + Sync {
    fn classify(&self, error: &E) -> ErrorClass;
}

impl<E: ?Sized, F> ErrorClassifier<E> for F
where
    F: Fn(&E) -> ErrorClass + Send + Sync,
{
    fn classify(&self, error: &E) -> ErrorClass {
        self(error)
    }
}

// == Default Rules ==
/// Foreign-key violation, unique violation, and "row not found for id".
pub const CONSISTENCY_ERROR_CODES: &[&str] = &["23503", "23505", "PGRST116"];

/// Lower-case message fragments signalling a stale identifier.
pub const CONSISTENCY_MESSAGE_PATTERNS: &[&str] = &[
    "does not exist",
    "violates foreign key constraint",
    "invalid uuid",
    "uuid not found",
    "foreign key violation",
    "constraint violation",
];

// == Identifier Mismatch Classifier ==
/// Code- and message-based classifier for [`RemoteError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMismatchClassifier {
    codes: Vec<String>,
    patterns: Vec<String>,
}

impl Default for IdentifierMismatchClassifier {
    fn default() -> Self {
        Self::new(
            CONSISTENCY_ERROR_CODES.iter().copied(),
            CONSISTENCY_MESSAGE_PATTERNS.iter().copied(),
        )
    }
}

impl IdentifierMismatchClassifier {
    /// Builds a classifier from explicit rules. Patterns match case-insensitively.
    pub fn new<C, P>(codes: C, patterns: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into().to_lowercase());
        self
    }

    /// Returns true if `error` carries a matching code or message fragment.
    pub fn matches(&self, error: &RemoteError) -> bool {
        let code_matches = error
            .code
            .as_deref()
            .map_or(false, |code| self.codes.iter().any(|c| c == code));
        if code_matches {
            return true;
        }

        let message = error.message.to_lowercase();
        self.patterns.iter().any(|p| message.contains(p.as_str()))
    }
}

impl ErrorClassifier<RemoteError> for IdentifierMismatchClassifier {
    fn classify(&self, error: &RemoteError) -> ErrorClass {
        if self.matches(error) {
            ErrorClass::Consistency
        } else {
            ErrorClass::Other
        }
    }
}
