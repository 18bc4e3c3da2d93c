//! Recovery Module
//!
//! Detects remote failures caused by stale cached identifiers and self-heals
//! with a single invalidate-and-retry cycle.

mod classify;
mod retry;

pub use classify::{
    ErrorClass, ErrorClassifier, IdentifierMismatchClassifier, CONSISTENCY_ERROR_CODES,
    CONSISTENCY_MESSAGE_PATTERNS,
};
pub use retry::{with_auto_recovery, AutoRecovery, Invalidate};
