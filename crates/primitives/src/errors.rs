//! Errors during parsing/handling/conversion of primitives.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("name violates the allowed length or character set")]
    InvalidName,

    #[error("record key violates the allowed length or character set")]
    InvalidRecordKey,

    #[error("magic bytes must be exactly 4 bytes")]
    InvalidMagicBytes,

    #[error("payload exceeds the commitment size cap")]
    OversizedCommitment,
}
