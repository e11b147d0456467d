use stela_primitives::l1::L1BlockId;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DbError {
    #[error("entry with idx does not exist")]
    NonExistentEntry,

    #[error("entry with idx already exists")]
    EntryAlreadyExists,

    #[error("tried to insert into {0} out-of-order index {1}")]
    OooInsert(&'static str, u64),

    #[error("canonical chain is empty")]
    CanonicalChainEmpty,

    #[error("revert height {0} above chain tip height {1}")]
    InvalidRevertHeight(u64, u64),

    #[error("missing effect log for block {0}")]
    MissingBlockEffects(L1BlockId),

    #[error("IO Error: {0}")]
    IoError(String),

    /// A database worker task failed in a way that could not be determined.
    #[error("worker task exited strangely")]
    WorkerFailedStrangely,

    /// A concurrent cache load this lookup was waiting on failed; typically
    /// transient and retryable, depending on the underlying database.
    #[error("failed to load a cache entry")]
    CacheLoadFail,

    #[error("codec error {0}")]
    CodecError(String),

    #[error("{0}")]
    Other(String),
}
