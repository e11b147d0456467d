//! Input-output with Bitcoin: the chain-data client abstraction and the
//! chain follower feeding the registration indexer.

pub mod client;
pub mod reader;
pub mod status;

pub use client::{broadcast_raw_tx, ChainTipInfo, ClientError, ClientResult, L1Client};
pub use reader::{l1_reader_task, BlockData, BlockIndexer, L1Event, ReaderError, SyncPhase};
pub use status::L1StatusUpdate;
