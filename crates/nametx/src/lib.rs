//! Commitment codec, transaction filtering and PSBT augmentation for the
//! naming layer.

pub mod augment;
pub mod codec;
pub mod filter;

pub use augment::{augment_psbt, AugmentError};
pub use codec::Commitment;
