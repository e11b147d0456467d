//! Fixed-size byte buffers used for hashes and keys.

use std::fmt;

use arbitrary::Arbitrary;
use bitcoin::hashes::Hash;
use borsh::{BorshDeserialize, BorshSerialize};
use const_hex as hex;
use serde::{Deserialize, Serialize};

/// A 32-byte buffer.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Default,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Buf32(pub [u8; 32]);

impl Buf32 {
    pub fn new(data: [u8; 32]) -> Self {
        Self(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn zero() -> Self {
        Self([0; 32])
    }
}

impl From<[u8; 32]> for Buf32 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl From<Buf32> for [u8; 32] {
    fn from(value: Buf32) -> Self {
        value.0
    }
}

impl AsRef<[u8; 32]> for Buf32 {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<bitcoin::Txid> for Buf32 {
    fn from(value: bitcoin::Txid) -> Self {
        Self(value.to_byte_array())
    }
}

impl From<Buf32> for bitcoin::Txid {
    fn from(value: Buf32) -> Self {
        bitcoin::Txid::from_byte_array(value.0)
    }
}

impl From<bitcoin::BlockHash> for Buf32 {
    fn from(value: bitcoin::BlockHash) -> Self {
        Self(value.to_byte_array())
    }
}

impl fmt::Debug for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Display for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Abbreviated form, first and last 4 hex chars.
        let h = hex::encode(self.0);
        write!(f, "{}..{}", &h[..4], &h[60..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf32_txid_round_trip() {
        let buf = Buf32::new([7u8; 32]);
        let txid = bitcoin::Txid::from(buf);
        assert_eq!(Buf32::from(txid), buf);
    }

    #[test]
    fn test_buf32_display_abbreviates() {
        let buf = Buf32::new([0xab; 32]);
        let s = buf.to_string();
        assert_eq!(s, "abab..abab");
    }
}
