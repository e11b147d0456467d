use std::{fmt, str::FromStr};

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// Magic bytes prefixing every commitment payload on the wire, letting the
/// indexer discard unrelated OP_RETURN outputs without parsing them.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct MagicBytes([u8; 4]);

impl MagicBytes {
    pub const LEN: usize = 4;

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for MagicBytes {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl fmt::Debug for MagicBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MagicBytes({})", self)
    }
}

impl fmt::Display for MagicBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", *b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for MagicBytes {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParseError::InvalidMagicBytes)?;
        Ok(Self(bytes))
    }
}
