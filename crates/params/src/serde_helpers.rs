//! Serde helper modules for serialization/deserialization of Bitcoin types.

use bitcoin::Amount;
use serde::{de::Error, Deserialize, Deserializer, Serializer};
use stela_primitives::l1::MagicBytes;

/// Serialize/deserialize [`Amount`] as integer satoshis ([`u64`]).
pub mod serde_amount_sat {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Amount, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(v.to_sat())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        let sats = u64::deserialize(d)?;
        Ok(Amount::from_sat(sats))
    }
}

/// Serialize/deserialize [`MagicBytes`] using its Display/FromStr implementation.
pub mod serde_magic_bytes {
    use std::str::FromStr;

    use super::*;

    pub fn serialize<S: Serializer>(v: &MagicBytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<MagicBytes, D::Error> {
        let s = String::deserialize(d)?;
        MagicBytes::from_str(&s).map_err(D::Error::custom)
    }
}
