//! Validated string types for the naming layer.
//!
//! Validation lives here so that a [`Name`] or [`RecordKey`] in hand is always
//! well-formed; the wire codec and user input paths both funnel through these
//! constructors.

use std::{fmt, str::FromStr};

use arbitrary::{Arbitrary, Unstructured};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// Maximum length of a registrable name, in bytes.
pub const MAX_NAME_LEN: usize = 24;

/// Maximum length of a record key, in bytes.
pub const MAX_RECORD_KEY_LEN: usize = 16;

/// A normalized, registrable name.
///
/// Names are 1 to [`MAX_NAME_LEN`] bytes of `a-z`, `0-9` and `-`, and may not
/// begin or end with a hyphen.
#[derive(
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LEN {
            return false;
        }
        if bytes[0] == b'-' || bytes[bytes.len() - 1] == b'-' {
            return false;
        }
        bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    }
}

impl FromStr for Name {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Name::is_valid(s) {
            Ok(Name(s.to_owned()))
        } else {
            Err(ParseError::InvalidName)
        }
    }
}

impl TryFrom<String> for Name {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> Arbitrary<'a> for Name {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let len = u.int_in_range(1..=MAX_NAME_LEN)?;
        let mut s = String::with_capacity(len);
        for _ in 0..len {
            let idx = u.choose_index(CHARSET.len())?;
            s.push(CHARSET[idx] as char);
        }
        Ok(Name(s))
    }
}

/// A record key under a name.
///
/// Keys are 1 to [`MAX_RECORD_KEY_LEN`] bytes of `A-Z`, `0-9` and `_`.
#[derive(
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey(String);

impl RecordKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_RECORD_KEY_LEN {
            return false;
        }
        bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'_')
    }
}

impl FromStr for RecordKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if RecordKey::is_valid(s) {
            Ok(RecordKey(s.to_owned()))
        } else {
            Err(ParseError::InvalidRecordKey)
        }
    }
}

impl TryFrom<String> for RecordKey {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordKey> for String {
    fn from(value: RecordKey) -> Self {
        value.0
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", self.0)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> Arbitrary<'a> for RecordKey {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";
        let len = u.int_in_range(1..=MAX_RECORD_KEY_LEN)?;
        let mut s = String::with_capacity(len);
        for _ in 0..len {
            let idx = u.choose_index(CHARSET.len())?;
            s.push(CHARSET[idx] as char);
        }
        Ok(RecordKey(s))
    }
}
