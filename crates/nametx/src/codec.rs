//! Encoding and decoding of name commitments in output scripts.
//!
//! Wire layout, inside a single OP_RETURN data push:
//!
//! ```text
//! [magic: 4][version: 1][kind: 1][name_len: 1][name: name_len][payload...]
//! ```
//!
//! Registration payload is the 32-byte owner key, exactly.  Record-update
//! payload is `[owner: 32][key_len: 1][key: key_len][value...]` with the
//! value running to the end of the push.

use bitcoin::{
    opcodes::all::OP_RETURN,
    script::{Instruction, PushBytesBuf},
    Script, ScriptBuf,
};
use stela_params::ProtocolParams;
use stela_primitives::{
    buf::Buf32,
    errors::ParseError,
    name::{Name, RecordKey},
};

/// Kind tag for registration commitments.
const KIND_REGISTRATION: u8 = 1;

/// Kind tag for record-update commitments.
const KIND_RECORD_UPDATE: u8 = 2;

/// Cap on the whole data push, matching OP_RETURN relay standardness.
pub const MAX_PAYLOAD_LEN: usize = 80;

/// A protocol instruction decoded from one transaction output.
///
/// Commitments are ephemeral; only their effects on the name tables are
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commitment {
    /// Claim `name` for `owner`.
    Registration { name: Name, owner: Buf32 },

    /// Set `key` to `value` under an owned, confirmed `name`.
    RecordUpdate {
        name: Name,
        owner: Buf32,
        key: RecordKey,
        value: Vec<u8>,
    },
}

impl Commitment {
    pub fn name(&self) -> &Name {
        match self {
            Commitment::Registration { name, .. } => name,
            Commitment::RecordUpdate { name, .. } => name,
        }
    }

    pub fn owner(&self) -> &Buf32 {
        match self {
            Commitment::Registration { owner, .. } => owner,
            Commitment::RecordUpdate { owner, .. } => owner,
        }
    }

    fn kind_byte(&self) -> u8 {
        match self {
            Commitment::Registration { .. } => KIND_REGISTRATION,
            Commitment::RecordUpdate { .. } => KIND_RECORD_UPDATE,
        }
    }
}

/// Serializes a commitment into the OP_RETURN script that carries it.
///
/// Fails only when a record value pushes the payload over
/// [`MAX_PAYLOAD_LEN`]; registrations always fit.
pub fn encode_commitment_script(
    params: &ProtocolParams,
    commitment: &Commitment,
) -> Result<ScriptBuf, ParseError> {
    let mut payload = Vec::with_capacity(MAX_PAYLOAD_LEN);
    payload.extend_from_slice(params.magic_bytes.as_bytes());
    payload.push(params.commitment_version);
    payload.push(commitment.kind_byte());

    let name = commitment.name().as_str().as_bytes();
    payload.push(name.len() as u8);
    payload.extend_from_slice(name);

    match commitment {
        Commitment::Registration { owner, .. } => {
            payload.extend_from_slice(owner.as_slice());
        }
        Commitment::RecordUpdate {
            owner, key, value, ..
        } => {
            payload.extend_from_slice(owner.as_slice());
            let key = key.as_str().as_bytes();
            payload.push(key.len() as u8);
            payload.extend_from_slice(key);
            payload.extend_from_slice(value);
        }
    }

    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ParseError::OversizedCommitment);
    }

    let push = PushBytesBuf::try_from(payload).map_err(|_| ParseError::OversizedCommitment)?;
    Ok(ScriptBuf::new_op_return(&push))
}

/// Attempts to interpret an output script as a commitment.
///
/// Returns `None` for anything that is not a well-formed commitment of the
/// expected version; callers treat such outputs as ordinary outputs.  This
/// never fails loudly, classification is the contract.
pub fn decode_commitment_script(params: &ProtocolParams, script: &Script) -> Option<Commitment> {
    if !script.is_op_return() {
        return None;
    }

    let mut instructions = script.instructions();
    match instructions.next() {
        Some(Ok(Instruction::Op(op))) if op == OP_RETURN => {}
        _ => return None,
    }
    let data = match instructions.next() {
        Some(Ok(Instruction::PushBytes(push))) => push.as_bytes(),
        _ => return None,
    };
    if instructions.next().is_some() {
        return None;
    }

    parse_commitment_payload(params, data)
}

fn parse_commitment_payload(params: &ProtocolParams, data: &[u8]) -> Option<Commitment> {
    if data.len() > MAX_PAYLOAD_LEN {
        return None;
    }

    let rest = data.strip_prefix(params.magic_bytes.as_bytes().as_slice())?;
    let (version, rest) = rest.split_first()?;
    if *version != params.commitment_version {
        return None;
    }
    let (kind, rest) = rest.split_first()?;
    let (name_len, rest) = rest.split_first()?;
    if rest.len() < *name_len as usize {
        return None;
    }
    let (name_bytes, rest) = rest.split_at(*name_len as usize);
    let name: Name = std::str::from_utf8(name_bytes).ok()?.parse().ok()?;

    match *kind {
        KIND_REGISTRATION => {
            // Exactly the owner key, nothing trailing.
            let owner: [u8; 32] = rest.try_into().ok()?;
            Some(Commitment::Registration {
                name,
                owner: Buf32::new(owner),
            })
        }
        KIND_RECORD_UPDATE => {
            if rest.len() < 33 {
                return None;
            }
            let (owner_bytes, rest) = rest.split_at(32);
            let owner: [u8; 32] = owner_bytes.try_into().ok()?;
            let (key_len, rest) = rest.split_first()?;
            if rest.len() < *key_len as usize {
                return None;
            }
            let (key_bytes, value) = rest.split_at(*key_len as usize);
            let key: RecordKey = std::str::from_utf8(key_bytes).ok()?.parse().ok()?;
            Some(Commitment::RecordUpdate {
                name,
                owner: Buf32::new(owner),
                key,
                value: value.to_vec(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use arbitrary::{Arbitrary, Unstructured};
    use bitcoin::opcodes::all::OP_DUP;
    use bitcoin::script::Builder;

    use super::*;

    fn params() -> ProtocolParams {
        ProtocolParams::regtest()
    }

    fn owner(byte: u8) -> Buf32 {
        Buf32::new([byte; 32])
    }

    fn registration(name: &str) -> Commitment {
        Commitment::Registration {
            name: name.parse().unwrap(),
            owner: owner(0xaa),
        }
    }

    fn record_update(name: &str, key: &str, value: &[u8]) -> Commitment {
        Commitment::RecordUpdate {
            name: name.parse().unwrap(),
            owner: owner(0xbb),
            key: key.parse().unwrap(),
            value: value.to_vec(),
        }
    }

    #[test]
    fn test_registration_round_trip() {
        let params = params();
        let c = registration("alice");
        let script = encode_commitment_script(&params, &c).unwrap();
        assert!(script.is_op_return());
        assert_eq!(decode_commitment_script(&params, &script), Some(c));
    }

    #[test]
    fn test_record_update_round_trip() {
        let params = params();
        let c = record_update("alice", "NPUB", b"some-value");
        let script = encode_commitment_script(&params, &c).unwrap();
        assert_eq!(decode_commitment_script(&params, &script), Some(c));
    }

    #[test]
    fn test_empty_record_value_round_trip() {
        let params = params();
        let c = record_update("alice", "WEB", b"");
        let script = encode_commitment_script(&params, &c).unwrap();
        assert_eq!(decode_commitment_script(&params, &script), Some(c));
    }

    #[test]
    fn test_arbitrary_commitments_round_trip() {
        let params = params();
        let raw: Vec<u8> = (0u16..2048).map(|i| (i % 251) as u8).collect();
        let mut u = Unstructured::new(&raw);
        for _ in 0..64 {
            let name = Name::arbitrary(&mut u).unwrap();
            let key = RecordKey::arbitrary(&mut u).unwrap();
            let c = Commitment::RecordUpdate {
                name,
                owner: owner(1),
                key,
                value: vec![7; 4],
            };
            let script = encode_commitment_script(&params, &c).unwrap();
            assert_eq!(decode_commitment_script(&params, &script), Some(c));
        }
    }

    #[test]
    fn test_oversized_value_rejected_at_encode() {
        let params = params();
        let c = record_update("alice", "NPUB", &[0u8; 80]);
        assert!(matches!(
            encode_commitment_script(&params, &c),
            Err(ParseError::OversizedCommitment)
        ));
    }

    #[test]
    fn test_decode_rejects_foreign_magic() {
        let params = params();
        let mut other = params.clone();
        other.magic_bytes = "XXXX".parse().unwrap();
        let script = encode_commitment_script(&other, &registration("alice")).unwrap();
        assert_eq!(decode_commitment_script(&params, &script), None);
    }

    #[test]
    fn test_decode_rejects_unknown_version_and_kind() {
        let params = params();

        let mut newer = params.clone();
        newer.commitment_version = params.commitment_version + 1;
        let script = encode_commitment_script(&newer, &registration("alice")).unwrap();
        assert_eq!(decode_commitment_script(&params, &script), None);

        // Hand-build a payload with an unknown kind byte.
        let mut payload = params.magic_bytes.as_bytes().to_vec();
        payload.extend_from_slice(&[params.commitment_version, 9, 1, b'a']);
        payload.extend_from_slice(&[0u8; 32]);
        let push = PushBytesBuf::try_from(payload).unwrap();
        let script = ScriptBuf::new_op_return(&push);
        assert_eq!(decode_commitment_script(&params, &script), None);
    }

    #[test]
    fn test_decode_rejects_truncated_owner() {
        let params = params();
        let mut payload = params.magic_bytes.as_bytes().to_vec();
        payload.extend_from_slice(&[params.commitment_version, KIND_REGISTRATION, 5]);
        payload.extend_from_slice(b"alice");
        payload.extend_from_slice(&[0u8; 31]);
        let push = PushBytesBuf::try_from(payload).unwrap();
        let script = ScriptBuf::new_op_return(&push);
        assert_eq!(decode_commitment_script(&params, &script), None);
    }

    #[test]
    fn test_decode_rejects_trailing_bytes_after_registration() {
        let params = params();
        let mut payload = params.magic_bytes.as_bytes().to_vec();
        payload.extend_from_slice(&[params.commitment_version, KIND_REGISTRATION, 5]);
        payload.extend_from_slice(b"alice");
        payload.extend_from_slice(&[0u8; 33]);
        let push = PushBytesBuf::try_from(payload).unwrap();
        let script = ScriptBuf::new_op_return(&push);
        assert_eq!(decode_commitment_script(&params, &script), None);
    }

    #[test]
    fn test_decode_rejects_invalid_name_charset() {
        let params = params();
        let mut payload = params.magic_bytes.as_bytes().to_vec();
        payload.extend_from_slice(&[params.commitment_version, KIND_REGISTRATION, 5]);
        payload.extend_from_slice(b"ALICE");
        payload.extend_from_slice(&[0u8; 32]);
        let push = PushBytesBuf::try_from(payload).unwrap();
        let script = ScriptBuf::new_op_return(&push);
        assert_eq!(decode_commitment_script(&params, &script), None);
    }

    #[test]
    fn test_decode_ignores_ordinary_scripts() {
        let params = params();
        let p2pkh_ish = Builder::new().push_opcode(OP_DUP).into_script();
        assert_eq!(decode_commitment_script(&params, &p2pkh_ish), None);

        let empty = ScriptBuf::new();
        assert_eq!(decode_commitment_script(&params, &empty), None);
    }

    #[test]
    fn test_decode_rejects_multi_push_op_return() {
        let params = params();
        let script = Builder::new()
            .push_opcode(OP_RETURN)
            .push_slice(*params.magic_bytes.as_bytes())
            .push_slice([1u8, 2, 3])
            .into_script();
        assert_eq!(decode_commitment_script(&params, &script), None);
    }
}
