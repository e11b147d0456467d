//! Builders for commitment-bearing transactions and PSBTs.

use bitcoin::{
    absolute::LockTime, transaction::Version, Amount, OutPoint, Psbt, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
};
use stela_nametx::codec::encode_commitment_script;
use stela_nametx::Commitment;
use stela_params::ProtocolParams;
use stela_primitives::buf::Buf32;

/// A spend of a synthetic outpoint carrying `commitment` in an OP_RETURN
/// output.  `salt` varies the outpoint so txids differ within a block.
pub fn commitment_tx(params: &ProtocolParams, commitment: &Commitment, salt: u8) -> Transaction {
    let script_pubkey =
        encode_commitment_script(params, commitment).expect("test commitment fits");
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from(Buf32::new([salt; 32])), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![
            TxOut {
                value: Amount::from_sat(5_000),
                script_pubkey: ScriptBuf::new(),
            },
            TxOut {
                value: params.commitment_output_value,
                script_pubkey,
            },
        ],
    }
}

/// A transaction carrying several commitments as consecutive outputs.
pub fn multi_commitment_tx(
    params: &ProtocolParams,
    commitments: &[Commitment],
    salt: u8,
) -> Transaction {
    let mut tx = commitment_tx(params, &commitments[0], salt);
    for commitment in &commitments[1..] {
        tx.output.push(TxOut {
            value: params.commitment_output_value,
            script_pubkey: encode_commitment_script(params, commitment)
                .expect("test commitment fits"),
        });
    }
    tx
}

/// Unsigned single-input PSBT with `witness_utxo` populated, spending
/// `input_value` into one `output_value` output.
pub fn unsigned_psbt(input_value: Amount, output_value: Amount) -> Psbt {
    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from(Buf32::new([0x42; 32])), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: output_value,
            script_pubkey: ScriptBuf::new(),
        }],
    };
    let mut psbt = Psbt::from_unsigned_tx(tx).expect("tx is unsigned");
    psbt.inputs[0].witness_utxo = Some(TxOut {
        value: input_value,
        script_pubkey: ScriptBuf::new(),
    });
    psbt
}
