//! PSBT augmentation: appending a commitment output to a user-supplied PSBT.
//!
//! The augmenter never renegotiates fees.  Callers are expected to have the
//! user overestimate fees up front and pass the floor they are unwilling to
//! drop below.

use bitcoin::{Amount, Psbt, TxOut};
use stela_params::ProtocolParams;
use thiserror::Error;
use tracing::debug;

use crate::codec::{encode_commitment_script, Commitment};

/// Errors surfaced to the user when augmentation fails.  None are retried.
#[derive(Debug, Clone, Error)]
pub enum AugmentError {
    /// The PSBT could not be parsed, or carries too little information to
    /// evaluate funds (an input without `witness_utxo`/`non_witness_utxo`).
    #[error("malformed PSBT")]
    MalformedPsbt,

    /// What remains for fees after the new output would drop below the
    /// caller's floor.
    #[error("insufficient funds: {available} sat available, {required} sat required")]
    InsufficientFunds { available: u64, required: u64 },

    /// Some input already carries final signatures; appending an output would
    /// invalidate them.
    #[error("PSBT inputs already finalized")]
    AlreadyFinalized,

    /// The commitment exceeds the output payload cap.
    #[error("commitment does not fit an output payload")]
    OversizedCommitment,
}

/// Appends one output encoding `commitment` to the PSBT, leaving every
/// existing input and output untouched, and re-serializes it.
///
/// `fee_overestimate_floor` is the minimum the caller insists must remain for
/// fees after the new output is accounted for.
pub fn augment_psbt(
    psbt_bytes: &[u8],
    commitment: &Commitment,
    params: &ProtocolParams,
    fee_overestimate_floor: Amount,
) -> Result<Vec<u8>, AugmentError> {
    let mut psbt = Psbt::deserialize(psbt_bytes).map_err(|_| AugmentError::MalformedPsbt)?;

    if psbt
        .inputs
        .iter()
        .any(|input| input.final_script_sig.is_some() || input.final_script_witness.is_some())
    {
        return Err(AugmentError::AlreadyFinalized);
    }

    let available = total_input_value(&psbt)?;
    let spent = psbt
        .unsigned_tx
        .output
        .iter()
        .try_fold(Amount::ZERO, |acc, txout| acc.checked_add(txout.value))
        .ok_or(AugmentError::MalformedPsbt)?;

    let script_pubkey = encode_commitment_script(params, commitment)
        .map_err(|_| AugmentError::OversizedCommitment)?;
    let commitment_value = params.commitment_output_value;

    let required = spent
        .checked_add(commitment_value)
        .and_then(|amount| amount.checked_add(fee_overestimate_floor))
        .ok_or(AugmentError::MalformedPsbt)?;
    if available < required {
        return Err(AugmentError::InsufficientFunds {
            available: available.to_sat(),
            required: required.to_sat(),
        });
    }

    psbt.unsigned_tx.output.push(TxOut {
        value: commitment_value,
        script_pubkey,
    });
    psbt.outputs.push(Default::default());

    debug!(
        txid = %psbt.unsigned_tx.compute_txid(),
        remaining_fee = %(available - required + fee_overestimate_floor),
        "augmented PSBT with commitment output"
    );

    Ok(psbt.serialize())
}

/// Sums the input values, requiring utxo information for every input.
fn total_input_value(psbt: &Psbt) -> Result<Amount, AugmentError> {
    if psbt.inputs.len() != psbt.unsigned_tx.input.len() {
        return Err(AugmentError::MalformedPsbt);
    }

    let mut total = Amount::ZERO;
    for (txin, input) in psbt.unsigned_tx.input.iter().zip(&psbt.inputs) {
        let value = if let Some(utxo) = &input.witness_utxo {
            utxo.value
        } else if let Some(prev_tx) = &input.non_witness_utxo {
            prev_tx
                .output
                .get(txin.previous_output.vout as usize)
                .ok_or(AugmentError::MalformedPsbt)?
                .value
        } else {
            return Err(AugmentError::MalformedPsbt);
        };
        total = total.checked_add(value).ok_or(AugmentError::MalformedPsbt)?;
    }
    Ok(total)
}
