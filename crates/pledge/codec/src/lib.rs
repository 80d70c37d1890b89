//! Batch pledge-transfer wire codec.
//!
//! The encoded form is a protocol contract with the ledger, which decodes
//! it independently: bit layout, byte order, and field widths must match
//! exactly on both sides.
//!
//! ## Word layout (consensus-critical)
//!
//! One 64-bit big-endian word per instruction, no padding between words:
//!
//! - bits 63..16: amount in base units (unsigned, max 2^48 - 1)
//! - bits 15..0:  target pledge id (unsigned, max 65535)

#![deny(unsafe_code)]

use pledge_types::PledgeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest amount representable in the 48-bit amount field.
pub const MAX_AMOUNT: u64 = (1 << 48) - 1;

/// Largest pledge id representable in the 16-bit target field.
pub const MAX_TARGET_ID: u64 = u16::MAX as u64;

/// Width of one encoded instruction on the wire.
pub const WORD_BYTES: usize = 8;

/// One transfer instruction: draw `amount` base units against `pledge`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub amount: u64,
    pub pledge: PledgeId,
}

impl TransferInstruction {
    pub fn new(amount: u64, pledge: u64) -> Self {
        Self {
            amount,
            pledge: PledgeId(pledge),
        }
    }
}

/// Codec failures.
///
/// Encoding rejects out-of-range fields before producing any word;
/// decoding rejects malformed framing before returning any instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("amount {0} exceeds the 48-bit amount range")]
    AmountOutOfRange(u64),

    #[error("target pledge id {0} exceeds the 16-bit id range")]
    TargetOutOfRange(u64),

    #[error("batch contains no instructions")]
    EmptyBatch,

    #[error("encoded batch length {0} is not a whole number of 8-byte words")]
    MisalignedBatch(usize),
}

/// Pack one instruction into its 64-bit word.
pub fn encode_word(instruction: &TransferInstruction) -> Result<u64, EncodingError> {
    if instruction.amount > MAX_AMOUNT {
        return Err(EncodingError::AmountOutOfRange(instruction.amount));
    }
    let PledgeId(target) = instruction.pledge;
    if target > MAX_TARGET_ID {
        return Err(EncodingError::TargetOutOfRange(target));
    }
    Ok((instruction.amount << 16) | target)
}

/// Unpack one 64-bit word into its instruction.
///
/// Infallible: a word structurally cannot carry an out-of-range 48-bit
/// amount or 16-bit id.
pub fn decode_word(word: u64) -> TransferInstruction {
    TransferInstruction {
        amount: word >> 16,
        pledge: PledgeId(word & MAX_TARGET_ID),
    }
}

/// Encode a batch into its wire form, one big-endian word per instruction.
pub fn encode_batch(batch: &[TransferInstruction]) -> Result<Vec<u8>, EncodingError> {
    if batch.is_empty() {
        return Err(EncodingError::EmptyBatch);
    }

    let mut encoded = Vec::with_capacity(batch.len() * WORD_BYTES);
    for instruction in batch {
        encoded.extend_from_slice(&encode_word(instruction)?.to_be_bytes());
    }
    Ok(encoded)
}

/// Decode a wire-form batch; the exact inverse of [`encode_batch`].
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<TransferInstruction>, EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::EmptyBatch);
    }
    if bytes.len() % WORD_BYTES != 0 {
        return Err(EncodingError::MisalignedBatch(bytes.len()));
    }

    let mut batch = Vec::with_capacity(bytes.len() / WORD_BYTES);
    for chunk in bytes.chunks_exact(WORD_BYTES) {
        let mut word = [0u8; WORD_BYTES];
        word.copy_from_slice(chunk);
        batch.push(decode_word(u64::from_be_bytes(word)));
    }
    Ok(batch)
}
