//! Types for the state the CAT protocol commits to in transaction outputs.
//!
//! Every contract-bearing transaction carries a `ProtocolState` in an
//! `OP_RETURN` at output 0. Slot `i` of the state holds the hash of the state
//! of output `i + 1`, so a covenant can check the state of any output it
//! produces or consumes against a single 20-byte root.

use {
  bitcoin::{
    hashes::{hash160, Hash},
    opcodes::all::{OP_PUSHBYTES_24, OP_RETURN},
    Amount, Script, ScriptBuf,
  },
  thiserror::Error,
};

pub use {guard_state::GuardState, protocol_state::ProtocolState, token_state::TokenState};

pub mod script_num;

mod guard_state;
mod protocol_state;
mod token_state;

/// Number of outputs after output 0 whose state can be committed.
pub const STATE_OUTPUT_COUNT: usize = 5;

/// Maximum number of inputs of a transaction spending contract outputs.
pub const MAX_INPUT: usize = 6;

pub const TOKEN_POSTAGE: Amount = Amount::from_sat(330);
pub const MINTER_POSTAGE: Amount = Amount::from_sat(331);
pub const GUARD_POSTAGE: Amount = Amount::from_sat(332);

/// Change below or at this value is not worth creating.
pub const CHANGE_MIN_POSTAGE: Amount = Amount::from_sat(546);

pub type OwnerAddress = [u8; 20];

pub fn hash160(data: &[u8]) -> [u8; 20] {
  hash160::Hash::hash(data).to_byte_array()
}

#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("state slot {slot} out of range, capacity is {}", STATE_OUTPUT_COUNT)]
  Slot { slot: usize },
  #[error(
    "state hash list must have {} entries, got {len}",
    STATE_OUTPUT_COUNT
  )]
  HashListLength { len: usize },
  #[error("state hash `{hash}` invalid: {err}")]
  HashHex {
    hash: String,
    err: hex::FromHexError,
  },
  #[error("state hash `{hash}` must be empty or 20 bytes")]
  HashLength { hash: String },
  #[error("guard tracks at most {} token inputs, got {count}", MAX_INPUT)]
  GuardCapacity { count: usize },
}
