//! Transfers of CAT20 tokens.
//!
//! A transfer is built from up to three transactions:
//!
//! - An optional fee merge, consolidating several fee inputs into one.
//! - A guard commit, creating the transfer guard that tracks the amounts of
//!   the token inputs.
//! - A reveal, spending the token inputs, the guard, and the commit's change,
//!   and creating the receiver's and the sender's token outputs.

use super::*;

pub use self::{
  guard::{create_guard, Commit, GuardInfo},
  merge::{merge_fee, Merged},
  params::{Covenants, TokenEntry, TokenStateEntry, TokenUtxo, TransferDocument},
  plan::transfer,
  unlock::{ChangeInfo, OutputList},
};

mod guard;
mod merge;
mod params;
mod plan;
mod unlock;

/// A token output with its state and the state of the transaction that
/// created it.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenContract {
  pub utxo: Utxo,
  pub protocol_state: ProtocolState,
  pub state: TokenState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuardContract {
  pub utxo: Utxo,
  pub protocol_state: ProtocolState,
  pub state: GuardState,
}

/// Hex encoded ancestors of a token input.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrevTx {
  pub prev_tx: String,
  pub prev_prev_tx: String,
}

/// Everything a transfer is built from.
#[derive(Debug, Clone)]
pub struct TransferParams {
  pub chain: Chain,
  pub token: Token,
  pub tokens: Vec<TokenContract>,
  pub token_prev_txs: Vec<TokenPrevTx>,
  pub fee_utxos: Vec<Utxo>,
  pub fee_rate: FeeRate,
  pub change_address: Address,
  pub receiver: String,
  pub amount: String,
  pub verify: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
  pub merge_tx: Option<Transaction>,
  pub commit_tx: Transaction,
  pub reveal_tx: Transaction,
  /// Total fee paid by all transactions.
  pub fee: Amount,
}
