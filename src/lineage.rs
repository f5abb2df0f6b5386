//! Token lineage proofs.
//!
//! A token output can only be spent together with the transaction that
//! created it and that transaction's own parent, so the token covenant can
//! check that the token descends from its minter or from another token
//! output, instead of being forged by an arbitrary transaction paying to the
//! token script.

use {super::*, bitcoin::consensus::encode::FromHexError};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum LineageError {
  #[snafu(display("{which} transaction is not valid hex encoded transaction"))]
  Decode {
    which: &'static str,
    source: FromHexError,
  },
  #[snafu(display("no input of {txid} spends the token or minter covenant"))]
  NoCovenantInput { txid: Txid },
  #[snafu(display(
    "input {input} of {txid} spends an output of {expected}, not of {actual}"
  ))]
  AncestorMismatch {
    input: usize,
    txid: Txid,
    expected: Txid,
    actual: Txid,
  },
  #[snafu(display("token output {outpoint} is not created by {txid}"))]
  NotCreatedBy { outpoint: OutPoint, txid: Txid },
  #[snafu(display("token output {outpoint} is not locked to the token covenant"))]
  NotTokenOutput { outpoint: OutPoint },
  #[snafu(display("state of token output {outpoint} is not committed to by {txid}"))]
  StateMismatch { outpoint: OutPoint, txid: Txid },
}

/// A transaction serialized without witnesses, split into the parts its
/// id is computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct TxHeader {
  pub version: Vec<u8>,
  pub inputs: Vec<u8>,
  pub outputs: Vec<u8>,
  pub lock_time: Vec<u8>,
}

impl TxHeader {
  pub fn new(tx: &Transaction) -> Self {
    Self {
      version: consensus::serialize(&tx.version),
      inputs: consensus::serialize(&tx.input),
      outputs: consensus::serialize(&tx.output),
      lock_time: consensus::serialize(&tx.lock_time),
    }
  }

  pub fn txid(&self) -> Txid {
    let mut bytes = self.version.clone();
    bytes.extend(&self.inputs);
    bytes.extend(&self.outputs);
    bytes.extend(&self.lock_time);
    Txid::hash(&bytes)
  }

  pub(crate) fn arguments(&self) -> Vec<Vec<u8>> {
    vec![
      self.version.clone(),
      self.inputs.clone(),
      self.outputs.clone(),
      self.lock_time.clone(),
    ]
  }
}

/// The two ancestors of a token input the token covenant checks.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktraceInfo {
  pub prev_tx: TxHeader,
  pub prev_tx_input: usize,
  pub prev_prev_tx: TxHeader,
}

impl BacktraceInfo {
  pub(crate) fn arguments(&self) -> Vec<Vec<u8>> {
    let mut arguments = self.prev_tx.arguments();
    arguments.push(cat_protocol::script_num::encode(self.prev_tx_input as u128));
    arguments.extend(self.prev_prev_tx.arguments());
    arguments
  }
}

/// Ancestry of a token output, checked by `validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTx {
  pub prev_tx: Transaction,
  pub prev_tx_input: usize,
  pub prev_prev_tx: Transaction,
}

impl TokenTx {
  pub fn backtrace(&self) -> BacktraceInfo {
    BacktraceInfo {
      prev_tx: TxHeader::new(&self.prev_tx),
      prev_tx_input: self.prev_tx_input,
      prev_prev_tx: TxHeader::new(&self.prev_prev_tx),
    }
  }

  /// Check that `token` is an output of the previous transaction, locked to
  /// the token covenant, with the state committed to by that transaction's
  /// state output.
  pub fn check(&self, token: &TokenContract, token_script: &Script) -> Result<(), LineageError> {
    let outpoint = token.utxo.outpoint;
    let txid = self.prev_tx.compute_txid();

    if outpoint.txid != txid {
      return Err(LineageError::NotCreatedBy { outpoint, txid });
    }

    let Some(output) = self.prev_tx.output.get(outpoint.vout as usize) else {
      return Err(LineageError::NotCreatedBy { outpoint, txid });
    };

    if output.script_pubkey.as_script() != token_script || token.utxo.tx_out != *output {
      return Err(LineageError::NotTokenOutput { outpoint });
    }

    let slot = (outpoint.vout as usize).checked_sub(1);

    let committed = self
      .prev_tx
      .output
      .first()
      .and_then(|output| ProtocolState::root_from_script(&output.script_pubkey))
      == Some(token.protocol_state.hash_root())
      && slot.and_then(|slot| token.protocol_state.hash(slot)) == Some(token.state.hash());

    if !committed {
      return Err(LineageError::StateMismatch { outpoint, txid });
    }

    Ok(())
  }
}

/// Decode and check the ancestors of a token output.
///
/// The previous transaction must spend, through a script path, either the
/// token covenant or the minter covenant of `token`, and the spent output
/// must come from `prev_prev_tx`.
pub fn validate(token: &Token, prev_tx: &str, prev_prev_tx: &str) -> Result<TokenTx, LineageError> {
  let prev_tx = consensus::encode::deserialize_hex::<Transaction>(prev_tx)
    .snafu_context(Decode { which: "previous" })?;

  let prev_prev_tx = consensus::encode::deserialize_hex::<Transaction>(prev_prev_tx).snafu_context(
    Decode {
      which: "previous previous",
    },
  )?;

  let txid = prev_tx.compute_txid();

  let prev_tx_input = prev_tx
    .input
    .iter()
    .position(|input| {
      input.witness.len() > 2
        && input.witness.second_to_last().is_some_and(|script| {
          let script_pubkey = Leaf::new(ScriptBuf::from_bytes(script.to_vec())).script_pubkey();
          script_pubkey == token.token_script || script_pubkey == token.minter_script
        })
    })
    .ok_or(LineageError::NoCovenantInput { txid })?;

  let expected = prev_tx.input[prev_tx_input].previous_output.txid;
  let actual = prev_prev_tx.compute_txid();

  if expected != actual {
    return Err(LineageError::AncestorMismatch {
      input: prev_tx_input,
      txid,
      expected,
      actual,
    });
  }

  log::debug!("{txid} spends covenant output {expected} at input {prev_tx_input}");

  Ok(TokenTx {
    prev_tx,
    prev_tx_input,
    prev_prev_tx,
  })
}
