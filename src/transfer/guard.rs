use super::*;

const STATE_VOUT: usize = 0;
const GUARD_VOUT: usize = 1;
const CHANGE_VOUT: usize = 2;

/// A guard commit transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
  pub tx: Transaction,
  pub guard: GuardContract,
  /// Change output, which funds the reveal.
  pub change: Utxo,
  pub fee: Amount,
}

/// The guard a token input is released by, as the token covenant sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardInfo {
  pub output_index: u32,
  pub input_index: usize,
  pub commit: TxHeader,
  pub state: GuardState,
}

impl GuardInfo {
  pub fn new(commit: &Commit, input_index: usize) -> Self {
    Self {
      output_index: commit.guard.utxo.outpoint.vout,
      input_index,
      commit: TxHeader::new(&commit.tx),
      state: commit.guard.state.clone(),
    }
  }

  pub(crate) fn arguments(&self) -> Vec<Vec<u8>> {
    let mut arguments = vec![
      self.output_index.to_le_bytes().to_vec(),
      cat_protocol::script_num::encode(self.input_index as u128),
    ];
    arguments.extend(self.commit.arguments());
    arguments.push(self.state.encode());
    arguments
  }
}

/// Create the guard for a transfer of `tokens`, funded by `fee_utxo`.
///
/// The guard records the amount of each token input, in input order, and
/// is the second output of the commit. The first output commits to the
/// guard's state, and the third returns the remaining satoshis, less one, to
/// `change_address`.
pub fn create_guard(
  signer: &Signer,
  fee_utxo: &Utxo,
  fee_rate: FeeRate,
  tokens: &[TokenContract],
  token_script: &Script,
  covenant: &dyn GuardCovenant,
  change_address: &Address,
) -> Result<Commit> {
  let state = GuardState::new(
    token_script.to_owned(),
    &tokens
      .iter()
      .map(|token| token.state.amount)
      .collect::<Vec<u128>>(),
  )
  .snafu_context(error::Encoding)?;

  let protocol_state = ProtocolState::empty()
    .commit(0, &state.encode())
    .snafu_context(error::Encoding)?;

  let mut draft = Draft::new(&[fee_utxo.clone()], fee_rate);

  draft.push_output(TxOut {
    value: Amount::ZERO,
    script_pubkey: protocol_state.state_script(),
  });

  draft.push_output(TxOut {
    value: GUARD_POSTAGE,
    script_pubkey: covenant.script_pubkey(),
  });

  let vout = draft
    .add_change(change_address.script_pubkey())
    .ok_or(Error::InsufficientFunds {
      stage: Stage::Commit,
    })?;

  assert_eq!(vout, CHANGE_VOUT);

  draft.set_value(vout, draft.tx().output[vout].value - Amount::ONE_SAT);

  signer.sign(&mut draft)?;

  let fee = draft.input_value() - draft.output_value();

  let tx = draft.finish()?;

  let txid = tx.compute_txid();

  log::info!("guard commit {txid} for {} token inputs", tokens.len());

  Ok(Commit {
    guard: GuardContract {
      utxo: Utxo::from_tx(&tx, GUARD_VOUT).expect("commit should have guard output"),
      protocol_state,
      state,
    },
    change: Utxo::from_tx(&tx, vout).expect("commit should have change output"),
    fee,
    tx,
  })
}
