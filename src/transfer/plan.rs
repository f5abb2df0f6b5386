use {
  super::{
    unlock::{unlock_guard, unlock_token},
    *,
  },
  std::iter,
};

const RECEIVER_SLOT: usize = 0;
const TOKEN_CHANGE_SLOT: usize = 1;

/// Build a transfer of `params.amount` tokens from `signer` to
/// `params.receiver`.
///
/// All parameters are checked before any transaction is built, and nothing
/// is returned unless every transaction of the transfer was built.
pub fn transfer(
  signer: &Signer,
  params: &TransferParams,
  token_covenant: &dyn TokenCovenant,
  guard_covenant: &dyn GuardCovenant,
) -> Result<Transfer> {
  Plan::new(signer, params, token_covenant, guard_covenant)?.build()
}

/// Satoshis left to the sender by a reveal of `vsize` virtual bytes with
/// `token_outputs` token outputs, if more than the minimum change.
pub(crate) fn satoshi_change(
  input: Amount,
  vsize: usize,
  fee_rate: FeeRate,
  token_outputs: u64,
) -> Option<Amount> {
  input
    .checked_sub(fee_rate.fee(vsize))?
    .checked_sub(TOKEN_POSTAGE.checked_mul(token_outputs)?)
    .filter(|change| *change > CHANGE_MIN_POSTAGE)
}

struct Plan<'a> {
  amount: u128,
  available: u128,
  guard_covenant: &'a dyn GuardCovenant,
  params: &'a TransferParams,
  receiver: Address,
  signer: &'a Signer,
  token_covenant: &'a dyn TokenCovenant,
  token_txs: Vec<TokenTx>,
}

struct Reveal {
  change_vout: usize,
  draft: Draft,
  guard: GuardContract,
  guard_info: GuardInfo,
  new_state: ProtocolState,
  receiver: TokenState,
  token_change: Option<TokenState>,
}

impl<'a> Plan<'a> {
  fn new(
    signer: &'a Signer,
    params: &'a TransferParams,
    token_covenant: &'a dyn TokenCovenant,
    guard_covenant: &'a dyn GuardCovenant,
  ) -> Result<Self> {
    let receiver = params.chain.parse_address(&params.receiver)?;

    if !receiver.script_pubkey().is_p2tr() {
      return Err(Error::AddressNotTaproot {
        input: params.receiver.clone(),
      });
    }

    if params.change_address.script_pubkey() != signer.address()?.script_pubkey() {
      return Err(Error::ChangeAddress {
        input: params.change_address.to_string(),
      });
    }

    let amount = params
      .amount
      .parse::<Decimal>()
      .and_then(|decimal| decimal.to_integer(params.token.decimals))
      .and_then(|amount| {
        ensure!(amount > 0, "amount must be positive");
        Ok(amount)
      })
      .map_err(|err| Error::InvalidAmount {
        input: params.amount.clone(),
        err,
      })?;

    let inputs = params.tokens.len() + 2;

    if inputs > MAX_INPUT {
      return Err(Error::TooManyInputs { inputs });
    }

    if params.token_prev_txs.len() != params.tokens.len() {
      return Err(Error::LineageCount {
        tokens: params.tokens.len(),
        proofs: params.token_prev_txs.len(),
      });
    }

    let token_txs = params
      .tokens
      .iter()
      .zip(&params.token_prev_txs)
      .enumerate()
      .map(|(input, (token, prev))| {
        let token_tx = lineage::validate(&params.token, &prev.prev_tx, &prev.prev_prev_tx)
          .snafu_context(error::Lineage { input })?;

        token_tx
          .check(token, &params.token.token_script)
          .snafu_context(error::Lineage { input })?;

        Ok(token_tx)
      })
      .collect::<Result<Vec<TokenTx>>>()?;

    let available = params
      .tokens
      .iter()
      .try_fold(0u128, |total, token| total.checked_add(token.state.amount))
      .unwrap_or(u128::MAX);

    if available < amount {
      return Err(Error::InsufficientTokens {
        requested: amount,
        available,
      });
    }

    Ok(Self {
      amount,
      available,
      guard_covenant,
      params,
      receiver,
      signer,
      token_covenant,
      token_txs,
    })
  }

  fn build(self) -> Result<Transfer> {
    let params = self.params;

    let (merged, fee_utxo) = match params.fee_utxos.as_slice() {
      [] => {
        return Err(Error::InsufficientFunds {
          stage: Stage::Commit,
        })
      }
      [utxo] => (None, utxo.clone()),
      utxos => {
        let merged = merge_fee(self.signer, utxos, params.fee_rate)?;
        let utxo = merged.utxo.clone();
        (Some(merged), utxo)
      }
    };

    let commit = create_guard(
      self.signer,
      &fee_utxo,
      params.fee_rate,
      &params.tokens,
      &params.token.token_script,
      self.guard_covenant,
      &params.change_address,
    )?;

    let mut reveal = self.reveal(&commit)?;

    let vsize = self.probe_vsize(&mut reveal)?;

    let token_outputs = if reveal.token_change.is_some() { 2 } else { 1 };

    let change = satoshi_change(
      reveal.draft.input_value(),
      vsize,
      params.fee_rate,
      token_outputs,
    )
    .ok_or(Error::InsufficientFunds {
      stage: Stage::Reveal,
    })?;

    reveal.draft.set_value(reveal.change_vout, change);

    self.unlock(&mut reveal, change, params.verify)?;

    self.signer.sign(&mut reveal.draft)?;

    let reveal_fee = reveal.draft.input_value() - reveal.draft.output_value();

    let reveal_tx = reveal.draft.finish()?;

    log::info!(
      "transfer of {} to {} revealed in {}",
      self.amount,
      self.receiver,
      reveal_tx.compute_txid(),
    );

    Ok(Transfer {
      fee: merged.as_ref().map(|merged| merged.fee).unwrap_or_default()
        + commit.fee
        + reveal_fee,
      merge_tx: merged.map(|merged| merged.tx),
      commit_tx: commit.tx,
      reveal_tx,
    })
  }

  /// Draft the reveal spending the token inputs, the guard, and the commit's
  /// change, in that order. Its satoshi change output is left empty.
  fn reveal(&self, commit: &Commit) -> Result<Reveal> {
    let params = self.params;

    let receiver = TokenState::new(
      cat_protocol::hash160(&self.receiver.script_pubkey().as_bytes()[2..]),
      self.amount,
    );

    let mut new_state = ProtocolState::empty()
      .commit(RECEIVER_SLOT, &receiver.encode())
      .snafu_context(error::Encoding)?;

    let token_change = match self.available - self.amount {
      0 => None,
      amount => Some(TokenState::new(self.signer.owner()?, amount)),
    };

    if let Some(token_change) = &token_change {
      new_state = new_state
        .commit(TOKEN_CHANGE_SLOT, &token_change.encode())
        .snafu_context(error::Encoding)?;
    }

    let utxos = params
      .tokens
      .iter()
      .map(|token| token.utxo.clone())
      .chain([commit.guard.utxo.clone(), commit.change.clone()])
      .collect::<Vec<Utxo>>();

    let mut draft = Draft::new(&utxos, params.fee_rate);

    draft.push_output(TxOut {
      value: Amount::ZERO,
      script_pubkey: new_state.state_script(),
    });

    for _ in iter::once(&receiver).chain(&token_change) {
      draft.push_output(TxOut {
        value: TOKEN_POSTAGE,
        script_pubkey: params.token.token_script.clone(),
      });
    }

    let change_vout = draft.push_output(TxOut {
      value: Amount::ZERO,
      script_pubkey: params.change_address.script_pubkey(),
    });

    Ok(Reveal {
      change_vout,
      draft,
      guard: commit.guard.clone(),
      guard_info: GuardInfo::new(commit, params.tokens.len()),
      new_state,
      receiver,
      token_change,
    })
  }

  /// Size of the reveal once unlocked and signed, computed by doing both and
  /// then removing every witness again.
  fn probe_vsize(&self, reveal: &mut Reveal) -> Result<usize> {
    self.unlock(reveal, Amount::ZERO, false)?;
    self.signer.sign(&mut reveal.draft)?;
    let vsize = reveal.draft.vsize();
    reveal.draft.clear_witnesses();
    log::debug!("reveal probed at {vsize} vB");
    Ok(vsize)
  }

  fn unlock(&self, reveal: &mut Reveal, change: Amount, verify: bool) -> Result {
    let guard_input = self.params.tokens.len();

    let inputs = (0..guard_input)
      .map(|input| (input, self.token_covenant.leaf_script()))
      .chain([(guard_input, self.guard_covenant.leaf_script())])
      .collect::<Vec<(usize, &Script)>>();

    let contexts = SighashContext::for_inputs(&reveal.draft, &inputs)?;

    for (input, (token, token_tx)) in self.params.tokens.iter().zip(&self.token_txs).enumerate() {
      unlock_token(
        self.signer,
        token,
        input,
        token_tx,
        &reveal.guard_info,
        &mut reveal.draft,
        &contexts[input],
        self.token_covenant,
        verify,
      )?;
    }

    unlock_guard(
      &reveal.guard,
      &reveal.guard_info,
      guard_input,
      &reveal.new_state,
      &mut reveal.draft,
      &reveal.receiver,
      reveal.token_change.as_ref(),
      &ChangeInfo {
        script: self.params.change_address.script_pubkey(),
        satoshis: change,
      },
      &contexts[guard_input],
      self.guard_covenant,
      verify,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Rejecting(Leaf);

  impl Covenant for Rejecting {
    fn leaf_script(&self) -> &Script {
      self.0.leaf_script()
    }

    fn control_block(&self) -> &ControlBlock {
      self.0.control_block()
    }

    fn script_pubkey(&self) -> ScriptBuf {
      self.0.script_pubkey()
    }

    fn verify(&self, _: &Transaction, _: usize, _: &[TxOut]) -> Result<(), String> {
      Err("stack not clean".into())
    }
  }

  impl GuardCovenant for Rejecting {
    fn transfer(&self, args: &GuardTransfer) -> anyhow::Result<CallResult> {
      self.0.transfer(args)
    }
  }

  struct Failing;

  impl Covenant for Failing {
    fn leaf_script(&self) -> &Script {
      Script::from_bytes(&[0x51])
    }

    fn control_block(&self) -> &ControlBlock {
      unimplemented!()
    }

    fn script_pubkey(&self) -> ScriptBuf {
      token_leaf().script_pubkey()
    }

    fn verify(&self, _: &Transaction, _: usize, _: &[TxOut]) -> Result<(), String> {
      Ok(())
    }
  }

  impl TokenCovenant for Failing {
    fn unlock(&self, _: &TokenUnlock) -> anyhow::Result<CallResult> {
      bail!("argument out of range")
    }
  }

  fn run(params: &TransferParams) -> Result<Transfer> {
    transfer(
      &signer(AddressType::P2tr),
      params,
      &token_leaf(),
      &guard_leaf(),
    )
  }

  fn params(amounts: &[u128], fee_sats: &[u64], amount: &str) -> TransferParams {
    transfer_params(&signer(AddressType::P2tr), amounts, fee_sats, amount)
  }

  #[test]
  fn single_token_single_fee_input() {
    let params = params(&[1_000], &[100_000], "10");

    let transfer = run(&params).unwrap();

    assert_eq!(transfer.merge_tx, None);

    let reveal = &transfer.reveal_tx;

    assert_eq!(reveal.input.len(), 3);
    assert_eq!(reveal.output.len(), 3);
    assert_eq!(reveal.output[1].value, TOKEN_POSTAGE);
    assert_eq!(reveal.output[1].script_pubkey, token_leaf().script_pubkey());
    assert_eq!(
      reveal.output[2].script_pubkey,
      params.change_address.script_pubkey()
    );

    let receiver = TokenState::new(
      cat_protocol::hash160(&receiver().script_pubkey().as_bytes()[2..]),
      1_000,
    );

    assert_eq!(
      ProtocolState::root_from_script(&reveal.output[0].script_pubkey),
      Some(
        ProtocolState::empty()
          .commit(0, &receiver.encode())
          .unwrap()
          .hash_root()
      ),
    );
  }

  #[test]
  fn token_change() {
    let params = params(&[500, 200], &[100_000], "6");

    let reveal = run(&params).unwrap().reveal_tx;

    assert_eq!(reveal.input.len(), 4);
    assert_eq!(reveal.output.len(), 4);
    assert_eq!(reveal.output[2].value, TOKEN_POSTAGE);
    assert_eq!(reveal.output[2].script_pubkey, token_leaf().script_pubkey());
    assert_eq!(
      reveal.output[3].script_pubkey,
      params.change_address.script_pubkey()
    );

    let signer = signer(AddressType::P2tr);

    let state = ProtocolState::empty()
      .commit(
        0,
        &TokenState::new(
          cat_protocol::hash160(&receiver().script_pubkey().as_bytes()[2..]),
          600,
        )
        .encode(),
      )
      .unwrap()
      .commit(1, &TokenState::new(signer.owner().unwrap(), 100).encode())
      .unwrap();

    assert_eq!(
      ProtocolState::root_from_script(&reveal.output[0].script_pubkey),
      Some(state.hash_root()),
    );
  }

  #[test]
  fn transaction_chain() {
    let params = params(&[500, 200], &[30_000, 40_000, 50_000], "7");

    let transfer = run(&params).unwrap();

    let merge_tx = transfer.merge_tx.unwrap();
    let commit_tx = transfer.commit_tx;
    let reveal_tx = transfer.reveal_tx;

    assert_eq!(merge_tx.input.len(), 3);
    assert_eq!(
      commit_tx.input[0].previous_output,
      OutPoint {
        txid: merge_tx.compute_txid(),
        vout: 0,
      }
    );

    let inputs = reveal_tx
      .input
      .iter()
      .map(|input| input.previous_output)
      .collect::<Vec<OutPoint>>();

    assert_eq!(
      inputs,
      [
        params.tokens[0].utxo.outpoint,
        params.tokens[1].utxo.outpoint,
        OutPoint {
          txid: commit_tx.compute_txid(),
          vout: 1,
        },
        OutPoint {
          txid: commit_tx.compute_txid(),
          vout: 2,
        },
      ]
    );
  }

  #[test]
  fn fee_is_paid_at_rate() {
    for amount in ["10", "4"] {
      let params = params(&[1_000], &[100_000], amount);

      let transfer = run(&params).unwrap();

      let reveal = &transfer.reveal_tx;

      let token_outputs = reveal.output.len() - 2;

      let input = TOKEN_POSTAGE + GUARD_POSTAGE + transfer.commit_tx.output[2].value;

      assert_eq!(
        reveal.output.last().unwrap().value,
        input
          - fee_rate().fee(reveal.vsize())
          - TOKEN_POSTAGE * u64::try_from(token_outputs).unwrap(),
      );

      assert_eq!(
        transfer.fee,
        Amount::from_sat(100_000) + TOKEN_POSTAGE
          - reveal.output.iter().map(|output| output.value).sum::<Amount>(),
      );
    }
  }

  #[test]
  fn owner_signatures_are_over_final_transaction() {
    let params = params(&[500, 200], &[100_000], "6");

    let transfer = run(&params).unwrap();
    let reveal = transfer.reveal_tx;

    let prevouts = params
      .tokens
      .iter()
      .map(|token| token.utxo.tx_out.clone())
      .chain(transfer.commit_tx.output[1..=2].iter().cloned())
      .collect::<Vec<TxOut>>();

    let signer = signer(AddressType::P2tr);

    for input in 0..2 {
      let context =
        SighashContext::new(&reveal, &prevouts, input, token_leaf().leaf_script()).unwrap();

      let signature = taproot::Signature::from_slice(reveal.input[input].witness.nth(3).unwrap())
        .unwrap();

      SECP256K1
        .verify_schnorr(
          &signature.signature,
          &Message::from_digest(context.sighash.to_byte_array()),
          &signer.x_only_public_key(),
        )
        .unwrap();
    }
  }

  #[test]
  fn guard_amounts_follow_token_input_order() {
    let params = params(&[500, 200, 300], &[100_000], "9");

    let transfer = run(&params).unwrap();

    let amounts = transfer
      .reveal_tx
      .input
      .iter()
      .filter_map(|input| {
        params
          .tokens
          .iter()
          .find(|token| token.utxo.outpoint == input.previous_output)
          .map(|token| token.state.amount)
      })
      .collect::<Vec<u128>>();

    assert_eq!(amounts, [500, 200, 300]);

    let guard = GuardState::new(token_leaf().script_pubkey(), &amounts).unwrap();

    assert_eq!(
      ProtocolState::root_from_script(&transfer.commit_tx.output[0].script_pubkey),
      Some(
        ProtocolState::empty()
          .commit(0, &guard.encode())
          .unwrap()
          .hash_root()
      ),
    );
  }

  #[test]
  fn probe_is_idempotent() {
    let signer = signer(AddressType::P2tr);
    let params = transfer_params(&signer, &[500, 200], &[100_000], "6");
    let token_leaf = token_leaf();
    let guard_leaf = guard_leaf();

    let plan = Plan::new(&signer, &params, &token_leaf, &guard_leaf).unwrap();

    let commit = create_guard(
      &signer,
      &params.fee_utxos[0],
      params.fee_rate,
      &params.tokens,
      &params.token.token_script,
      &guard_leaf,
      &params.change_address,
    )
    .unwrap();

    let mut reveal = plan.reveal(&commit).unwrap();

    let before = reveal.draft.clone();

    let first = plan.probe_vsize(&mut reveal).unwrap();
    let second = plan.probe_vsize(&mut reveal).unwrap();

    assert_eq!(first, second);
    assert_eq!(reveal.draft, before);
    assert!(first > reveal.draft.vsize());
  }

  #[test]
  fn satoshi_change_boundaries() {
    let rate = fee_rate();

    assert_eq!(
      satoshi_change(Amount::from_sat(10_000), 100, rate, 1),
      Some(Amount::from_sat(10_000 - 1_000 - 330)),
    );
    assert_eq!(
      satoshi_change(Amount::from_sat(10_000), 100, rate, 2),
      Some(Amount::from_sat(10_000 - 1_000 - 660)),
    );
    assert_eq!(
      satoshi_change(Amount::from_sat(1_000 + 330 + 546), 100, rate, 1),
      None,
    );
    assert_eq!(
      satoshi_change(Amount::from_sat(1_000 + 330 + 547), 100, rate, 1),
      Some(Amount::from_sat(547)),
    );
    assert_eq!(satoshi_change(Amount::from_sat(500), 100, rate, 1), None);
  }

  #[test]
  fn insufficient_reveal_funds() {
    assert!(matches!(
      run(&params(&[1_000], &[5_000], "10")),
      Err(Error::InsufficientFunds {
        stage: Stage::Reveal
      }),
    ));
  }

  #[test]
  fn insufficient_commit_funds() {
    assert!(matches!(
      run(&params(&[1_000], &[1_000], "10")),
      Err(Error::InsufficientFunds {
        stage: Stage::Commit
      }),
    ));
  }

  #[test]
  fn no_fee_inputs() {
    assert!(matches!(
      run(&params(&[1_000], &[], "10")),
      Err(Error::InsufficientFunds {
        stage: Stage::Commit
      }),
    ));
  }

  #[test]
  fn insufficient_tokens() {
    assert!(matches!(
      run(&params(&[500], &[100_000], "6")),
      Err(Error::InsufficientTokens {
        requested: 600,
        available: 500,
      }),
    ));
  }

  #[test]
  fn too_many_inputs() {
    let err = run(&params(&[1; 5], &[100_000], "0.01")).unwrap_err();
    assert!(matches!(err, Error::TooManyInputs { inputs: 7 }));
    assert_eq!(err.kind(), ErrorKind::TooManyInputs);
  }

  #[test]
  fn inputs_may_fill_reveal() {
    let params = params(&[1; 4], &[100_000], "0.04");

    let transfer = run(&params).unwrap();

    assert_eq!(transfer.reveal_tx.input.len(), MAX_INPUT);
    assert_eq!(transfer.reveal_tx.output.len(), 3);

    let guard = GuardState::new(token_leaf().script_pubkey(), &[1; 4]).unwrap();

    assert_eq!(guard.input_token_amounts, [1, 1, 1, 1, 0, 0]);

    assert_eq!(
      ProtocolState::root_from_script(&transfer.commit_tx.output[0].script_pubkey),
      Some(
        ProtocolState::empty()
          .commit(0, &guard.encode())
          .unwrap()
          .hash_root()
      ),
    );
  }

  #[test]
  fn lineage_count_mismatch() {
    let mut params = params(&[500, 200], &[100_000], "6");
    params.token_prev_txs.pop();

    let err = run(&params).unwrap_err();

    assert!(matches!(
      err,
      Error::LineageCount {
        tokens: 2,
        proofs: 1
      }
    ));
    assert_eq!(err.kind(), ErrorKind::LineageMismatch);
  }

  #[test]
  fn forged_lineage() {
    let mut params = params(&[500, 200], &[100_000], "6");
    params.token_prev_txs.swap(0, 1);

    assert!(matches!(
      run(&params),
      Err(Error::Lineage {
        input: 0,
        source: LineageError::NotCreatedBy { .. },
      }),
    ));
  }

  #[test]
  fn wrong_ancestor() {
    let mut params = params(&[500, 200], &[100_000], "6");
    params.token_prev_txs[1].prev_prev_tx = params.token_prev_txs[0].prev_prev_tx.clone();

    assert!(matches!(
      run(&params),
      Err(Error::Lineage {
        input: 1,
        source: LineageError::AncestorMismatch { .. },
      }),
    ));
  }

  #[test]
  fn receiver_must_be_taproot() {
    let mut params = params(&[1_000], &[100_000], "10");
    params.receiver = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".into();

    let err = run(&params).unwrap_err();

    assert!(matches!(err, Error::AddressNotTaproot { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);
  }

  #[test]
  fn receiver_must_parse() {
    let mut params = params(&[1_000], &[100_000], "10");
    params.receiver = "foo".into();

    assert!(matches!(run(&params), Err(Error::AddressParse { .. })));
  }

  #[test]
  fn change_address_must_be_signers() {
    let mut params = params(&[1_000], &[100_000], "10");
    params.change_address = receiver();

    assert!(matches!(run(&params), Err(Error::ChangeAddress { .. })));
  }

  #[test]
  fn invalid_amounts() {
    for amount in ["abc", "1.234", "0", "-1", ""] {
      let err = run(&params(&[1_000], &[100_000], amount)).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::InvalidAmount, "{amount}");
    }
  }

  #[test]
  fn verification_failure() {
    let params = params(&[1_000], &[100_000], "10");

    let err = transfer(
      &signer(AddressType::P2tr),
      &params,
      &token_leaf(),
      &Rejecting(guard_leaf()),
    )
    .unwrap_err();

    assert!(matches!(
      &err,
      Error::UnlockFailure { input: 1, diagnostic } if diagnostic == "stack not clean",
    ));
    assert!(err.is_rejection());
  }

  #[test]
  fn verification_is_optional() {
    let mut params = params(&[1_000], &[100_000], "10");
    params.verify = false;

    transfer(
      &signer(AddressType::P2tr),
      &params,
      &token_leaf(),
      &Rejecting(guard_leaf()),
    )
    .unwrap();
  }

  #[test]
  fn covenant_failure_is_a_fault() {
    let params = params(&[1_000], &[100_000], "10");

    let err = transfer(&signer(AddressType::P2tr), &params, &Failing, &guard_leaf()).unwrap_err();

    assert!(matches!(err, Error::CovenantCall { input: 0, .. }));
    assert!(!err.is_rejection());
  }

  #[test]
  fn segwit_signer() {
    let signer = signer(AddressType::P2wpkh);

    let params = transfer_params(&signer, &[500, 200], &[30_000, 40_000], "6");

    let transfer = transfer(&signer, &params, &token_leaf(), &guard_leaf()).unwrap();

    let reveal = &transfer.reveal_tx;

    assert_eq!(reveal.input.len(), 4);
    assert_eq!(reveal.input[3].witness.len(), 2);
    assert_eq!(
      reveal.output[2].value,
      TOKEN_POSTAGE,
    );
    assert_eq!(
      transfer.fee,
      Amount::from_sat(70_000) + TOKEN_POSTAGE * 2
        - reveal.output.iter().map(|output| output.value).sum::<Amount>(),
    );
  }
}
