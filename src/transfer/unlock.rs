use super::*;

/// Satoshi change of a reveal, as the guard covenant sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeInfo {
  pub script: ScriptBuf,
  pub satoshis: Amount,
}

/// Outputs of a reveal after the state output, one entry per state slot.
///
/// Slot `i` describes output `i + 1`. Token outputs carry their owner and
/// amount and have `token_mask` set. The satoshi change output follows them
/// and carries its script and value instead.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputList {
  pub owners: [Vec<u8>; STATE_OUTPUT_COUNT],
  pub token_amounts: [u128; STATE_OUTPUT_COUNT],
  pub token_mask: [bool; STATE_OUTPUT_COUNT],
  pub satoshis: [Vec<u8>; STATE_OUTPUT_COUNT],
}

impl OutputList {
  pub fn new(
    receiver: &TokenState,
    token_change: Option<&TokenState>,
    change: &ChangeInfo,
  ) -> Self {
    let mut outputs = Self {
      owners: default(),
      token_amounts: default(),
      token_mask: default(),
      satoshis: default(),
    };

    let mut slot = 0;

    for state in [Some(receiver), token_change].into_iter().flatten() {
      outputs.owners[slot] = state.owner.to_vec();
      outputs.token_amounts[slot] = state.amount;
      outputs.token_mask[slot] = true;
      slot += 1;
    }

    outputs.owners[slot] = change.script.to_bytes();
    outputs.satoshis[slot] = change.satoshis.to_sat().to_le_bytes().to_vec();

    outputs
  }

  pub(crate) fn arguments(&self) -> Vec<Vec<u8>> {
    let mut arguments = self.owners.to_vec();
    arguments.extend(self.token_amounts.map(cat_protocol::script_num::encode));
    arguments.extend(self.token_mask.map(|mask| if mask { vec![1] } else { Vec::new() }));
    arguments.extend(self.satoshis.iter().cloned());
    arguments
  }
}

fn check<C: Covenant + ?Sized>(covenant: &C, draft: &Draft, input: usize, verify: bool) -> Result {
  if !verify {
    return Ok(());
  }

  covenant
    .verify(draft.tx(), input, draft.prevouts())
    .map_err(|diagnostic| {
      log::warn!("input {input} failed covenant verification: {diagnostic}");
      Error::UnlockFailure { input, diagnostic }
    })
}

/// Set the witness of token input `input`, signing for the token's owner.
pub(crate) fn unlock_token(
  signer: &Signer,
  token: &TokenContract,
  input: usize,
  token_tx: &TokenTx,
  guard: &GuardInfo,
  draft: &mut Draft,
  context: &SighashContext,
  covenant: &dyn TokenCovenant,
  verify: bool,
) -> Result {
  let owner = OwnerProof {
    pubkey_prefix: signer.pubkey_prefix()?,
    pubkey: signer.x_only_public_key(),
    signature: signer.sign_schnorr(context.sighash),
  };

  let call = covenant
    .unlock(&TokenUnlock {
      owner: &owner,
      pre_state: &token.state,
      protocol_state: &token.protocol_state,
      guard,
      backtrace: &token_tx.backtrace(),
      context,
    })
    .map_err(|err| Error::CovenantCall { input, err })?;

  draft.set_witness(input, covenant.witness(&call));

  check(covenant, draft, input, verify)
}

/// Set the witness of guard input `input`, releasing the token inputs into
/// the reveal's outputs.
pub(crate) fn unlock_guard(
  guard: &GuardContract,
  guard_info: &GuardInfo,
  input: usize,
  new_state: &ProtocolState,
  draft: &mut Draft,
  receiver: &TokenState,
  token_change: Option<&TokenState>,
  change: &ChangeInfo,
  context: &SighashContext,
  covenant: &dyn GuardCovenant,
  verify: bool,
) -> Result {
  let outputs = OutputList::new(receiver, token_change, change);

  let call = covenant
    .transfer(&GuardTransfer {
      new_state,
      outputs: &outputs,
      token_postage: TOKEN_POSTAGE,
      change,
      pre_state: &guard.state,
      commit: &guard_info.commit,
      context,
    })
    .map_err(|err| Error::CovenantCall { input, err })?;

  draft.set_witness(input, covenant.witness(&call));

  check(covenant, draft, input, verify)
}
