use super::*;

/// The BIP 341 signature message a covenant input commits to, with the
/// pieces covenants rebuild it from.
///
/// A covenant cannot read the transaction spending it, so its caller passes
/// the signature message in, and the covenant checks that message against
/// a signature made with a key whose secret is known to all. The message is
/// only valid for the exact transaction it was computed for: any change to
/// inputs, outputs, or values of the transaction invalidates it.
#[derive(Debug, Clone, PartialEq)]
pub struct SighashContext {
  pub input: usize,
  pub leaf_hash: TapLeafHash,
  pub preimage: Vec<u8>,
  pub sighash: TapSighash,
  pub prevouts: Vec<u8>,
  pub spent_scripts: Vec<ScriptBuf>,
}

impl SighashContext {
  pub fn new(tx: &Transaction, prevouts: &[TxOut], input: usize, leaf: &Script) -> Result<Self> {
    if input >= tx.input.len() {
      return Err(Error::InputIndex {
        input,
        inputs: tx.input.len(),
      });
    }

    let leaf_hash = TapLeafHash::from_script(leaf, LeafVersion::TapScript);

    let mut cache = SighashCache::new(tx);

    let sighash = cache
      .taproot_script_spend_signature_hash(
        input,
        &Prevouts::All(prevouts),
        leaf_hash,
        TapSighashType::Default,
      )
      .snafu_context(error::Sighash { input })?;

    let mut preimage = Vec::new();

    cache
      .taproot_encode_signing_data_to(
        &mut preimage,
        input,
        &Prevouts::All(prevouts),
        None,
        Some((leaf_hash, 0xFFFF_FFFF)),
        TapSighashType::Default,
      )
      .map_err(|err| Error::Preimage {
        input,
        reason: err.to_string(),
      })?;

    Ok(Self {
      input,
      leaf_hash,
      preimage,
      sighash,
      prevouts: tx
        .input
        .iter()
        .flat_map(|txin| consensus::serialize(&txin.previous_output))
        .collect(),
      spent_scripts: prevouts
        .iter()
        .map(|prevout| prevout.script_pubkey.clone())
        .collect(),
    })
  }

  /// Contexts for each `(input, leaf)` pair of `draft`.
  pub fn for_inputs(draft: &Draft, inputs: &[(usize, &Script)]) -> Result<Vec<Self>> {
    inputs
      .iter()
      .map(|(input, leaf)| Self::new(draft.tx(), draft.prevouts(), *input, leaf))
      .collect()
  }

  pub(crate) fn arguments(&self) -> Vec<Vec<u8>> {
    let mut arguments = vec![self.preimage.clone(), self.prevouts.clone()];
    arguments.extend(
      self
        .spent_scripts
        .iter()
        .map(|script| script.to_bytes()),
    );
    arguments
  }
}
