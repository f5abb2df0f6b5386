use super::*;

/// A fee merge transaction and the single output it leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
  pub tx: Transaction,
  pub utxo: Utxo,
  pub fee: Amount,
}

/// Consolidate `fee_utxos` into one output back to the signer.
///
/// The output is one satoshi less than the change the fee rate allows, so
/// the effective rate is never below `fee_rate`.
pub fn merge_fee(signer: &Signer, fee_utxos: &[Utxo], fee_rate: FeeRate) -> Result<Merged> {
  let mut draft = Draft::new(fee_utxos, fee_rate);

  let vout = draft
    .add_change(signer.address()?.script_pubkey())
    .ok_or(Error::InsufficientFunds {
      stage: Stage::Merge,
    })?;

  let value = draft.tx().output[vout].value - Amount::ONE_SAT;

  draft.set_value(vout, value);

  signer.sign(&mut draft)?;

  let fee = draft.input_value() - draft.output_value();

  let tx = draft.finish()?;

  log::info!(
    "merged {} fee inputs into {}",
    fee_utxos.len(),
    tx.compute_txid()
  );

  // change is the only output
  let utxo = Utxo::new(
    OutPoint {
      txid: tx.compute_txid(),
      vout: 0,
    },
    tx.output[vout].clone(),
  );

  Ok(Merged { tx, utxo, fee })
}
