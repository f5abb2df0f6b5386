use super::*;

// Witness sizes used when estimating the size of unsigned key path spends.
const SCHNORR_SIGNATURE_SIZE: usize = 64;
const ECDSA_SIGNATURE_SIZE: usize = 72;
const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// A transaction under construction, together with the outputs it spends.
///
/// Inputs and their prevouts are fixed at creation. Outputs, witnesses, and
/// output values may change until the transaction is finished with
/// `serialize` or `finish`.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
  fee_rate: FeeRate,
  prevouts: Vec<TxOut>,
  tx: Transaction,
}

impl Draft {
  pub fn new(utxos: &[Utxo], fee_rate: FeeRate) -> Self {
    Self {
      fee_rate,
      prevouts: utxos.iter().map(|utxo| utxo.tx_out.clone()).collect(),
      tx: Transaction {
        version: Version(2),
        lock_time: LockTime::ZERO,
        input: utxos
          .iter()
          .map(|utxo| TxIn {
            previous_output: utxo.outpoint,
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            ..default()
          })
          .collect(),
        output: Vec::new(),
      },
    }
  }

  pub fn tx(&self) -> &Transaction {
    &self.tx
  }

  pub fn prevouts(&self) -> &[TxOut] {
    &self.prevouts
  }

  pub fn push_output(&mut self, output: TxOut) -> usize {
    self.tx.output.push(output);
    self.tx.output.len() - 1
  }

  pub fn set_value(&mut self, vout: usize, value: Amount) {
    self.tx.output[vout].value = value;
  }

  pub fn set_witness(&mut self, input: usize, witness: Witness) {
    self.tx.input[input].witness = witness;
  }

  pub fn clear_witnesses(&mut self) {
    for input in &mut self.tx.input {
      input.witness.clear();
    }
  }

  pub fn input_value(&self) -> Amount {
    self.prevouts.iter().map(|prevout| prevout.value).sum()
  }

  pub fn output_value(&self) -> Amount {
    self.tx.output.iter().map(|output| output.value).sum()
  }

  pub fn vsize(&self) -> usize {
    self.tx.vsize()
  }

  /// Virtual size once unsigned key path inputs are signed.
  pub fn estimated_vsize(&self) -> usize {
    let mut tx = self.tx.clone();

    for (input, prevout) in tx.input.iter_mut().zip(&self.prevouts) {
      if !input.witness.is_empty() {
        continue;
      }

      if prevout.script_pubkey.is_p2tr() {
        input.witness = Witness::from_slice(&[vec![0; SCHNORR_SIGNATURE_SIZE]]);
      } else if prevout.script_pubkey.is_p2wpkh() {
        input.witness = Witness::from_slice(&[
          vec![0; ECDSA_SIGNATURE_SIZE],
          vec![0; COMPRESSED_PUBLIC_KEY_SIZE],
        ]);
      }
    }

    tx.vsize()
  }

  /// Append an output to `script_pubkey` carrying everything not spent on
  /// outputs or fees. Returns the index of the new output, or `None`, leaving
  /// the draft unchanged, if the change would not exceed the dust limit.
  pub fn add_change(&mut self, script_pubkey: ScriptBuf) -> Option<usize> {
    let dust = script_pubkey.minimal_non_dust();

    let vout = self.push_output(TxOut {
      value: Amount::ZERO,
      script_pubkey,
    });

    let change = self
      .input_value()
      .checked_sub(self.output_value())
      .and_then(|remaining| remaining.checked_sub(self.fee_rate.fee(self.estimated_vsize())))
      .filter(|change| *change > dust);

    match change {
      Some(change) => {
        self.set_value(vout, change);
        Some(vout)
      }
      None => {
        self.tx.output.pop();
        None
      }
    }
  }

  /// Check that every input is signed, no output is dust, and outputs do not
  /// exceed inputs, and return the finished transaction.
  pub fn finish(self) -> Result<Transaction> {
    for (input, txin) in self.tx.input.iter().enumerate() {
      if txin.witness.is_empty() {
        return Err(Error::MissingWitness { input });
      }
    }

    for (vout, output) in self.tx.output.iter().enumerate() {
      if !output.script_pubkey.is_op_return()
        && output.value < output.script_pubkey.minimal_non_dust()
      {
        return Err(Error::Dust {
          vout,
          value: output.value,
        });
      }
    }

    if self.output_value() > self.input_value() {
      return Err(Error::Overspend {
        input: self.input_value(),
        output: self.output_value(),
      });
    }

    Ok(self.tx)
  }
}
