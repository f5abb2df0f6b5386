use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Utxo {
  pub outpoint: OutPoint,
  pub tx_out: TxOut,
}

impl Utxo {
  pub fn new(outpoint: OutPoint, tx_out: TxOut) -> Self {
    Self { outpoint, tx_out }
  }

  pub fn from_tx(tx: &Transaction, vout: usize) -> Option<Self> {
    Some(Self {
      outpoint: OutPoint {
        txid: tx.compute_txid(),
        vout: vout.try_into().ok()?,
      },
      tx_out: tx.output.get(vout)?.clone(),
    })
  }

  pub fn value(&self) -> Amount {
    self.tx_out.value
  }
}

/// A fee input as listed by wallets and indexers.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeUtxoEntry {
  pub txid: Txid,
  pub vout: u32,
  #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
  pub satoshi: u64,
  pub script_pk: ScriptBuf,
}

impl From<FeeUtxoEntry> for Utxo {
  fn from(entry: FeeUtxoEntry) -> Self {
    Self::new(
      OutPoint {
        txid: entry.txid,
        vout: entry.vout,
      },
      TxOut {
        value: Amount::from_sat(entry.satoshi),
        script_pubkey: entry.script_pk,
      },
    )
  }
}
