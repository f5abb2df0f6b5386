use {super::*, crate::utxo::FeeUtxoEntry};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub transaction: TransactionOutput,
  pub fee: u64,
  pub outpoint: OutPoint,
  pub value: u64,
}

#[derive(Debug, Parser)]
pub(crate) struct Merge {
  #[clap(flatten)]
  key: KeyArguments,
  #[arg(help = "Merge fee inputs listed in <UTXOS>, a JSON or YAML array.")]
  utxos: PathBuf,
}

impl Merge {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let signer = self.key.signer(settings.chain())?;

    let file = File::open(&self.utxos)
      .with_context(|| format!("failed to open {}", self.utxos.display()))?;

    let utxos = serde_yaml::from_reader::<_, Vec<FeeUtxoEntry>>(file)
      .with_context(|| format!("failed to deserialize {}", self.utxos.display()))?
      .into_iter()
      .map(Utxo::from)
      .collect::<Vec<Utxo>>();

    ensure!(!utxos.is_empty(), "no fee inputs to merge");

    let merged = merge_fee(&signer, &utxos, settings.fee_rate().unwrap_or_default())?;

    Ok(Some(Box::new(Output {
      transaction: TransactionOutput::from(&merged.tx),
      fee: merged.fee.to_sat(),
      outpoint: merged.utxo.outpoint,
      value: merged.utxo.value().to_sat(),
    })))
  }
}
