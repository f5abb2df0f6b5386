use {super::*, crate::transfer::TransferDocument};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub merge: Option<TransactionOutput>,
  pub commit: TransactionOutput,
  pub reveal: TransactionOutput,
  pub fee: u64,
}

#[derive(Debug, Parser)]
pub(crate) struct Transfer {
  #[clap(flatten)]
  key: KeyArguments,
  #[arg(help = "Build the transfer described by <DOCUMENT>.")]
  document: PathBuf,
}

impl Transfer {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let signer = self.key.signer(settings.chain())?;

    let (params, token_covenant, guard_covenant) = TransferDocument::load(&self.document)?
      .into_params(
        settings.chain(),
        settings.fee_rate(),
        settings.verify_script(),
      )?;

    let transfer = crate::transfer::transfer(&signer, &params, &token_covenant, &guard_covenant)?;

    Ok(Some(Box::new(Output {
      merge: transfer.merge_tx.as_ref().map(TransactionOutput::from),
      commit: TransactionOutput::from(&transfer.commit_tx),
      reveal: TransactionOutput::from(&transfer.reveal_tx),
      fee: transfer.fee.to_sat(),
    })))
  }
}
