use {super::*, crate::transfer::TransferDocument};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub inputs: Vec<Input>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Input {
  pub outpoint: OutPoint,
  pub amount: Decimal,
  pub covenant_input: usize,
  pub prev_prev_txid: Txid,
}

#[derive(Debug, Parser)]
pub(crate) struct Lineage {
  #[arg(help = "Check the token inputs of <DOCUMENT>.")]
  document: PathBuf,
}

impl Lineage {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let (params, _, _) =
      TransferDocument::load(&self.document)?.into_params(settings.chain(), None, false)?;

    ensure!(
      params.tokens.len() == params.token_prev_txs.len(),
      Error::LineageCount {
        tokens: params.tokens.len(),
        proofs: params.token_prev_txs.len(),
      },
    );

    let mut inputs = Vec::new();

    for (input, (token, prev)) in params.tokens.iter().zip(&params.token_prev_txs).enumerate() {
      let token_tx = crate::lineage::validate(&params.token, &prev.prev_tx, &prev.prev_prev_tx)
        .and_then(|token_tx| {
          token_tx.check(token, &params.token.token_script)?;
          Ok(token_tx)
        })
        .map_err(|source| Error::Lineage { input, source })?;

      inputs.push(Input {
        outpoint: token.utxo.outpoint,
        amount: Decimal::from_integer(token.state.amount, params.token.decimals),
        covenant_input: token_tx.prev_tx_input,
        prev_prev_txid: token_tx.prev_prev_tx.compute_txid(),
      });
    }

    Ok(Some(Box::new(Output { inputs })))
  }
}
