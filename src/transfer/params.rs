use {super::*, crate::utxo::FeeUtxoEntry};

/// A transfer request, as written by wallets in JSON or YAML.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferDocument {
  pub token_metadata: TokenMetadata,
  pub tokens: Vec<TokenEntry>,
  pub token_prev_txs: Vec<TokenPrevTx>,
  pub fee_inputs: Vec<FeeUtxoEntry>,
  #[serde(default)]
  pub fee_rate: Option<FeeRate>,
  pub change_address: String,
  pub to_address: String,
  #[serde(deserialize_with = "string_or_number")]
  pub token_amount: String,
  pub covenants: Covenants,
  #[serde(default)]
  pub verify_script: bool,
}

/// Compiled leaf scripts of the token and guard covenants, in hex.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Covenants {
  pub token: String,
  pub guard: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry {
  pub utxo: TokenUtxo,
  pub txo_state_hashes: Vec<String>,
  pub state: TokenStateEntry,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUtxo {
  pub tx_id: Txid,
  pub output_index: u32,
  pub script: ScriptBuf,
  #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
  pub satoshis: u64,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenStateEntry {
  #[serde(with = "hex::serde")]
  pub address: OwnerAddress,
  #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
  pub amount: u128,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum StringOrNumber {
    Number(serde_json::Number),
    String(String),
  }

  Ok(match StringOrNumber::deserialize(deserializer)? {
    StringOrNumber::Number(number) => number.to_string(),
    StringOrNumber::String(string) => string,
  })
}

impl TryFrom<TokenEntry> for TokenContract {
  type Error = anyhow::Error;

  fn try_from(entry: TokenEntry) -> anyhow::Result<Self> {
    Ok(Self {
      utxo: Utxo::new(
        OutPoint {
          txid: entry.utxo.tx_id,
          vout: entry.utxo.output_index,
        },
        TxOut {
          value: Amount::from_sat(entry.utxo.satoshis),
          script_pubkey: entry.utxo.script,
        },
      ),
      protocol_state: ProtocolState::from_hash_list(&entry.txo_state_hashes)
        .context("invalid txo state hashes")?,
      state: TokenState::new(entry.state.address, entry.state.amount),
    })
  }
}

impl TransferDocument {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    serde_yaml::from_reader(file)
      .with_context(|| format!("failed to deserialize transfer document {}", path.display()))
  }

  /// Resolve the document against `chain`. A `fee_rate` given here takes
  /// precedence over the document's, and `verify` enables verification even
  /// when the document doesn't ask for it.
  pub fn into_params(
    self,
    chain: Chain,
    fee_rate: Option<FeeRate>,
    verify: bool,
  ) -> anyhow::Result<(TransferParams, Leaf, Leaf)> {
    let token_covenant = self
      .covenants
      .token
      .parse::<Leaf>()
      .context("invalid token covenant")?;

    let guard_covenant = self
      .covenants
      .guard
      .parse::<Leaf>()
      .context("invalid guard covenant")?;

    let token = self.token_metadata.resolve(chain, &token_covenant)?;

    let change_address = chain.parse_address(&self.change_address)?;

    let params = TransferParams {
      chain,
      token,
      tokens: self
        .tokens
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
          TokenContract::try_from(entry).with_context(|| format!("invalid token input {i}"))
        })
        .collect::<anyhow::Result<Vec<TokenContract>>>()?,
      token_prev_txs: self.token_prev_txs,
      fee_utxos: self.fee_inputs.into_iter().map(Utxo::from).collect(),
      fee_rate: fee_rate.or(self.fee_rate).unwrap_or_default(),
      change_address,
      receiver: self.to_address,
      amount: self.token_amount,
      verify: verify || self.verify_script,
    };

    Ok((params, token_covenant, guard_covenant))
  }
}
