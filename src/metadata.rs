use super::*;

/// Token metadata as published by the token's indexer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
  pub minter_addr: Address<NetworkUnchecked>,
  #[serde(default)]
  pub token_addr: Option<Address<NetworkUnchecked>>,
  pub info: TokenInfo,
  #[serde(default)]
  pub token_id: Option<String>,
  #[serde(default)]
  pub genesis_txid: Option<Txid>,
  #[serde(default)]
  pub reveal_txid: Option<Txid>,
  #[serde(default)]
  pub reveal_height: Option<u32>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub symbol: Option<String>,
  pub decimals: u8,
  #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
  pub max: Option<u128>,
  #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
  pub limit: Option<u128>,
  #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
  pub premine: Option<u128>,
}

/// Metadata checked against a chain and resolved to the scripts lineage is
/// verified against.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub decimals: u8,
  pub minter_script: ScriptBuf,
  pub token_script: ScriptBuf,
}

impl TokenMetadata {
  /// Resolve against `chain`. A missing token address is derived from the
  /// token covenant, a present one must match it.
  pub fn resolve<C: Covenant + ?Sized>(&self, chain: Chain, covenant: &C) -> Result<Token> {
    let minter = chain.check_address(
      self.minter_addr.clone(),
      &self.minter_addr.clone().assume_checked().to_string(),
    )?;

    let token_script = covenant.script_pubkey();

    if let Some(token_addr) = &self.token_addr {
      let input = token_addr.clone().assume_checked().to_string();

      let token = chain.check_address(token_addr.clone(), &input)?;

      if token.script_pubkey() != token_script {
        return Err(Error::TokenAddressMismatch { input });
      }
    }

    Ok(Token {
      decimals: self.info.decimals,
      minter_script: minter.script_pubkey(),
      token_script,
    })
  }
}
