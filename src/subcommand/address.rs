use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub address: String,
  pub address_type: AddressType,
  pub owner: String,
  pub public_key: XOnlyPublicKey,
}

#[derive(Debug, Parser)]
pub(crate) struct Address {
  #[clap(flatten)]
  key: KeyArguments,
}

impl Address {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let signer = self.key.signer(settings.chain())?;

    Ok(Some(Box::new(Output {
      address: signer.address()?.to_string(),
      address_type: signer.address_type(),
      owner: hex::encode(signer.owner()?),
      public_key: signer.x_only_public_key(),
    })))
  }
}
