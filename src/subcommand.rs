use super::*;

pub mod address;
pub mod lineage;
pub mod merge;
pub mod transfer;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Display the address and token owner of a key")]
  Address(address::Address),
  #[command(about = "Check the lineage of the token inputs of a transfer document")]
  Lineage(lineage::Lineage),
  #[command(about = "Merge fee inputs into one output")]
  Merge(merge::Merge),
  #[command(about = "Build the transactions of a token transfer")]
  Transfer(transfer::Transfer),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    match self {
      Self::Address(address) => address.run(settings),
      Self::Lineage(lineage) => lineage.run(settings),
      Self::Merge(merge) => merge.run(settings),
      Self::Transfer(transfer) => transfer.run(settings),
    }
  }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub enum OutputFormat {
  #[default]
  Json,
  Yaml,
  Minify,
}

pub trait Output: Send {
  fn print(&self, format: OutputFormat);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print(&self, format: OutputFormat) {
    match format {
      OutputFormat::Json => serde_json::to_writer_pretty(io::stdout(), self).ok(),
      OutputFormat::Yaml => serde_yaml::to_writer(io::stdout(), self).ok(),
      OutputFormat::Minify => serde_json::to_writer(io::stdout(), self).ok(),
    };
    println!();
  }
}

pub(crate) type SubcommandResult = anyhow::Result<Option<Box<dyn Output>>>;

/// Key arguments shared by subcommands that sign.
#[derive(Debug, Parser)]
pub(crate) struct KeyArguments {
  #[arg(
    long,
    env = "CAT20_PRIVATE_KEY",
    hide_env_values = true,
    help = "Sign with WIF encoded private key <KEY>."
  )]
  key: String,
  #[arg(
    long,
    value_enum,
    default_value_t,
    help = "Spend and receive with <ADDRESS_TYPE> outputs."
  )]
  address_type: AddressType,
}

impl KeyArguments {
  pub(crate) fn signer(&self, chain: Chain) -> anyhow::Result<Signer> {
    Ok(Signer::from_wif(&self.key, self.address_type, chain)?)
  }
}

/// A transaction as printed by subcommands.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
  pub txid: Txid,
  pub vsize: usize,
  pub hex: String,
}

impl From<&Transaction> for TransactionOutput {
  fn from(tx: &Transaction) -> Self {
    Self {
      txid: tx.compute_txid(),
      vsize: tx.vsize(),
      hex: serialize_hex(tx),
    }
  }
}
