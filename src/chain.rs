use {super::*, clap::ValueEnum};

#[derive(Default, ValueEnum, Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
  #[clap(alias("main"))]
  Mainnet,
  #[clap(alias("test"))]
  Testnet,
  Signet,
  Regtest,
  #[default]
  #[clap(alias("fractal"))]
  FractalMainnet,
  FractalTestnet,
}

impl Chain {
  /// Network whose address encoding the chain uses. Fractal chains use
  /// Bitcoin mainnet addresses.
  pub fn network(self) -> Network {
    match self {
      Self::Mainnet | Self::FractalMainnet | Self::FractalTestnet => Network::Bitcoin,
      Self::Testnet => Network::Testnet,
      Self::Signet => Network::Signet,
      Self::Regtest => Network::Regtest,
    }
  }

  pub fn parse_address(self, input: &str) -> Result<Address> {
    let address = input
      .parse::<Address<NetworkUnchecked>>()
      .snafu_context(error::AddressParse { input })?;

    self.check_address(address, input)
  }

  pub fn check_address(self, address: Address<NetworkUnchecked>, input: &str) -> Result<Address> {
    if !address.is_valid_for_network(self.network()) {
      return Err(Error::AddressNetwork {
        input: input.into(),
        chain: self,
      });
    }

    Ok(address.assume_checked())
  }
}

impl Display for Chain {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Self::Mainnet => "mainnet",
        Self::Regtest => "regtest",
        Self::Signet => "signet",
        Self::Testnet => "testnet",
        Self::FractalMainnet => "fractal-mainnet",
        Self::FractalTestnet => "fractal-testnet",
      }
    )
  }
}

impl FromStr for Chain {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "mainnet" => Ok(Self::Mainnet),
      "regtest" => Ok(Self::Regtest),
      "signet" => Ok(Self::Signet),
      "testnet" => Ok(Self::Testnet),
      "fractal-mainnet" => Ok(Self::FractalMainnet),
      "fractal-testnet" => Ok(Self::FractalTestnet),
      _ => bail!("invalid chain `{s}`"),
    }
  }
}
