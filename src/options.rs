use super::*;

#[derive(Clone, Default, Debug, Parser)]
#[command(group(
  ArgGroup::new("chains")
    .required(false)
    .args(&["chain_argument", "signet", "regtest", "testnet"]),
))]
pub struct Options {
  #[arg(
    long = "chain",
    value_enum,
    help = "Use <CHAIN>. [default: fractal-mainnet]"
  )]
  pub(crate) chain_argument: Option<Chain>,
  #[arg(long, help = "Load configuration from <CONFIG>.")]
  pub(crate) config: Option<PathBuf>,
  #[arg(long, help = "Load configuration from <CONFIG_DIR>.")]
  pub(crate) config_dir: Option<PathBuf>,
  #[arg(
    long,
    help = "Pay <FEE_RATE> sat/vB unless a transfer document sets one. [default: 1.0]"
  )]
  pub(crate) fee_rate: Option<FeeRate>,
  #[arg(long, short, help = "Specify output format. [default: json]")]
  pub(crate) format: Option<OutputFormat>,
  #[arg(long, short, help = "Use regtest. Equivalent to `--chain regtest`.")]
  pub(crate) regtest: bool,
  #[arg(long, short, help = "Use signet. Equivalent to `--chain signet`.")]
  pub(crate) signet: bool,
  #[arg(long, short, help = "Use testnet. Equivalent to `--chain testnet`.")]
  pub(crate) testnet: bool,
  #[arg(long, help = "Verify every covenant input after unlocking it.")]
  pub(crate) verify_script: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn chain_flags() {
    #[track_caller]
    fn case(args: &[&str], chain: Option<Chain>) {
      let options = Options::try_parse_from(args).unwrap();
      assert_eq!(
        options
          .signet
          .then_some(Chain::Signet)
          .or(options.regtest.then_some(Chain::Regtest))
          .or(options.testnet.then_some(Chain::Testnet))
          .or(options.chain_argument),
        chain
      );
    }

    case(&["cat20"], None);
    case(&["cat20", "--signet"], Some(Chain::Signet));
    case(&["cat20", "-r"], Some(Chain::Regtest));
    case(&["cat20", "--testnet"], Some(Chain::Testnet));
    case(&["cat20", "--chain", "fractal-testnet"], Some(Chain::FractalTestnet));
    case(&["cat20", "--chain", "fractal"], Some(Chain::FractalMainnet));
  }

  #[test]
  fn chain_flags_conflict() {
    assert!(Options::try_parse_from(["cat20", "--signet", "--chain", "regtest"]).is_err());
    assert!(Options::try_parse_from(["cat20", "--signet", "--testnet"]).is_err());
  }

  #[test]
  fn fee_rate_must_be_valid() {
    assert_eq!(
      Options::try_parse_from(["cat20", "--fee-rate", "2.5"])
        .unwrap()
        .fee_rate,
      Some("2.5".parse().unwrap()),
    );
    assert!(Options::try_parse_from(["cat20", "--fee-rate", "-1"]).is_err());
  }
}
