use super::*;

#[derive(Default, Debug, Clone)]
pub struct Settings {
  pub(crate) chain: Chain,
  pub(crate) fee_rate: Option<FeeRate>,
  pub(crate) verify_script: bool,
}

impl Settings {
  pub(crate) fn new(options: Options) -> anyhow::Result<Self> {
    let config: Config = match &options.config {
      Some(path) => serde_yaml::from_reader(
        File::open(path).with_context(|| format!("failed to open config {}", path.display()))?,
      )?,
      None => match &options.config_dir {
        Some(dir) if dir.join("cat20.yaml").exists() => {
          serde_yaml::from_reader(File::open(dir.join("cat20.yaml"))?)?
        }
        Some(_) | None => Config::default(),
      },
    };

    let chain = Self::setting_typed(
      options
        .signet
        .then_some(Chain::Signet)
        .or(options.regtest.then_some(Chain::Regtest))
        .or(options.testnet.then_some(Chain::Testnet))
        .or(options.chain_argument),
      Some("CHAIN"),
      config.chain,
    )?
    .unwrap_or_default();

    let fee_rate = Self::setting_typed(options.fee_rate, Some("FEE_RATE"), config.fee_rate)?;

    let verify_script = Self::setting_typed(
      options.verify_script.then_some(true),
      Some("VERIFY_SCRIPT"),
      config.verify_script,
    )?
    .unwrap_or_default();

    log::debug!("using {chain} with fee rate {fee_rate:?}");

    Ok(Self {
      chain,
      fee_rate,
      verify_script,
    })
  }

  pub(crate) fn chain(&self) -> Chain {
    self.chain
  }

  pub(crate) fn fee_rate(&self) -> Option<FeeRate> {
    self.fee_rate
  }

  pub(crate) fn verify_script(&self) -> bool {
    self.verify_script
  }

  fn setting_typed<T: FromStr>(
    arg_value: Option<T>,
    env_key: Option<&str>,
    config_value: Option<T>,
  ) -> anyhow::Result<Option<T>>
  where
    anyhow::Error: From<T::Err>,
  {
    if let Some(arg_value) = arg_value {
      return Ok(Some(arg_value));
    }

    if let Some(env_key) = env_key {
      match env::var(format!("CAT20_{env_key}")) {
        Ok(env_value) => {
          return env_value
            .parse::<T>()
            .map(Some)
            .map_err(anyhow::Error::from)
            .with_context(|| anyhow!("failed to parse {env_key}"))
        }
        Err(err @ env::VarError::NotUnicode(_)) => return Err(err.into()),
        Err(env::VarError::NotPresent) => {}
      }
    }

    Ok(config_value)
  }
}
