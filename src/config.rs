use super::*;

/// Settings read from `cat20.yaml`.
#[derive(Deserialize, Default, PartialEq, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct Config {
  pub(crate) chain: Option<Chain>,
  pub(crate) fee_rate: Option<FeeRate>,
  pub(crate) verify_script: Option<bool>,
}
