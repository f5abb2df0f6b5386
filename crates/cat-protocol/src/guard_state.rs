use super::*;

/// State of a transfer guard.
///
/// `input_token_amounts[i]` is the amount carried by the `i`-th token input of
/// the transaction spending the guard. The guard covenant only releases the
/// tokens if the outputs of that transaction carry the same total, so the
/// order here must match the input order exactly.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GuardState {
  pub token_script: ScriptBuf,
  pub input_token_amounts: [u128; MAX_INPUT],
}

impl GuardState {
  pub fn new(token_script: ScriptBuf, amounts: &[u128]) -> Result<Self, Error> {
    if amounts.len() > MAX_INPUT {
      return Err(Error::GuardCapacity {
        count: amounts.len(),
      });
    }

    let mut input_token_amounts = [0; MAX_INPUT];
    input_token_amounts[..amounts.len()].copy_from_slice(amounts);

    Ok(Self {
      token_script,
      input_token_amounts,
    })
  }

  pub fn encode(&self) -> Vec<u8> {
    let mut bytes = self.token_script.to_bytes();

    for amount in self.input_token_amounts {
      bytes.extend(amount.to_le_bytes());
    }

    bytes
  }
}
