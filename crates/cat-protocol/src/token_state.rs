use super::*;

/// One owner's token balance, committed to by the output carrying it.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct TokenState {
  pub owner: OwnerAddress,
  pub amount: u128,
}

impl TokenState {
  pub fn new(owner: OwnerAddress, amount: u128) -> Self {
    Self { owner, amount }
  }

  pub fn encode(&self) -> Vec<u8> {
    let mut bytes = self.owner.to_vec();
    bytes.extend(script_num::encode(self.amount));
    bytes
  }

  pub fn hash(&self) -> [u8; 20] {
    hash160(&self.encode())
  }
}
