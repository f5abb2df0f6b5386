use super::*;

const TAG: &[u8] = b"cat";
const VERSION: u8 = 1;

/// Hashes of the state of each contract output of a transaction.
///
/// Values are never mutated once built; `commit` returns a new state so the
/// value embedded in an already drafted output can't change underneath it.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ProtocolState {
  hashes: [Option<[u8; 20]>; STATE_OUTPUT_COUNT],
}

impl ProtocolState {
  pub fn empty() -> Self {
    Self::default()
  }

  /// Parse a list of hex state hashes, with the empty string marking an
  /// empty slot.
  pub fn from_hash_list<S: AsRef<str>>(list: &[S]) -> Result<Self, Error> {
    if list.len() != STATE_OUTPUT_COUNT {
      return Err(Error::HashListLength { len: list.len() });
    }

    let mut hashes = [None; STATE_OUTPUT_COUNT];

    for (slot, hash) in list.iter().enumerate() {
      let hash = hash.as_ref();

      if hash.is_empty() {
        continue;
      }

      let bytes = hex::decode(hash).map_err(|err| Error::HashHex {
        hash: hash.into(),
        err,
      })?;

      hashes[slot] = Some(
        bytes
          .try_into()
          .map_err(|_| Error::HashLength { hash: hash.into() })?,
      );
    }

    Ok(Self { hashes })
  }

  pub fn commit(&self, slot: usize, data: &[u8]) -> Result<Self, Error> {
    if slot >= STATE_OUTPUT_COUNT {
      return Err(Error::Slot { slot });
    }

    let mut hashes = self.hashes;
    hashes[slot] = Some(hash160(data));

    Ok(Self { hashes })
  }

  pub fn hash(&self, slot: usize) -> Option<[u8; 20]> {
    self.hashes.get(slot).copied().flatten()
  }

  /// Slot contents as pushed to covenants, empty for unused slots.
  pub fn hash_list(&self) -> Vec<Vec<u8>> {
    self
      .hashes
      .iter()
      .map(|hash| hash.map(|hash| hash.to_vec()).unwrap_or_default())
      .collect()
  }

  pub fn hash_root(&self) -> [u8; 20] {
    let mut preimage = Vec::with_capacity(20 * STATE_OUTPUT_COUNT);

    for hash in self.hash_list() {
      preimage.extend(hash160(&hash));
    }

    hash160(&preimage)
  }

  pub fn state_script(&self) -> ScriptBuf {
    let mut bytes = vec![OP_RETURN.to_u8(), OP_PUSHBYTES_24.to_u8()];
    bytes.extend(TAG);
    bytes.push(VERSION);
    bytes.extend(self.hash_root());
    ScriptBuf::from_bytes(bytes)
  }

  /// Extract the hash root from a state script, if `script` is one.
  pub fn root_from_script(script: &Script) -> Option<[u8; 20]> {
    let bytes = script.as_bytes();

    let prefix_len = 2 + TAG.len() + 1;

    if bytes.len() != prefix_len + 20
      || bytes[0] != OP_RETURN.to_u8()
      || bytes[1] != OP_PUSHBYTES_24.to_u8()
      || &bytes[2..2 + TAG.len()] != TAG
      || bytes[2 + TAG.len()] != VERSION
    {
      return None;
    }

    bytes[prefix_len..].try_into().ok()
  }
}
