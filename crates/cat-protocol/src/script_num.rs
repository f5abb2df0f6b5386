//! Minimal little-endian sign-magnitude integers, as pushed by Bitcoin script.

use super::*;

pub fn encode(n: u128) -> Vec<u8> {
  let mut bytes = n.to_le_bytes().to_vec();

  while bytes.last() == Some(&0) {
    bytes.pop();
  }

  if bytes.last().is_some_and(|last| last & 0x80 != 0) {
    bytes.push(0);
  }

  bytes
}
