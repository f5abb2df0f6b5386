use super::*;

/// Transaction of a transfer being funded when satoshis ran out.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum Stage {
  #[display("fee merge")]
  Merge,
  #[display("guard commit")]
  Commit,
  #[display("reveal")]
  Reveal,
}

/// Broad class of an [`Error`], as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Display)]
pub enum ErrorKind {
  InvalidAddress,
  InvalidAmount,
  LineageMismatch,
  TooManyInputs,
  InsufficientFunds,
  InsufficientTokens,
  UnlockFailure,
  EncodingError,
  Fault,
}

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum Error {
  #[snafu(display("invalid address `{input}`"))]
  AddressParse {
    input: String,
    source: bitcoin::address::ParseError,
  },
  #[snafu(display("address `{input}` is not valid on {chain}"))]
  AddressNetwork { input: String, chain: Chain },
  #[snafu(display("address `{input}` is not a taproot address"))]
  AddressNotTaproot { input: String },
  #[snafu(display("change address `{input}` is not controlled by the signing key"))]
  ChangeAddress { input: String },
  #[snafu(display("token address `{input}` does not match the token covenant"))]
  TokenAddressMismatch { input: String },
  #[snafu(display("invalid token amount `{input}`: {err}"))]
  InvalidAmount { input: String, err: anyhow::Error },
  #[snafu(display("{tokens} token inputs but {proofs} lineage proofs"))]
  LineageCount { tokens: usize, proofs: usize },
  #[snafu(display("token input {input} has invalid lineage"))]
  Lineage {
    input: usize,
    source: lineage::LineageError,
  },
  #[snafu(display("{inputs} inputs exceed the maximum of {}", MAX_INPUT))]
  TooManyInputs { inputs: usize },
  #[snafu(display("insufficient satoshis balance for {stage} transaction"))]
  InsufficientFunds { stage: Stage },
  #[snafu(display(
    "insufficient token balance: requested {requested}, available {available}"
  ))]
  InsufficientTokens { requested: u128, available: u128 },
  #[snafu(display("unlocking input {input} failed: {diagnostic}"))]
  UnlockFailure { input: usize, diagnostic: String },
  #[snafu(display("state encoding failed"))]
  Encoding { source: cat_protocol::Error },
  #[snafu(display("covenant call for input {input} failed: {err}"))]
  CovenantCall { input: usize, err: anyhow::Error },
  #[snafu(display("invalid private key"))]
  Key { source: bitcoin::key::FromWifError },
  #[snafu(display("P2WPKH addresses require a compressed key"))]
  UncompressedKey {
    source: bitcoin::key::UncompressedPublicKeyError,
  },
  #[snafu(display("input {input} is out of range of a transaction with {inputs} inputs"))]
  InputIndex { input: usize, inputs: usize },
  #[snafu(display("failed to compute taproot signature hash for input {input}"))]
  Sighash {
    input: usize,
    source: bitcoin::sighash::TaprootError,
  },
  #[snafu(display("failed to compute segwit v0 signature hash for input {input}"))]
  SegwitSighash {
    input: usize,
    source: bitcoin::sighash::P2wpkhError,
  },
  #[snafu(display("failed to encode signature hash preimage for input {input}: {reason}"))]
  Preimage { input: usize, reason: String },
  #[snafu(display("input {input} is not signed"))]
  MissingWitness { input: usize },
  #[snafu(display("output {vout} of {value} is dust"))]
  Dust { vout: usize, value: Amount },
  #[snafu(display("outputs of {output} exceed inputs of {input}"))]
  Overspend { input: Amount, output: Amount },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::AddressParse { .. }
      | Self::AddressNetwork { .. }
      | Self::AddressNotTaproot { .. }
      | Self::ChangeAddress { .. }
      | Self::TokenAddressMismatch { .. } => ErrorKind::InvalidAddress,
      Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
      Self::LineageCount { .. } | Self::Lineage { .. } => ErrorKind::LineageMismatch,
      Self::TooManyInputs { .. } => ErrorKind::TooManyInputs,
      Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
      Self::InsufficientTokens { .. } => ErrorKind::InsufficientTokens,
      Self::UnlockFailure { .. } => ErrorKind::UnlockFailure,
      Self::Encoding { .. } => ErrorKind::EncodingError,
      Self::CovenantCall { .. }
      | Self::Key { .. }
      | Self::UncompressedKey { .. }
      | Self::InputIndex { .. }
      | Self::Sighash { .. }
      | Self::SegwitSighash { .. }
      | Self::Preimage { .. }
      | Self::MissingWitness { .. }
      | Self::Dust { .. }
      | Self::Overspend { .. } => ErrorKind::Fault,
    }
  }

  /// Whether the request was refused for reasons the caller can fix, as
  /// opposed to an internal failure.
  pub fn is_rejection(&self) -> bool {
    !matches!(self.kind(), ErrorKind::EncodingError | ErrorKind::Fault)
  }
}

/// `snafu::ResultExt::context` is shadowed by `anyhow::Context::context`, so
/// typed context is attached through this trait instead.
pub(crate) trait ResultExt<T, E>: Sized {
  fn snafu_context<C, E2>(self, context: C) -> Result<T, E2>
  where
    C: snafu::IntoError<E2, Source = E>,
    E2: std::error::Error + ErrorCompat;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E> {
  fn snafu_context<C, E2>(self, context: C) -> Result<T, E2>
  where
    C: snafu::IntoError<E2, Source = E>,
    E2: std::error::Error + ErrorCompat,
  {
    use snafu::ResultExt;
    self.context(context)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds() {
    #[track_caller]
    fn case(error: Error, kind: ErrorKind, rejection: bool) {
      assert_eq!(error.kind(), kind);
      assert_eq!(error.is_rejection(), rejection);
    }

    case(
      Error::AddressNotTaproot { input: "foo".into() },
      ErrorKind::InvalidAddress,
      true,
    );
    case(
      Error::LineageCount {
        tokens: 2,
        proofs: 1,
      },
      ErrorKind::LineageMismatch,
      true,
    );
    case(
      Error::InsufficientFunds {
        stage: Stage::Reveal,
      },
      ErrorKind::InsufficientFunds,
      true,
    );
    case(
      Error::Encoding {
        source: cat_protocol::Error::Slot { slot: 5 },
      },
      ErrorKind::EncodingError,
      false,
    );
    case(Error::MissingWitness { input: 0 }, ErrorKind::Fault, false);
    case(
      Error::InputIndex {
        input: 5,
        inputs: 2,
      },
      ErrorKind::Fault,
      false,
    );
  }

  #[test]
  fn display() {
    assert_eq!(
      Error::InsufficientFunds {
        stage: Stage::Commit
      }
      .to_string(),
      "insufficient satoshis balance for guard commit transaction",
    );
    assert_eq!(
      Error::TooManyInputs { inputs: 7 }.to_string(),
      "7 inputs exceed the maximum of 6",
    );
  }
}
