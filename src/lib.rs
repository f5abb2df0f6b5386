#![allow(clippy::result_large_err, clippy::too_many_arguments)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::{
    arguments::Arguments,
    config::Config,
    decimal::Decimal,
    error::{ResultExt, Stage},
    settings::Settings,
    subcommand::{OutputFormat, Subcommand, SubcommandResult},
  },
  anyhow::{anyhow, bail, ensure, Context},
  bitcoin::{
    address::{Address, NetworkUnchecked},
    consensus::{self, encode::serialize_hex},
    hashes::Hash,
    key::{Keypair, TapTweak},
    locktime::absolute::LockTime,
    secp256k1::{Message, XOnlyPublicKey},
    sighash::{EcdsaSighashType, Prevouts, SighashCache, TapSighashType},
    taproot::{self, ControlBlock, LeafVersion, TapLeafHash, TaprootBuilder, TaprootSpendInfo},
    transaction::Version,
    Amount, CompressedPublicKey, Network, OutPoint, PrivateKey, Script, ScriptBuf, Sequence,
    TapSighash, Transaction, TxIn, TxOut, Txid, Witness,
  },
  cat_protocol::{
    GuardState, OwnerAddress, ProtocolState, TokenState, CHANGE_MIN_POSTAGE, GUARD_POSTAGE,
    MAX_INPUT, STATE_OUTPUT_COUNT, TOKEN_POSTAGE,
  },
  clap::{ArgGroup, Parser},
  derive_more::Display,
  secp256k1::SECP256K1,
  serde::{Deserialize, Deserializer, Serialize},
  serde_with::{serde_as, DeserializeFromStr, DisplayFromStr, PickFirst, SerializeDisplay},
  snafu::{ErrorCompat, Snafu},
  std::{
    env,
    fmt::{self, Formatter},
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    process,
    str::FromStr,
  },
};

pub use self::{
  chain::Chain,
  covenant::{
    CallResult, Covenant, GuardCovenant, GuardTransfer, Leaf, OwnerProof, TokenCovenant,
    TokenUnlock,
  },
  draft::Draft,
  error::{Error, ErrorKind},
  fee_rate::FeeRate,
  lineage::{BacktraceInfo, LineageError, TokenTx, TxHeader},
  metadata::{Token, TokenInfo, TokenMetadata},
  options::Options,
  sighash::SighashContext,
  signer::{AddressType, Signer},
  transfer::{
    create_guard, merge_fee, transfer, ChangeInfo, Commit, GuardContract, GuardInfo, Merged,
    OutputList, TokenContract, TokenPrevTx, Transfer, TransferParams,
  },
  utxo::Utxo,
};


#[cfg(test)]
use self::test::*;

pub mod arguments;
pub mod chain;
mod config;
mod covenant;
pub mod decimal;
mod draft;
mod error;
mod fee_rate;
pub mod lineage;
mod metadata;
pub mod options;
pub mod settings;
mod sighash;
mod signer;
pub mod subcommand;
pub mod transfer;
mod utxo;

type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Exit status of a run rejected for business reasons, such as insufficient
/// funds, as opposed to a failure of the tool itself.
const REJECTED_EXIT_CODE: i32 = 2;

fn default<T: Default>() -> T {
  Default::default()
}

pub fn main() {
  env_logger::init();

  let args = Arguments::parse();

  let format = args.options.format;

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");

      for (i, err) in err.chain().skip(1).enumerate() {
        if i == 0 {
          eprintln!();
          eprintln!("because:");
        }

        eprintln!("- {err}");
      }

      if env::var_os("RUST_BACKTRACE")
        .map(|val| val == "1")
        .unwrap_or_default()
      {
        eprintln!("{}", err.backtrace());
      }

      let rejected = err
        .downcast_ref::<Error>()
        .is_some_and(Error::is_rejection);

      process::exit(if rejected { REJECTED_EXIT_CODE } else { 1 });
    }
    Ok(output) => {
      if let Some(output) = output {
        output.print(format.unwrap_or_default());
      }
    }
  }
}
