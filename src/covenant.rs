//! Covenants that lock token and guard outputs.
//!
//! A covenant is a tapscript leaf committed to under an unspendable internal
//! key. Spending a covenant output reveals the leaf together with the
//! arguments of one of its public methods. The builders here never interpret
//! the leaf script themselves: the arguments each method takes are assembled
//! into a [`CallResult`], and the covenant turns them into witness elements.

use super::*;

/// x-only key with no known discrete logarithm, from BIP 341.
const NUMS_INTERNAL_KEY: [u8; 32] = [
  0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
  0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
];

/// Arguments of a covenant method call, in the order they are pushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallResult {
  elements: Vec<Vec<u8>>,
}

impl CallResult {
  pub fn bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
    self.elements.push(bytes.as_ref().to_vec());
    self
  }

  pub fn int(self, n: u128) -> Self {
    self.bytes(cat_protocol::script_num::encode(n))
  }

  pub fn bool(self, b: bool) -> Self {
    self.bytes(if b { vec![1] } else { Vec::new() })
  }

  pub fn list<T: AsRef<[u8]>>(self, items: impl IntoIterator<Item = T>) -> Self {
    items.into_iter().fold(self, Self::bytes)
  }

  pub fn elements(&self) -> &[Vec<u8>] {
    &self.elements
  }
}

/// Proof that the spender owns the tokens of an input.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerProof {
  pub pubkey_prefix: Vec<u8>,
  pub pubkey: XOnlyPublicKey,
  pub signature: taproot::Signature,
}

/// Arguments of the token covenant's `unlock` method.
#[derive(Debug, Clone)]
pub struct TokenUnlock<'a> {
  pub owner: &'a OwnerProof,
  pub pre_state: &'a TokenState,
  pub protocol_state: &'a ProtocolState,
  pub guard: &'a GuardInfo,
  pub backtrace: &'a BacktraceInfo,
  pub context: &'a SighashContext,
}

/// Arguments of the guard covenant's `transfer` method.
#[derive(Debug, Clone)]
pub struct GuardTransfer<'a> {
  pub new_state: &'a ProtocolState,
  pub outputs: &'a OutputList,
  pub token_postage: Amount,
  pub change: &'a ChangeInfo,
  pub pre_state: &'a GuardState,
  pub commit: &'a TxHeader,
  pub context: &'a SighashContext,
}

pub trait Covenant {
  fn leaf_script(&self) -> &Script;

  fn control_block(&self) -> &ControlBlock;

  fn script_pubkey(&self) -> ScriptBuf;

  /// Check that input `input` of `tx` satisfies the covenant, returning a
  /// diagnostic if it does not.
  fn verify(&self, tx: &Transaction, input: usize, prevouts: &[TxOut]) -> Result<(), String>;

  fn witness(&self, call: &CallResult) -> Witness {
    let mut witness = Witness::from_slice(call.elements());
    witness.push(self.leaf_script().as_bytes());
    witness.push(self.control_block().serialize());
    witness
  }
}

pub trait TokenCovenant: Covenant {
  fn unlock(&self, args: &TokenUnlock) -> anyhow::Result<CallResult>;
}

pub trait GuardCovenant: Covenant {
  fn transfer(&self, args: &GuardTransfer) -> anyhow::Result<CallResult>;
}

/// A covenant given by its compiled leaf script.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
  control_block: ControlBlock,
  script: ScriptBuf,
  spend_info: TaprootSpendInfo,
}

impl Leaf {
  pub fn new(script: ScriptBuf) -> Self {
    let internal_key =
      XOnlyPublicKey::from_slice(&NUMS_INTERNAL_KEY).expect("NUMS key should be valid");

    let spend_info = TaprootBuilder::new()
      .add_leaf(0, script.clone())
      .expect("adding leaf should work")
      .finalize(SECP256K1, internal_key)
      .expect("finalizing taproot builder should work");

    let control_block = spend_info
      .control_block(&(script.clone(), LeafVersion::TapScript))
      .expect("should compute control block");

    Self {
      control_block,
      script,
      spend_info,
    }
  }
}

impl FromStr for Leaf {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let script = ScriptBuf::from_hex(s).context("invalid covenant script hex")?;
    ensure!(!script.is_empty(), "covenant script is empty");
    Ok(Self::new(script))
  }
}

impl Covenant for Leaf {
  fn leaf_script(&self) -> &Script {
    &self.script
  }

  fn control_block(&self) -> &ControlBlock {
    &self.control_block
  }

  fn script_pubkey(&self) -> ScriptBuf {
    ScriptBuf::new_p2tr_tweaked(self.spend_info.output_key())
  }

  fn verify(&self, tx: &Transaction, input: usize, prevouts: &[TxOut]) -> Result<(), String> {
    let prevout = prevouts
      .get(input)
      .ok_or_else(|| format!("no prevout for input {input}"))?;

    if prevout.script_pubkey != self.script_pubkey() {
      return Err("spent output is not locked to this covenant".into());
    }

    let witness = &tx
      .input
      .get(input)
      .ok_or_else(|| format!("no input {input}"))?
      .witness;

    let (Some(script), Some(control_block)) = (witness.second_to_last(), witness.last()) else {
      return Err("witness has no script path spend".into());
    };

    let control_block = ControlBlock::decode(control_block)
      .map_err(|err| format!("invalid control block: {err}"))?;

    let script = Script::from_bytes(script);

    if script != self.script.as_script() {
      return Err("witness script is not the covenant leaf".into());
    }

    if !control_block.verify_taproot_commitment(
      SECP256K1,
      self.spend_info.output_key().to_inner(),
      script,
    ) {
      return Err("control block does not commit to the covenant leaf".into());
    }

    Ok(())
  }
}

impl TokenCovenant for Leaf {
  fn unlock(&self, args: &TokenUnlock) -> anyhow::Result<CallResult> {
    let TokenUnlock {
      owner,
      pre_state,
      protocol_state,
      guard,
      backtrace,
      context,
    } = args;

    Ok(
      CallResult::default()
        .bool(true)
        .bytes(&owner.pubkey_prefix)
        .bytes(owner.pubkey.serialize())
        .bytes(owner.signature.to_vec())
        .bytes(pre_state.owner)
        .int(pre_state.amount)
        .list(protocol_state.hash_list())
        .list(guard.arguments())
        .list(backtrace.arguments())
        .list(context.arguments()),
    )
  }
}

impl GuardCovenant for Leaf {
  fn transfer(&self, args: &GuardTransfer) -> anyhow::Result<CallResult> {
    let GuardTransfer {
      new_state,
      outputs,
      token_postage,
      change,
      pre_state,
      commit,
      context,
    } = args;

    Ok(
      CallResult::default()
        .list(new_state.hash_list())
        .list(outputs.arguments())
        .int(token_postage.to_sat().into())
        .bytes(change.script.as_bytes())
        .bytes(change.satoshis.to_sat().to_le_bytes())
        .bytes(pre_state.token_script.as_bytes())
        .list(pre_state.input_token_amounts.map(cat_protocol::script_num::encode))
        .list(commit.arguments())
        .list(context.arguments()),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn call_result_encoding() {
    let call = CallResult::default()
      .bool(true)
      .bool(false)
      .int(0)
      .int(500)
      .bytes([1u8, 2])
      .list([[3u8], [4]]);

    assert_eq!(
      call.elements(),
      [
        vec![1],
        vec![],
        vec![],
        vec![0xf4, 0x01],
        vec![1, 2],
        vec![3],
        vec![4]
      ],
    );
  }

  #[test]
  fn leaf_is_p2tr() {
    let leaf = token_leaf();
    assert!(leaf.script_pubkey().is_p2tr());
    assert_eq!(
      leaf.script_pubkey(),
      ScriptBuf::new_p2tr_tweaked(leaf.spend_info.output_key()),
    );
    assert_ne!(leaf.script_pubkey(), guard_leaf().script_pubkey());
  }

  #[test]
  fn leaf_from_str() {
    let leaf = "51".parse::<Leaf>().unwrap();
    assert_eq!(leaf.leaf_script().as_bytes(), [0x51]);
    assert!("".parse::<Leaf>().is_err());
    assert!("zz".parse::<Leaf>().is_err());
  }

  fn spend(leaf: &Leaf, witness: Witness) -> (Transaction, Vec<TxOut>) {
    let tx = Transaction {
      version: Version::TWO,
      lock_time: LockTime::ZERO,
      input: vec![TxIn {
        previous_output: outpoint(1),
        witness,
        ..default()
      }],
      output: Vec::new(),
    };

    let prevouts = vec![TxOut {
      value: TOKEN_POSTAGE,
      script_pubkey: leaf.script_pubkey(),
    }];

    (tx, prevouts)
  }

  #[test]
  fn verify_accepts_leaf_witness() {
    let leaf = token_leaf();
    let (tx, prevouts) = spend(&leaf, leaf.witness(&CallResult::default().int(1)));
    assert_eq!(leaf.verify(&tx, 0, &prevouts), Ok(()));
  }

  #[test]
  fn verify_rejects_foreign_leaf() {
    let leaf = token_leaf();
    let (tx, prevouts) = spend(&leaf, guard_leaf().witness(&CallResult::default()));
    assert_eq!(
      leaf.verify(&tx, 0, &prevouts),
      Err("witness script is not the covenant leaf".into())
    );
  }

  #[test]
  fn verify_rejects_foreign_output() {
    let leaf = token_leaf();
    let (tx, mut prevouts) = spend(&leaf, leaf.witness(&CallResult::default()));
    prevouts[0].script_pubkey = guard_leaf().script_pubkey();
    assert_eq!(
      leaf.verify(&tx, 0, &prevouts),
      Err("spent output is not locked to this covenant".into())
    );
  }

  #[test]
  fn verify_rejects_empty_witness() {
    let leaf = token_leaf();
    let (tx, prevouts) = spend(&leaf, Witness::new());
    assert_eq!(
      leaf.verify(&tx, 0, &prevouts),
      Err("witness has no script path spend".into())
    );
  }
}
