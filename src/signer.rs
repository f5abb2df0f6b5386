use {super::*, clap::ValueEnum};

#[derive(Debug, Default, Copy, Clone, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
  #[default]
  P2tr,
  P2wpkh,
}

/// Key the transfer is signed with.
///
/// Token ownership is bound to a 20-byte owner address derived from the key:
/// the hash of the tweaked x-only key for taproot keys, and the hash of the
/// compressed public key for segwit v0 keys.
#[derive(Debug, Clone)]
pub struct Signer {
  address_type: AddressType,
  keypair: Keypair,
  network: Network,
  private_key: PrivateKey,
}

impl Signer {
  pub fn new(private_key: PrivateKey, address_type: AddressType, network: Network) -> Self {
    Self {
      address_type,
      keypair: Keypair::from_secret_key(SECP256K1, &private_key.inner),
      network,
      private_key,
    }
  }

  pub fn from_wif(wif: &str, address_type: AddressType, chain: Chain) -> Result<Self> {
    let private_key = PrivateKey::from_wif(wif).snafu_context(error::Key)?;
    Ok(Self::new(private_key, address_type, chain.network()))
  }

  pub fn address_type(&self) -> AddressType {
    self.address_type
  }

  pub fn address(&self) -> Result<Address> {
    match self.address_type {
      AddressType::P2tr => Ok(Address::p2tr(
        SECP256K1,
        self.keypair.x_only_public_key().0,
        None,
        self.network,
      )),
      AddressType::P2wpkh => Ok(Address::p2wpkh(
        &self.compressed_public_key()?,
        self.network,
      )),
    }
  }

  fn compressed_public_key(&self) -> Result<CompressedPublicKey> {
    CompressedPublicKey::from_private_key(SECP256K1, &self.private_key)
      .snafu_context(error::UncompressedKey)
  }

  /// Keypair whose x-only key owns tokens.
  fn token_keypair(&self) -> Keypair {
    match self.address_type {
      AddressType::P2tr => self.keypair.tap_tweak(SECP256K1, None).to_inner(),
      AddressType::P2wpkh => self.keypair,
    }
  }

  pub fn x_only_public_key(&self) -> XOnlyPublicKey {
    self.token_keypair().x_only_public_key().0
  }

  /// Parity byte completing the x-only key for segwit v0 owners, empty for
  /// taproot owners.
  pub fn pubkey_prefix(&self) -> Result<Vec<u8>> {
    match self.address_type {
      AddressType::P2tr => Ok(Vec::new()),
      AddressType::P2wpkh => Ok(vec![self.compressed_public_key()?.to_bytes()[0]]),
    }
  }

  pub fn owner(&self) -> Result<OwnerAddress> {
    match self.address_type {
      AddressType::P2tr => Ok(cat_protocol::hash160(&self.x_only_public_key().serialize())),
      AddressType::P2wpkh => Ok(cat_protocol::hash160(
        &self.compressed_public_key()?.to_bytes(),
      )),
    }
  }

  /// Sign a covenant signature hash as the token owner.
  pub fn sign_schnorr(&self, sighash: TapSighash) -> taproot::Signature {
    taproot::Signature {
      signature: SECP256K1.sign_schnorr_no_aux_rand(
        &Message::from_digest(sighash.to_byte_array()),
        &self.token_keypair(),
      ),
      sighash_type: TapSighashType::Default,
    }
  }

  /// Sign every unsigned input of `draft` spending an output locked to this
  /// signer's address. Inputs already carrying a witness are left alone.
  pub fn sign(&self, draft: &mut Draft) -> Result {
    let script_pubkey = self.address()?.script_pubkey();

    let inputs = draft
      .tx()
      .input
      .iter()
      .zip(draft.prevouts())
      .enumerate()
      .filter(|(_, (input, prevout))| {
        input.witness.is_empty() && prevout.script_pubkey == script_pubkey
      })
      .map(|(i, _)| i)
      .collect::<Vec<usize>>();

    let mut witnesses = Vec::new();

    {
      let mut cache = SighashCache::new(draft.tx());

      for &input in &inputs {
        let witness = match self.address_type {
          AddressType::P2tr => {
            let sighash = cache
              .taproot_key_spend_signature_hash(
                input,
                &Prevouts::All(draft.prevouts()),
                TapSighashType::Default,
              )
              .snafu_context(error::Sighash { input })?;

            Witness::from_slice(&[self.sign_schnorr(sighash).to_vec()])
          }
          AddressType::P2wpkh => {
            let sighash = cache
              .p2wpkh_signature_hash(
                input,
                &script_pubkey,
                draft.prevouts()[input].value,
                EcdsaSighashType::All,
              )
              .snafu_context(error::SegwitSighash { input })?;

            let signature = bitcoin::ecdsa::Signature {
              signature: SECP256K1.sign_ecdsa(
                &Message::from_digest(sighash.to_byte_array()),
                &self.private_key.inner,
              ),
              sighash_type: EcdsaSighashType::All,
            };

            Witness::from_slice(&[
              signature.to_vec(),
              self.compressed_public_key()?.to_bytes().to_vec(),
            ])
          }
        };

        witnesses.push((input, witness));
      }
    }

    log::debug!("signed {} inputs", witnesses.len());

    for (input, witness) in witnesses {
      draft.set_witness(input, witness);
    }

    Ok(())
  }
}
