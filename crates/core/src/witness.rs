//! Witnesses: invocation + verification script pairs.

use crate::crypto::{self, hash160};
use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::script::{parse_signature_pushes, VerificationScript};
use crate::uint160::UInt160;

const MAX_SCRIPT_LEN: u64 = 0x10000;

/// Proof of authorization for a hashable payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    pub invocation_script: Vec<u8>,
    pub verification_script: Vec<u8>,
}

impl Witness {
    pub fn new(invocation_script: Vec<u8>, verification_script: Vec<u8>) -> Self {
        Self {
            invocation_script,
            verification_script,
        }
    }

    /// The trivial always-true witness used by the genesis block.
    pub fn trivial() -> Self {
        Self {
            invocation_script: Vec::new(),
            verification_script: crate::script::trivial_true_script(),
        }
    }

    /// Identity this witness answers for.
    pub fn script_hash(&self) -> UInt160 {
        hash160(&self.verification_script)
    }

    /// Checks the witness against the signed payload bytes.
    ///
    /// Only standard script shapes are recognized here; a custom
    /// verification script yields `Err` and the payload is rejected without
    /// side effects.
    pub fn verify(&self, message: &[u8]) -> Result<bool> {
        let script = VerificationScript::parse(&self.verification_script).ok_or_else(|| {
            CoreError::InvalidFormat("non-standard verification script".into())
        })?;
        match script {
            VerificationScript::TrivialTrue => Ok(true),
            VerificationScript::SingleSig(pubkey) => {
                let Some(signatures) = parse_signature_pushes(&self.invocation_script) else {
                    return Ok(false);
                };
                let [signature] = signatures.as_slice() else {
                    return Ok(false);
                };
                Ok(crypto::verify_signature(message, signature, &pubkey))
            }
            VerificationScript::MultiSig { m, pubkeys } => {
                let Some(signatures) = parse_signature_pushes(&self.invocation_script) else {
                    return Ok(false);
                };
                if signatures.len() < m {
                    return Ok(false);
                }
                // Signatures must follow key order; each key is consumed at
                // most once.
                let mut matched = 0usize;
                let mut key_iter = pubkeys.iter();
                'sigs: for signature in &signatures {
                    for key in key_iter.by_ref() {
                        if crypto::verify_signature(message, signature, key) {
                            matched += 1;
                            continue 'sigs;
                        }
                    }
                    return Ok(false);
                }
                Ok(matched >= m)
            }
        }
    }
}

impl Serializable for Witness {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.invocation_script);
        writer.write_var_bytes(&self.verification_script);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            invocation_script: reader.read_var_bytes(MAX_SCRIPT_LEN)?,
            verification_script: reader.read_var_bytes(MAX_SCRIPT_LEN)?,
        })
    }
}

/// Builds a single-signature witness over `message` with the given keypair.
pub fn sign_single(message: &[u8], keys: &crate::crypto::KeyPair) -> Witness {
    let mut invocation = Vec::with_capacity(65);
    invocation.push(crate::script::op::PUSHBYTES64);
    invocation.extend_from_slice(&keys.sign(message));
    Witness {
        invocation_script: invocation,
        verification_script: crate::script::single_sig_script(&keys.public_key()),
    }
}

/// Builds an m-of-n witness; `signers` must already satisfy the threshold.
pub fn sign_multi(
    message: &[u8],
    m: usize,
    pubkeys: &[crate::crypto::ECPoint],
    signers: &[&crate::crypto::KeyPair],
) -> Result<Witness> {
    let verification_script = crate::script::multi_sig_script(m, pubkeys)?;
    // Signature pushes must follow canonical key order.
    let VerificationScript::MultiSig { pubkeys: ordered, .. } =
        VerificationScript::parse(&verification_script)
            .ok_or_else(|| CoreError::InvalidFormat("multisig script".into()))?
    else {
        return Err(CoreError::InvalidFormat("multisig script".into()));
    };
    let mut invocation = Vec::new();
    for key in &ordered {
        if let Some(signer) = signers
            .iter()
            .find(|signer| signer.public_key() == *key)
        {
            invocation.push(crate::script::op::PUSHBYTES64);
            invocation.extend_from_slice(&signer.sign(message));
        }
    }
    Ok(Witness {
        invocation_script: invocation,
        verification_script,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn single_sig_witness_verifies() {
        let keys = KeyPair::generate();
        let witness = sign_single(b"payload", &keys);
        assert!(witness.verify(b"payload").unwrap());
        assert!(!witness.verify(b"tampered").unwrap());
    }

    #[test]
    fn multi_sig_witness_requires_threshold() {
        let keys: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();
        let pubkeys: Vec<_> = keys.iter().map(|k| k.public_key()).collect();

        let enough = sign_multi(b"m", 3, &pubkeys, &[&keys[0], &keys[2], &keys[3]]).unwrap();
        assert!(enough.verify(b"m").unwrap());

        let short = sign_multi(b"m", 3, &pubkeys, &[&keys[0], &keys[1]]).unwrap();
        assert!(!short.verify(b"m").unwrap());
    }

    #[test]
    fn non_standard_script_is_an_error() {
        let witness = Witness::new(vec![], vec![0xAB, 0xCD]);
        assert!(witness.verify(b"x").is_err());
    }

    #[test]
    fn serialization_round_trip() {
        let witness = Witness::new(vec![1, 2, 3], vec![4, 5]);
        assert_eq!(Witness::from_bytes(&witness.to_bytes()).unwrap(), witness);
    }

    #[test]
    fn trivial_witness_always_true() {
        assert!(Witness::trivial().verify(b"anything").unwrap());
    }
}
