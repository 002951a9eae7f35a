//! Hashing and secp256r1 signatures.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint160::UInt160;
use crate::uint256::UInt256;

/// Double SHA-256, the content hash for blocks and transactions.
pub fn hash256(data: &[u8]) -> UInt256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    UInt256::from(<[u8; 32]>::from(second))
}

/// RIPEMD-160 over SHA-256, the script hash function.
pub fn hash160(data: &[u8]) -> UInt160 {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    UInt160::from(<[u8; 20]>::from(ripe))
}

/// A compressed secp256r1 point (33 bytes, `0x02`/`0x03` prefix).
///
/// Decoding validates the encoding shape only; curve membership is checked
/// when the point is used to verify a signature. Ordering is lexicographic
/// over the compressed encoding, which is the canonical validator order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ECPoint([u8; 33]);

impl ECPoint {
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 33 || !matches!(bytes[0], 0x02 | 0x03) {
            return Err(CoreError::InvalidFormat(
                "expected 33-byte compressed point".into(),
            ));
        }
        let mut array = [0u8; 33];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    pub fn encoded(&self) -> &[u8; 33] {
        &self.0
    }

    /// Parses into a verifying key, checking curve membership.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|e| CoreError::Crypto(format!("point not on curve: {e}")))
    }

    /// Script hash of the canonical single-signature verification script.
    pub fn to_script_hash(&self) -> UInt160 {
        hash160(&crate::script::single_sig_script(self))
    }
}

impl Ord for ECPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ECPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ECPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ECPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ECPoint({self})")
    }
}

impl FromStr for ECPoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s).map_err(|e| CoreError::InvalidFormat(format!("ECPoint hex: {e}")))?;
        Self::from_encoded(&bytes)
    }
}

impl Serializable for ECPoint {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(&self.0);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let prefix = reader.read_u8()?;
        if !matches!(prefix, 0x02 | 0x03) {
            return Err(CoreError::InvalidFormat(format!(
                "bad point prefix 0x{prefix:02x}"
            )));
        }
        let mut array = [0u8; 33];
        array[0] = prefix;
        array[1..].copy_from_slice(&reader.read_exact::<32>()?);
        Ok(Self(array))
    }

    fn size(&self) -> usize {
        33
    }
}

/// Verifies a 64-byte raw signature over `message` (hashed with SHA-256).
pub fn verify_signature(message: &[u8], signature: &[u8], pubkey: &ECPoint) -> bool {
    let Ok(key) = pubkey.verifying_key() else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    let digest = Sha256::digest(message);
    key.verify_prehash(&digest, &sig).is_ok()
}

/// A secp256r1 keypair. Signing is only exercised by tests and tools; the
/// ledger itself never holds private keys.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|e| CoreError::Crypto(format!("invalid private key: {e}")))?;
        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> ECPoint {
        let encoded = self.signing_key.verifying_key().to_encoded_point(true);
        ECPoint::from_encoded(encoded.as_bytes()).expect("compressed encoding is 33 bytes")
    }

    /// Signs `message` (SHA-256 digested), returning the 64-byte raw form.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let digest = Sha256::digest(message);
        let signature: Signature = self
            .signing_key
            .sign_prehash(&digest)
            .expect("prehash has digest length");
        signature.to_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash160_known_length() {
        let hash = hash160(b"basalt");
        assert_eq!(hash.as_bytes().len(), 20);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let keys = KeyPair::generate();
        let message = b"block header bytes";
        let signature = keys.sign(message);
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(message, &signature, &keys.public_key()));
        assert!(!verify_signature(b"other message", &signature, &keys.public_key()));
    }

    #[test]
    fn rejects_bad_point_encoding() {
        assert!(ECPoint::from_encoded(&[0x04; 33]).is_err());
        assert!(ECPoint::from_encoded(&[0x02; 10]).is_err());
    }

    #[test]
    fn point_round_trips_through_hex() {
        let point = KeyPair::generate().public_key();
        assert_eq!(point.to_string().parse::<ECPoint>().unwrap(), point);
    }
}
