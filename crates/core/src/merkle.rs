//! Merkle root over transaction hashes.

use sha2::{Digest, Sha256};

use crate::uint256::UInt256;

/// Computes the merkle root. An odd layer duplicates its last element;
/// the empty set hashes to zero.
pub fn merkle_root(hashes: &[UInt256]) -> UInt256 {
    match hashes {
        [] => UInt256::zero(),
        [single] => *single,
        _ => {
            let mut layer: Vec<UInt256> = hashes.to_vec();
            while layer.len() > 1 {
                if layer.len() % 2 == 1 {
                    layer.push(*layer.last().expect("layer non-empty"));
                }
                layer = layer
                    .chunks_exact(2)
                    .map(|pair| hash_pair(&pair[0], &pair[1]))
                    .collect();
            }
            layer[0]
        }
    }
}

fn hash_pair(left: &UInt256, right: &UInt256) -> UInt256 {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left.as_bytes());
    data[32..].copy_from_slice(right.as_bytes());
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    UInt256::from(<[u8; 32]>::from(second))
}
