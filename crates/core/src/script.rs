//! Verification script construction and recognition.
//!
//! The ledger never runs a VM for witness checks; it recognizes the two
//! standard script shapes (single-sig and m-of-n multi-sig) and verifies the
//! signatures directly. Anything else must go through the invocation path.

use crate::crypto::ECPoint;
use crate::error::{CoreError, Result};
use crate::uint160::UInt160;

/// Opcodes used by the standard verification scripts.
pub mod op {
    pub const PUSHBYTES64: u8 = 0x40;
    pub const PUSHBYTES33: u8 = 0x21;
    /// PUSH1; doubles as PUSHT, the trivial true script.
    pub const PUSH1: u8 = 0x51;
    pub const PUSH16: u8 = 0x60;
    pub const CHECKSIG: u8 = 0xAC;
    pub const CHECKMULTISIG: u8 = 0xAE;
}

/// The `PUSHT` script every genesis witness carries.
pub fn trivial_true_script() -> Vec<u8> {
    vec![op::PUSH1]
}

fn emit_push_integer(script: &mut Vec<u8>, value: usize) {
    debug_assert!(value >= 1);
    if value <= 16 {
        script.push(op::PUSH1 + (value as u8 - 1));
    } else {
        // Little-endian minimal positive integer push.
        let mut bytes = Vec::new();
        let mut v = value;
        while v > 0 {
            bytes.push((v & 0xFF) as u8);
            v >>= 8;
        }
        if bytes.last().is_some_and(|b| b & 0x80 != 0) {
            bytes.push(0);
        }
        script.push(bytes.len() as u8);
        script.extend_from_slice(&bytes);
    }
}

fn read_push_integer(script: &[u8], pos: &mut usize) -> Option<usize> {
    let opcode = *script.get(*pos)?;
    *pos += 1;
    if (op::PUSH1..=op::PUSH16).contains(&opcode) {
        return Some((opcode - op::PUSH1) as usize + 1);
    }
    if opcode >= 1 && opcode <= 8 {
        let len = opcode as usize;
        let bytes = script.get(*pos..*pos + len)?;
        *pos += len;
        let mut value = 0usize;
        for (i, b) in bytes.iter().enumerate() {
            value |= (*b as usize) << (8 * i);
        }
        return Some(value);
    }
    None
}

/// `PUSHBYTES33 <key> CHECKSIG`.
pub fn single_sig_script(pubkey: &ECPoint) -> Vec<u8> {
    let mut script = Vec::with_capacity(35);
    script.push(op::PUSHBYTES33);
    script.extend_from_slice(pubkey.encoded());
    script.push(op::CHECKSIG);
    script
}

/// `m <key>... n CHECKMULTISIG` with keys in canonical order.
pub fn multi_sig_script(m: usize, pubkeys: &[ECPoint]) -> Result<Vec<u8>> {
    let n = pubkeys.len();
    if m < 1 || m > n || n > basalt_config::MAX_VALIDATORS {
        return Err(CoreError::InvalidFormat(format!(
            "invalid multisig shape {m}-of-{n}"
        )));
    }
    let mut sorted: Vec<ECPoint> = pubkeys.to_vec();
    sorted.sort();
    let mut script = Vec::with_capacity(3 + 34 * n);
    emit_push_integer(&mut script, m);
    for key in &sorted {
        script.push(op::PUSHBYTES33);
        script.extend_from_slice(key.encoded());
    }
    emit_push_integer(&mut script, n);
    script.push(op::CHECKMULTISIG);
    Ok(script)
}

/// Script hash collecting block signatures: `n - (n-1)/3` of `n`
/// (Byzantine quorum) over the validator set.
pub fn consensus_address(validators: &[ECPoint]) -> Result<UInt160> {
    let n = validators.len();
    let m = n - (n - 1) / 3;
    Ok(crate::crypto::hash160(&multi_sig_script(m, validators)?))
}

/// Script hash owning the genesis token issue: simple majority
/// `⌈(n+1)/2⌉` of `n` over the standby validators.
pub fn committee_address(validators: &[ECPoint]) -> Result<UInt160> {
    let n = validators.len();
    let m = n / 2 + 1;
    Ok(crate::crypto::hash160(&multi_sig_script(m, validators)?))
}

/// The shape of a recognized verification script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationScript {
    SingleSig(ECPoint),
    MultiSig { m: usize, pubkeys: Vec<ECPoint> },
    /// The trivial `PUSHT` script (genesis witness).
    TrivialTrue,
}

impl VerificationScript {
    /// Recognizes the standard script shapes; `None` for anything custom.
    pub fn parse(script: &[u8]) -> Option<Self> {
        if script == [op::PUSH1] {
            return Some(Self::TrivialTrue);
        }
        if script.len() == 35
            && script[0] == op::PUSHBYTES33
            && script[34] == op::CHECKSIG
        {
            let key = ECPoint::from_encoded(&script[1..34]).ok()?;
            return Some(Self::SingleSig(key));
        }
        let mut pos = 0usize;
        let m = read_push_integer(script, &mut pos)?;
        let mut pubkeys = Vec::new();
        while script.get(pos) == Some(&op::PUSHBYTES33) {
            pos += 1;
            let key = ECPoint::from_encoded(script.get(pos..pos + 33)?).ok()?;
            pubkeys.push(key);
            pos += 33;
        }
        let n = read_push_integer(script, &mut pos)?;
        if script.get(pos) != Some(&op::CHECKMULTISIG) || pos + 1 != script.len() {
            return None;
        }
        if n != pubkeys.len() || m < 1 || m > n {
            return None;
        }
        Some(Self::MultiSig { m, pubkeys })
    }
}

/// Splits an invocation script into its pushed signatures.
pub fn parse_signature_pushes(invocation: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut signatures = Vec::new();
    let mut pos = 0usize;
    while pos < invocation.len() {
        if invocation[pos] != op::PUSHBYTES64 {
            return None;
        }
        let sig = invocation.get(pos + 1..pos + 65)?;
        signatures.push(sig.to_vec());
        pos += 65;
    }
    Some(signatures)
}
