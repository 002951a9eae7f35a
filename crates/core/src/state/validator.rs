//! Validator registry and the vote-count histogram.

use crate::crypto::ECPoint;
use crate::error::Result;
use crate::fixed8::Fixed8;
use crate::io::{BinaryReader, BinaryWriter, Serializable};

/// One enrolled (or merely voted-for) validator candidate.
///
/// Invariant: an entry with `registered == false` and zero votes is deleted
/// rather than stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorState {
    pub pubkey: ECPoint,
    pub registered: bool,
    pub votes: Fixed8,
}

impl ValidatorState {
    pub fn new(pubkey: ECPoint) -> Self {
        Self {
            pubkey,
            registered: false,
            votes: Fixed8::ZERO,
        }
    }

    /// True when the deletion rule applies.
    pub fn is_obsolete(&self) -> bool {
        !self.registered && self.votes.is_zero()
    }
}

impl Serializable for ValidatorState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        self.pubkey.serialize(writer);
        writer.write_bool(self.registered);
        self.votes.serialize(writer);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            pubkey: ECPoint::deserialize(reader)?,
            registered: reader.read_bool()?,
            votes: Fixed8::deserialize(reader)?,
        })
    }
}

/// Histogram used to derive the dynamic validator count: slot `i` holds the
/// governing-token stake of accounts voting for exactly `i + 1` validators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatorsCountState {
    votes: Vec<Fixed8>,
}

impl ValidatorsCountState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stake voting for exactly `count` validators.
    pub fn get(&self, count: usize) -> Fixed8 {
        debug_assert!(count >= 1);
        self.votes.get(count - 1).copied().unwrap_or(Fixed8::ZERO)
    }

    /// Adjusts the slot for vote lists of length `count`.
    pub fn adjust(&mut self, count: usize, delta: Fixed8) -> Result<()> {
        debug_assert!(count >= 1 && count <= basalt_config::MAX_VALIDATORS);
        if self.votes.len() < count {
            self.votes.resize(count, Fixed8::ZERO);
        }
        self.votes[count - 1] = self.votes[count - 1].checked_add(delta)?;
        Ok(())
    }
}

impl Serializable for ValidatorsCountState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        // Sparse encoding: (slot, stake) pairs for non-zero slots.
        let entries: Vec<(u16, Fixed8)> = self
            .votes
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
            .map(|(i, v)| (i as u16, *v))
            .collect();
        writer.write_var_int(entries.len() as u64);
        for (slot, stake) in entries {
            writer.write_u16(slot);
            stake.serialize(writer);
        }
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        let count = reader.read_var_int(basalt_config::MAX_VALIDATORS as u64)? as usize;
        let mut state = Self::new();
        for _ in 0..count {
            let slot = reader.read_u16()? as usize;
            let stake = Fixed8::deserialize(reader)?;
            state.adjust(slot + 1, stake)?;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn obsolete_rule() {
        let mut validator = ValidatorState::new(KeyPair::generate().public_key());
        assert!(validator.is_obsolete());
        validator.registered = true;
        assert!(!validator.is_obsolete());
        validator.registered = false;
        validator.votes = Fixed8::ONE;
        assert!(!validator.is_obsolete());
    }

    #[test]
    fn validator_round_trip() {
        let mut validator = ValidatorState::new(KeyPair::generate().public_key());
        validator.registered = true;
        validator.votes = Fixed8::from_whole(12).unwrap();
        assert_eq!(
            ValidatorState::from_bytes(&validator.to_bytes()).unwrap(),
            validator
        );
    }

    #[test]
    fn count_state_adjusts_sparsely() {
        let mut counts = ValidatorsCountState::new();
        counts.adjust(3, Fixed8::from_whole(10).unwrap()).unwrap();
        counts.adjust(1, Fixed8::ONE).unwrap();
        counts.adjust(3, -Fixed8::from_whole(4).unwrap()).unwrap();
        assert_eq!(counts.get(3), Fixed8::from_whole(6).unwrap());
        assert_eq!(counts.get(2), Fixed8::ZERO);

        let decoded = ValidatorsCountState::from_bytes(&counts.to_bytes()).unwrap();
        assert_eq!(decoded, counts);
    }
}
