//! The transaction sum type and its wire layout.
//!
//! Every variant shares inputs, outputs, attributes and witnesses; the
//! exclusive data in [`TransactionData`] decides how the persist engine
//! dispatches it. Hashes cover the unsigned portion (everything except
//! witnesses).

use std::collections::HashSet;

use basalt_config::SystemFees;

use crate::crypto::{hash256, ECPoint};
use crate::error::{CoreError, Result};
use crate::fixed8::Fixed8;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint160::UInt160;
use crate::uint256::UInt256;
use crate::witness::Witness;

const MAX_ATTRIBUTES: u64 = 16;
const MAX_INPUTS: u64 = 0xFFFF;
const MAX_OUTPUTS: u64 = 0xFFFF;
const MAX_WITNESSES: u64 = 0xFFFF;
const MAX_SCRIPT_LEN: u64 = 0x10000;
const MAX_NAME_LEN: u64 = 1024;
const MAX_DESCRIPTORS: u64 = 16;

/// Discriminant byte for each transaction kind. Values are part of the wire
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionType {
    Miner = 0x00,
    Issue = 0x01,
    Claim = 0x02,
    Enrollment = 0x20,
    Register = 0x40,
    Contract = 0x80,
    State = 0x90,
    Publish = 0xd0,
    Invocation = 0xd1,
}

impl TransactionType {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => Self::Miner,
            0x01 => Self::Issue,
            0x02 => Self::Claim,
            0x20 => Self::Enrollment,
            0x40 => Self::Register,
            0x80 => Self::Contract,
            0x90 => Self::State,
            0xd0 => Self::Publish,
            0xd1 => Self::Invocation,
            other => {
                return Err(CoreError::InvalidFormat(format!(
                    "unknown transaction type 0x{other:02x}"
                )))
            }
        })
    }
}

/// Registered asset categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetType {
    GoverningToken = 0x00,
    UtilityToken = 0x01,
    Share = 0x90,
    Token = 0x60,
}

impl AssetType {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => Self::GoverningToken,
            0x01 => Self::UtilityToken,
            0x90 => Self::Share,
            0x60 => Self::Token,
            other => {
                return Err(CoreError::InvalidFormat(format!(
                    "unknown asset type 0x{other:02x}"
                )))
            }
        })
    }
}

bitflags::bitflags! {
    /// Capability bits of a published contract.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContractProperties: u8 {
        const HAS_STORAGE = 1 << 0;
        const HAS_DYNAMIC_INVOKE = 1 << 1;
        const PAYABLE = 1 << 2;
    }
}

/// Reference to an output of a prior transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinReference {
    pub prev_hash: UInt256,
    pub prev_index: u16,
}

impl Serializable for CoinReference {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.prev_hash.serialize(writer);
        writer.write_u16(self.prev_index);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            prev_hash: UInt256::deserialize(reader)?,
            prev_index: reader.read_u16()?,
        })
    }
}

/// A coin: some amount of one asset owned by one script hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOutput {
    pub asset_id: UInt256,
    pub value: Fixed8,
    pub script_hash: UInt160,
}

impl Serializable for TransactionOutput {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.asset_id.serialize(writer);
        self.value.serialize(writer);
        self.script_hash.serialize(writer);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            asset_id: UInt256::deserialize(reader)?,
            value: Fixed8::deserialize(reader)?,
            script_hash: UInt160::deserialize(reader)?,
        })
    }
}

/// Free-form attribute attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAttribute {
    pub usage: u8,
    pub data: Vec<u8>,
}

impl Serializable for TransactionAttribute {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.usage);
        writer.write_var_bytes(&self.data);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            usage: reader.read_u8()?,
            data: reader.read_var_bytes(0xFFFF)?,
        })
    }
}

/// Target of a state descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StateKind {
    Account = 0x40,
    Validator = 0x48,
}

/// A single governance mutation carried by a `State` transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDescriptor {
    pub kind: StateKind,
    pub key: Vec<u8>,
    pub field: String,
    pub value: Vec<u8>,
}

impl StateDescriptor {
    /// For `Account`/`Votes` descriptors: the account being redirected.
    pub fn account_key(&self) -> Result<UInt160> {
        UInt160::from_bytes(&self.key)
    }

    /// For `Validator`/`Registered` descriptors: the validator key.
    pub fn validator_key(&self) -> Result<ECPoint> {
        ECPoint::from_encoded(&self.key)
    }

    /// Decodes the vote list of an `Account`/`Votes` descriptor, dropping
    /// duplicates while keeping first-seen order.
    pub fn parse_votes(&self) -> Result<Vec<ECPoint>> {
        let mut reader = BinaryReader::new(&self.value);
        let votes: Vec<ECPoint> = reader.read_vec(basalt_config::MAX_VALIDATORS as u64)?;
        reader.expect_end()?;
        let mut seen = HashSet::new();
        Ok(votes
            .into_iter()
            .filter(|v| seen.insert(*v))
            .collect())
    }

    /// Decodes the flag of a `Validator`/`Registered` descriptor.
    pub fn registered_flag(&self) -> Result<bool> {
        match self.value.as_slice() {
            [flag] => Ok(*flag != 0),
            _ => Err(CoreError::InvalidFormat("registered flag must be one byte".into())),
        }
    }

    /// Structural validity: key length and field name match the kind.
    pub fn check(&self) -> Result<()> {
        match self.kind {
            StateKind::Account => {
                if self.key.len() != 20 || self.field != "Votes" {
                    return Err(CoreError::InvalidFormat("bad account descriptor".into()));
                }
                self.parse_votes().map(|_| ())
            }
            StateKind::Validator => {
                if self.key.len() != 33 || self.field != "Registered" {
                    return Err(CoreError::InvalidFormat("bad validator descriptor".into()));
                }
                self.registered_flag().map(|_| ())
            }
        }
    }
}

impl Serializable for StateDescriptor {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.kind as u8);
        writer.write_var_bytes(&self.key);
        writer.write_var_string(&self.field);
        writer.write_var_bytes(&self.value);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let kind = match reader.read_u8()? {
            0x40 => StateKind::Account,
            0x48 => StateKind::Validator,
            other => {
                return Err(CoreError::InvalidFormat(format!(
                    "unknown state kind 0x{other:02x}"
                )))
            }
        };
        Ok(Self {
            kind,
            key: reader.read_var_bytes(100)?,
            field: reader.read_var_string(32)?,
            value: reader.read_var_bytes(u16::MAX as u64)?,
        })
    }
}

/// Per-kind exclusive data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionData {
    Miner {
        nonce: u32,
    },
    Issue,
    Claim {
        claims: Vec<CoinReference>,
    },
    Enrollment {
        pubkey: ECPoint,
    },
    Register {
        asset_type: AssetType,
        name: String,
        amount: Fixed8,
        precision: u8,
        owner: ECPoint,
        admin: UInt160,
    },
    Contract,
    State {
        descriptors: Vec<StateDescriptor>,
    },
    Publish {
        script: Vec<u8>,
        parameter_list: Vec<u8>,
        return_type: u8,
        properties: ContractProperties,
        name: String,
        code_version: String,
        author: String,
        email: String,
        description: String,
    },
    Invocation {
        script: Vec<u8>,
        gas: Fixed8,
    },
}

impl TransactionData {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Miner { .. } => TransactionType::Miner,
            Self::Issue => TransactionType::Issue,
            Self::Claim { .. } => TransactionType::Claim,
            Self::Enrollment { .. } => TransactionType::Enrollment,
            Self::Register { .. } => TransactionType::Register,
            Self::Contract => TransactionType::Contract,
            Self::State { .. } => TransactionType::State,
            Self::Publish { .. } => TransactionType::Publish,
            Self::Invocation { .. } => TransactionType::Invocation,
        }
    }

    fn serialize_exclusive(&self, writer: &mut BinaryWriter) {
        match self {
            Self::Miner { nonce } => writer.write_u32(*nonce),
            Self::Issue | Self::Contract => {}
            Self::Claim { claims } => writer.write_vec(claims),
            Self::Enrollment { pubkey } => pubkey.serialize(writer),
            Self::Register {
                asset_type,
                name,
                amount,
                precision,
                owner,
                admin,
            } => {
                writer.write_u8(*asset_type as u8);
                writer.write_var_string(name);
                amount.serialize(writer);
                writer.write_u8(*precision);
                owner.serialize(writer);
                admin.serialize(writer);
            }
            Self::State { descriptors } => writer.write_vec(descriptors),
            Self::Publish {
                script,
                parameter_list,
                return_type,
                properties,
                name,
                code_version,
                author,
                email,
                description,
            } => {
                writer.write_var_bytes(script);
                writer.write_var_bytes(parameter_list);
                writer.write_u8(*return_type);
                writer.write_u8(properties.bits());
                writer.write_var_string(name);
                writer.write_var_string(code_version);
                writer.write_var_string(author);
                writer.write_var_string(email);
                writer.write_var_string(description);
            }
            Self::Invocation { script, gas } => {
                writer.write_var_bytes(script);
                gas.serialize(writer);
            }
        }
    }

    fn deserialize_exclusive(
        transaction_type: TransactionType,
        reader: &mut BinaryReader<'_>,
    ) -> Result<Self> {
        Ok(match transaction_type {
            TransactionType::Miner => Self::Miner {
                nonce: reader.read_u32()?,
            },
            TransactionType::Issue => Self::Issue,
            TransactionType::Claim => Self::Claim {
                claims: reader.read_vec(MAX_INPUTS)?,
            },
            TransactionType::Enrollment => Self::Enrollment {
                pubkey: ECPoint::deserialize(reader)?,
            },
            TransactionType::Register => Self::Register {
                asset_type: AssetType::from_u8(reader.read_u8()?)?,
                name: reader.read_var_string(MAX_NAME_LEN)?,
                amount: Fixed8::deserialize(reader)?,
                precision: reader.read_u8()?,
                owner: ECPoint::deserialize(reader)?,
                admin: UInt160::deserialize(reader)?,
            },
            TransactionType::Contract => Self::Contract,
            TransactionType::State => Self::State {
                descriptors: reader.read_vec(MAX_DESCRIPTORS)?,
            },
            TransactionType::Publish => Self::Publish {
                script: reader.read_var_bytes(MAX_SCRIPT_LEN)?,
                parameter_list: reader.read_var_bytes(0xFF)?,
                return_type: reader.read_u8()?,
                properties: ContractProperties::from_bits_truncate(reader.read_u8()?),
                name: reader.read_var_string(MAX_NAME_LEN)?,
                code_version: reader.read_var_string(MAX_NAME_LEN)?,
                author: reader.read_var_string(MAX_NAME_LEN)?,
                email: reader.read_var_string(MAX_NAME_LEN)?,
                description: reader.read_var_string(0xFFFF)?,
            },
            TransactionType::Invocation => Self::Invocation {
                script: reader.read_var_bytes(MAX_SCRIPT_LEN)?,
                gas: Fixed8::deserialize(reader)?,
            },
        })
    }
}

/// A transaction in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u8,
    pub data: TransactionData,
    pub attributes: Vec<TransactionAttribute>,
    pub inputs: Vec<CoinReference>,
    pub outputs: Vec<TransactionOutput>,
    pub witnesses: Vec<Witness>,
}

impl Transaction {
    pub fn new(data: TransactionData) -> Self {
        Self {
            version: 0,
            data,
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            witnesses: Vec::new(),
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.data.transaction_type()
    }

    pub fn is_miner(&self) -> bool {
        self.transaction_type() == TransactionType::Miner
    }

    /// Unsigned portion: everything except witnesses.
    pub fn serialize_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.transaction_type() as u8);
        writer.write_u8(self.version);
        self.data.serialize_exclusive(writer);
        writer.write_vec(&self.attributes);
        writer.write_vec(&self.inputs);
        writer.write_vec(&self.outputs);
    }

    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.serialize_unsigned(&mut writer);
        writer.into_bytes()
    }

    pub fn hash(&self) -> UInt256 {
        hash256(&self.unsigned_bytes())
    }

    /// System fee charged for this transaction kind.
    pub fn system_fee(&self, fees: &SystemFees) -> Fixed8 {
        let whole = match &self.data {
            TransactionData::Register { .. } => fees.register,
            TransactionData::Enrollment { .. } => fees.enrollment,
            TransactionData::Issue => fees.issue,
            TransactionData::Publish { .. } => fees.publish,
            TransactionData::Invocation { gas, .. } => return *gas,
            _ => 0,
        };
        Fixed8::from_whole(whole).unwrap_or(Fixed8::MAX)
    }

    /// Structural checks that need no chain state.
    pub fn check_structure(&self) -> Result<()> {
        if self.attributes.len() as u64 > MAX_ATTRIBUTES {
            return Err(CoreError::InvalidFormat("too many attributes".into()));
        }
        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(*input) {
                return Err(CoreError::InvalidFormat("duplicate input".into()));
            }
        }
        for output in &self.outputs {
            if output.value <= Fixed8::ZERO {
                return Err(CoreError::InvalidFormat("non-positive output".into()));
            }
        }
        match &self.data {
            TransactionData::Claim { claims } => {
                if claims.is_empty() {
                    return Err(CoreError::InvalidFormat("claim without references".into()));
                }
                let mut seen = HashSet::new();
                for claim in claims {
                    if !seen.insert(*claim) {
                        return Err(CoreError::InvalidFormat("duplicate claim".into()));
                    }
                }
            }
            TransactionData::State { descriptors } => {
                for descriptor in descriptors {
                    descriptor.check()?;
                }
            }
            TransactionData::Invocation { script, gas } => {
                if script.is_empty() {
                    return Err(CoreError::InvalidFormat("empty invocation script".into()));
                }
                if gas.is_negative() || !gas.fits_precision(0) {
                    return Err(CoreError::InvalidFormat("invalid invocation gas".into()));
                }
            }
            TransactionData::Register { amount, precision, .. } => {
                if *precision > 8 {
                    return Err(CoreError::InvalidFormat("precision beyond 8".into()));
                }
                // -1 raw marks unbounded issuance; any other negative is invalid.
                if amount.is_negative() && *amount != Fixed8::from_raw(-1) {
                    return Err(CoreError::InvalidFormat("invalid asset amount".into()));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Serializable for Transaction {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.serialize_unsigned(writer);
        writer.write_vec(&self.witnesses);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let transaction_type = TransactionType::from_u8(reader.read_u8()?)?;
        let version = reader.read_u8()?;
        let data = TransactionData::deserialize_exclusive(transaction_type, reader)?;
        Ok(Self {
            version,
            data,
            attributes: reader.read_vec(MAX_ATTRIBUTES)?,
            inputs: reader.read_vec(MAX_INPUTS)?,
            outputs: reader.read_vec(MAX_OUTPUTS)?,
            witnesses: reader.read_vec(MAX_WITNESSES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn sample_output() -> TransactionOutput {
        TransactionOutput {
            asset_id: UInt256::from([1u8; 32]),
            value: Fixed8::from_whole(10).unwrap(),
            script_hash: UInt160::from([2u8; 20]),
        }
    }

    #[test]
    fn miner_round_trip() {
        let mut tx = Transaction::new(TransactionData::Miner { nonce: 42 });
        tx.outputs.push(sample_output());
        let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn register_round_trip() {
        let owner = KeyPair::generate().public_key();
        let tx = Transaction::new(TransactionData::Register {
            asset_type: AssetType::Token,
            name: "[{\"name\":\"Widget\"}]".into(),
            amount: Fixed8::from_whole(1000).unwrap(),
            precision: 8,
            owner,
            admin: UInt160::from([3u8; 20]),
        });
        assert_eq!(Transaction::from_bytes(&tx.to_bytes()).unwrap(), tx);
    }

    #[test]
    fn hash_ignores_witnesses() {
        let mut tx = Transaction::new(TransactionData::Contract);
        tx.outputs.push(sample_output());
        let before = tx.hash();
        tx.witnesses.push(Witness::new(vec![1], vec![2]));
        assert_eq!(tx.hash(), before);
    }

    #[test]
    fn duplicate_inputs_rejected() {
        let mut tx = Transaction::new(TransactionData::Contract);
        let input = CoinReference {
            prev_hash: UInt256::from([9u8; 32]),
            prev_index: 0,
        };
        tx.inputs.push(input);
        tx.inputs.push(input);
        assert!(tx.check_structure().is_err());
    }

    #[test]
    fn state_descriptor_checks() {
        let account = StateDescriptor {
            kind: StateKind::Account,
            key: vec![0u8; 20],
            field: "Votes".into(),
            value: vec![0x00], // empty vote vector
        };
        assert!(account.check().is_ok());
        assert!(account.parse_votes().unwrap().is_empty());

        let bad = StateDescriptor {
            kind: StateKind::Validator,
            key: vec![0u8; 20],
            field: "Registered".into(),
            value: vec![1],
        };
        assert!(bad.check().is_err());
    }

    #[test]
    fn invocation_gas_must_be_whole() {
        let tx = Transaction::new(TransactionData::Invocation {
            script: vec![0x51],
            gas: Fixed8::from_raw(1),
        });
        assert!(tx.check_structure().is_err());
    }

    #[test]
    fn unknown_type_byte_fails() {
        assert!(Transaction::from_bytes(&[0x55, 0x00]).is_err());
    }
}
